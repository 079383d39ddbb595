//! rate-feed: real-time crypto exchange rate ingestion and broadcast
//!
//! This library provides the core components for:
//! - Currency pairs with exchange direction classification
//! - Exchange adapters for the Coinbase ticker and Kraken trade feeds
//! - WebSocket transport with ping/pong keepalive
//! - Per-exchange connection supervisors with flat reconnect backoff
//! - A broadcast hub fanning normalized rates out to subscriber sinks
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod currency;
pub mod feed;
pub mod hub;
pub mod message;
pub mod pipeline;
pub mod supervisor;
pub mod telemetry;
pub mod ws;
