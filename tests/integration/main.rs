//! Integration test harness

mod e2e_test;
mod feed_test;
mod hub_test;
mod properties_test;
