//! Prometheus metrics

use crate::message::Exchange;

/// Per-exchange counters
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Text frames read off the socket
    FramesReceived,
    /// Frames that failed to parse or validate
    FramesDropped,
    /// Frames that validated but failed normalization
    NormalizeErrors,
    /// Messages handed to the hub
    MessagesPublished,
    /// Connection attempts after the first
    Reconnects,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Registered sinks across all subscriber ids
    Subscribers,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::FramesReceived => "ratefeed_frames_received_total",
            CounterMetric::FramesDropped => "ratefeed_frames_dropped_total",
            CounterMetric::NormalizeErrors => "ratefeed_normalize_errors_total",
            CounterMetric::MessagesPublished => "ratefeed_messages_published_total",
            CounterMetric::Reconnects => "ratefeed_reconnects_total",
        }
    }
}

/// Bump a per-exchange counter
pub fn increment_counter(metric: CounterMetric, exchange: Exchange) {
    metrics::counter!(metric.name(), "exchange" => exchange.as_str()).increment(1);
}

/// Count messages discarded for a slow subscriber
pub fn record_sink_overflow(dropped: u64) {
    metrics::counter!("ratefeed_sink_overflow_total").increment(dropped);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::Subscribers => "ratefeed_subscribers",
    };

    metrics::gauge!(metric_name).set(value);
}
