//! Prometheus metrics for the event bus.
//!
//! All metrics follow the naming convention: `stronger_bus_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., events_published_total)
//! - **Histogram**: Distribution of values (e.g., handler_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every bus metric.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PUBLISH SIDE
    // =========================================================================

    /// Payloads accepted into a topic channel.
    pub static ref BUS_EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("stronger_bus_events_published_total", "Payloads enqueued on a topic channel"),
        &["topic"]
    ).expect("metric creation failed");

    /// Payloads that never reached a channel.
    pub static ref BUS_EVENTS_DROPPED: CounterVec = CounterVec::new(
        Opts::new("stronger_bus_events_dropped_total", "Payloads dropped before enqueue"),
        &["topic", "reason"]  // reason: no_subscriber/stopped/timeout/closed
    ).expect("metric creation failed");

    // =========================================================================
    // WORKER SIDE
    // =========================================================================

    /// Successful handler invocations.
    pub static ref BUS_HANDLED: CounterVec = CounterVec::new(
        Opts::new("stronger_bus_handled_total", "Payloads handled without error"),
        &["topic"]
    ).expect("metric creation failed");

    /// Failed handler invocations.
    pub static ref BUS_HANDLER_FAILURES: CounterVec = CounterVec::new(
        Opts::new("stronger_bus_handler_failures_total", "Handler invocations that failed"),
        &["topic", "kind"]  // kind: error/decode/panic
    ).expect("metric creation failed");

    /// Handler invocation duration.
    pub static ref BUS_HANDLER_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "stronger_bus_handler_duration_seconds",
            "Time spent inside a handler invocation"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("bucket creation failed")),
        &["topic"]
    ).expect("metric creation failed");
}

/// Reason a payload was dropped on the publish side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Nobody subscribed to the topic.
    NoSubscriber,
    /// The bus was stopped before the publish.
    Stopped,
    /// The publish timeout elapsed while the channel was full.
    Timeout,
    /// Every worker was gone when the send was attempted.
    Closed,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::NoSubscriber => "no_subscriber",
            DropReason::Stopped => "stopped",
            DropReason::Timeout => "timeout",
            DropReason::Closed => "closed",
        }
    }
}

/// Kind of handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Error,
    Decode,
    Panic,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Error => "error",
            FailureKind::Decode => "decode",
            FailureKind::Panic => "panic",
        }
    }
}

/// Register all bus metrics with [`REGISTRY`].
///
/// Calling it more than once is fine: already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
        Box::new(BUS_EVENTS_DROPPED.clone()),
        Box::new(BUS_HANDLED.clone()),
        Box::new(BUS_HANDLER_FAILURES.clone()),
        Box::new(BUS_HANDLER_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

pub fn record_published(topic: &str) {
    BUS_EVENTS_PUBLISHED.with_label_values(&[topic]).inc();
}

pub fn record_dropped(topic: &str, reason: DropReason) {
    BUS_EVENTS_DROPPED
        .with_label_values(&[topic, reason.as_str()])
        .inc();
}

pub fn record_handled(topic: &str) {
    BUS_HANDLED.with_label_values(&[topic]).inc();
}

pub fn record_failure(topic: &str, kind: FailureKind) {
    BUS_HANDLER_FAILURES
        .with_label_values(&[topic, kind.as_str()])
        .inc();
}

/// Timer guard for handler duration. Observation happens on drop.
pub struct HandlerTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl HandlerTimer {
    /// Start timing a handler invocation on `topic`.
    pub fn start(topic: &str) -> Self {
        Self {
            histogram: BUS_HANDLER_DURATION.with_label_values(&[topic]),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HandlerTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
