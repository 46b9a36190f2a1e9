//! # Request Tracer
//!
//! Times a request and, when it ends, logs it and publishes a
//! `RequestTraced` event so the trace row is written off the request path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stronger_bus::{Bus, NotifyEvent, RequestTraced};
use tracing::info;

pub struct RequestTracer {
    bus: Arc<Bus<NotifyEvent>>,
}

impl RequestTracer {
    pub fn new(bus: Arc<Bus<NotifyEvent>>) -> Self {
        Self { bus }
    }

    /// Start timing a request to `uri`.
    pub fn trace(&self, uri: impl Into<String>) -> Trace {
        Trace {
            bus: Arc::clone(&self.bus),
            uri: uri.into(),
            start: Instant::now(),
        }
    }
}

/// An in-flight request measurement.
pub struct Trace {
    bus: Arc<Bus<NotifyEvent>>,
    uri: String,
    start: Instant,
}

impl Trace {
    /// Finish the measurement with the response status.
    pub async fn end(self, status_code: u16) {
        let duration = self.start.elapsed();
        self.finish(duration, status_code).await;
    }

    async fn finish(self, duration: Duration, status_code: u16) {
        info!(
            uri = %self.uri,
            duration_ms = duration.as_millis() as u64,
            status_code,
            "trace"
        );

        self.bus
            .emit(RequestTraced {
                request: self.uri,
                duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                status_code,
            })
            .await;
    }
}
