use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stronger_bus::{HandlerError, RequestTraced, TypedHandler};

use super::with_deadline;
use crate::adapters::{NotificationStore, TraceRecord};

/// Persists one trace row per finished request.
pub struct RequestTracedHandler {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl RequestTracedHandler {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl TypedHandler for RequestTracedHandler {
    type Payload = RequestTraced;

    async fn handle_payload(&self, payload: RequestTraced) -> Result<(), HandlerError> {
        let trace = TraceRecord {
            request: payload.request,
            duration_ms: payload.duration_ms,
            status_code: payload.status_code,
        };

        with_deadline(self.timeout, async {
            self.store
                .store_trace(trace)
                .await
                .map_err(HandlerError::from)
        })
        .await
    }
}
