//! # Topic Workers
//!
//! Each topic gets a fixed pool of workers sharing the receiving half of its
//! channel. A worker dequeues one payload, looks up the topic's current
//! handler, and runs it. Failures stay inside the worker:
//!
//! - `Err` from the handler is logged and counted
//! - a panic is caught with `catch_unwind`, logged and counted
//!
//! In both cases the payload is dropped and the worker continues. The loop
//! ends once the channel is closed and drained.
//!
//! **Warning**: `AssertUnwindSafe` is used, so a handler that panics while
//! holding a lock on shared state may leave that state inconsistent.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error};

use stronger_telemetry::metrics::{record_failure, record_handled};
use stronger_telemetry::{FailureKind, HandlerTimer};

use crate::events::Topic;
use crate::registry::{LiveCount, TopicRegistry};
use crate::subscriber::{Handler, HandlerError};

pub(crate) type SharedReceiver<E> = Arc<Mutex<mpsc::Receiver<E>>>;

/// Decrements the topic's live-worker count when the worker goes away,
/// including when its task is aborted.
struct LiveGuard(LiveCount);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|live| *live = live.saturating_sub(1));
    }
}

pub(crate) struct Worker<E: Send + 'static> {
    topic: Topic,
    index: usize,
    receiver: SharedReceiver<E>,
    registry: Arc<RwLock<TopicRegistry<E>>>,
    live: LiveCount,
}

impl<E: Send + 'static> Worker<E> {
    /// The caller has already counted this worker in `live`.
    pub(crate) fn new(
        topic: Topic,
        index: usize,
        receiver: SharedReceiver<E>,
        registry: Arc<RwLock<TopicRegistry<E>>>,
        live: LiveCount,
    ) -> Self {
        Self {
            topic,
            index,
            receiver,
            registry,
            live,
        }
    }

    pub(crate) async fn run(self) {
        let _live = LiveGuard(Arc::clone(&self.live));
        debug!(topic = %self.topic, worker = self.index, "Worker started");

        loop {
            let next = self.receiver.lock().await.recv().await;
            let Some(payload) = next else {
                break;
            };

            let handler = self.registry.read().handler(self.topic.as_str());
            match handler {
                Some(handler) => self.dispatch(handler, payload).await,
                None => {
                    error!(topic = %self.topic, worker = self.index, "Handler not found, payload dropped");
                }
            }
        }

        debug!(topic = %self.topic, worker = self.index, "Channel closed and drained, worker exiting");
    }

    async fn dispatch(&self, handler: Arc<dyn Handler<E>>, payload: E) {
        let topic = self.topic.as_str();
        let _timer = HandlerTimer::start(topic);

        let outcome = AssertUnwindSafe(handler.handle(payload))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => record_handled(topic),
            Ok(Err(HandlerError::Decode(e))) => {
                record_failure(topic, FailureKind::Decode);
                error!(topic, worker = self.index, error = %e, "Payload decode failed, payload dropped");
            }
            Ok(Err(e)) => {
                record_failure(topic, FailureKind::Error);
                error!(topic, worker = self.index, error = %e, "Handler failed, payload dropped");
            }
            Err(panic) => {
                record_failure(topic, FailureKind::Panic);
                error!(
                    topic,
                    worker = self.index,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked, payload dropped"
                );
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
