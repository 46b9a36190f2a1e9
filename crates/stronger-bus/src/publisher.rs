//! # Event Publisher
//!
//! The [`Bus`] is the entry point the rest of the process uses: `publish`
//! from request code, `subscribe` at startup, `stop` from the shutdown hook.
//!
//! Delivery is best-effort and at-most-once. `publish` never reports on what
//! happens to a payload after it is enqueued, and a payload published to a
//! topic nobody subscribed to is logged and dropped. Do not route work whose
//! loss would corrupt state through the bus; a dropped event shows up as a
//! missing notification or trace row, nothing more.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{error, info, warn};

use stronger_telemetry::metrics::{record_dropped, record_published};
use stronger_telemetry::DropReason;

use crate::config::{BusConfig, PublishPolicy, TopicConfig};
use crate::events::{NotifyEvent, Topic};
use crate::registry::{Route, TopicEntry, TopicRegistry, TopicState};
use crate::subscriber::{Handler, SubscriptionError};
use crate::worker::Worker;

/// In-process topic dispatcher.
///
/// Construct one per process and share it (`Arc<Bus<E>>`) with every
/// publisher and with the shutdown hook. Dropping the bus stops it.
pub struct Bus<E: Send + 'static> {
    registry: Arc<RwLock<TopicRegistry<E>>>,
    config: BusConfig,
}

impl<E: Send + 'static> Bus<E> {
    /// Create a bus with default topic settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(TopicRegistry::new())),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Enqueue `payload` on `topic`.
    ///
    /// Suspends the caller while the topic's channel is full, bounded by the
    /// topic's [`PublishPolicy`]. Never fails visibly: a payload for a topic
    /// with no subscriber, or one published after `stop`, is logged and
    /// dropped. A publisher still waiting for space when `stop` runs gives
    /// up and drops its payload.
    pub async fn publish(&self, topic: impl Into<Topic>, payload: E) {
        let topic = topic.into();

        let route = self.registry.read().route(topic.as_str());
        let (sender, policy, mut closed) = match route {
            Route::Open {
                sender,
                policy,
                closed,
            } => (sender, policy, closed),
            Route::Closed => {
                warn!(topic = %topic, "Bus stopped, payload dropped");
                record_dropped(topic.as_str(), DropReason::Stopped);
                return;
            }
            Route::Missing => {
                error!(topic = %topic, "Channel not found, payload dropped");
                record_dropped(topic.as_str(), DropReason::NoSubscriber);
                return;
            }
        };

        let send = async {
            match policy {
                PublishPolicy::Block => sender.send(payload).await.map_err(|_| DropReason::Closed),
                PublishPolicy::Timeout(after) => {
                    sender
                        .send_timeout(payload, after)
                        .await
                        .map_err(|e| match e {
                            mpsc::error::SendTimeoutError::Timeout(_) => DropReason::Timeout,
                            mpsc::error::SendTimeoutError::Closed(_) => DropReason::Closed,
                        })
                }
            }
        };

        // The close signal wins over a slot freed at the same time.
        let sent = tokio::select! {
            biased;
            () = stopped(&mut closed) => Err(DropReason::Stopped),
            sent = send => sent,
        };

        match sent {
            Ok(()) => record_published(topic.as_str()),
            Err(reason) => {
                warn!(topic = %topic, reason = reason.as_str(), "Publish failed, payload dropped");
                record_dropped(topic.as_str(), reason);
            }
        }
    }

    /// Bind `handler` to `topic` using the bus's default topic settings.
    pub fn subscribe<H>(&self, topic: impl Into<Topic>, handler: H) -> Result<(), SubscriptionError>
    where
        H: Handler<E> + 'static,
    {
        self.subscribe_shared(topic, Arc::new(handler), self.config.default_topic)
    }

    /// Bind `handler` to `topic` with explicit worker and channel settings.
    pub fn subscribe_with<H>(
        &self,
        topic: impl Into<Topic>,
        handler: H,
        config: TopicConfig,
    ) -> Result<(), SubscriptionError>
    where
        H: Handler<E> + 'static,
    {
        self.subscribe_shared(topic, Arc::new(handler), config)
    }

    /// Bind an already shared handler to `topic`.
    ///
    /// The first successful call for a topic allocates its channel and spawns
    /// `config.workers` workers on the current tokio runtime. A second call
    /// for the same topic fails with [`SubscriptionError::AlreadySubscribed`]
    /// and leaves the existing binding untouched.
    pub fn subscribe_shared(
        &self,
        topic: impl Into<Topic>,
        handler: Arc<dyn Handler<E>>,
        config: TopicConfig,
    ) -> Result<(), SubscriptionError> {
        let topic = topic.into();

        let mut registry = self.registry.write();
        if registry.is_stopped() {
            return Err(SubscriptionError::Stopped { topic });
        }
        if registry.contains(&topic) {
            return Err(SubscriptionError::AlreadySubscribed { topic });
        }

        config
            .validate()
            .map_err(|reason| SubscriptionError::InvalidConfig {
                topic: topic.clone(),
                reason,
            })?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SubscriptionError::NoRuntime)?;

        let (sender, receiver) = mpsc::channel(config.capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let live = Arc::new(watch::channel(config.workers).0);

        let workers = (0..config.workers)
            .map(|index| {
                let worker = Worker::new(
                    topic.clone(),
                    index,
                    Arc::clone(&receiver),
                    Arc::clone(&self.registry),
                    Arc::clone(&live),
                );
                runtime.spawn(worker.run())
            })
            .collect();

        registry.insert(
            topic.clone(),
            TopicEntry::new(sender, handler, config, live, workers),
        );

        info!(
            topic = %topic,
            workers = config.workers,
            capacity = config.capacity,
            "Subscribed to topic"
        );
        Ok(())
    }

    /// Close every topic channel.
    ///
    /// Returns without waiting: workers finish the payloads already buffered
    /// and exit on their own. Later publishes are dropped and later
    /// subscribes rejected. Calling it again is a no-op.
    pub fn stop(&self) {
        let closed = self.registry.write().close_all();
        if !closed.is_empty() {
            info!(topics = closed.len(), "Bus stopped, channels closed");
        }
    }

    /// Wait for every worker spawned so far to exit.
    ///
    /// Only returns after `stop` (or once all workers died); callers usually
    /// bound it with `tokio::time::timeout`. Safe to call from several tasks:
    /// the first one joins the worker tasks and reports abnormal exits, every
    /// caller waits until each topic's live-worker count reaches zero.
    pub async fn wait_for_drain(&self) {
        let (workers, live_counts) = {
            let mut registry = self.registry.write();
            (registry.take_workers(), registry.live_counts())
        };

        for (topic, handle) in workers {
            if let Err(e) = handle.await {
                error!(topic = %topic, error = %e, "Worker task ended abnormally");
            }
        }

        for live in live_counts {
            let mut live = live.subscribe();
            // The sender lives in the registry entry, which outlives this call.
            let _ = live.wait_for(|count| *count == 0).await;
        }
    }

    #[must_use]
    pub fn topic_state(&self, topic: impl Into<Topic>) -> TopicState {
        self.registry.read().state(topic.into().as_str())
    }

    /// Settings a topic was subscribed with.
    #[must_use]
    pub fn topic_config(&self, topic: impl Into<Topic>) -> Option<TopicConfig> {
        self.registry.read().config(topic.into().as_str())
    }

    /// Subscribed topics, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.registry.read().topics()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.registry.read().is_stopped()
    }
}

impl Bus<NotifyEvent> {
    /// Publish an application event on its own topic.
    pub async fn emit(&self, event: impl Into<NotifyEvent>) {
        let event = event.into();
        self.publish(event.topic(), event).await;
    }
}

/// Resolves once the topic has been closed, or its entry dropped with the bus.
async fn stopped(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}

impl<E: Send + 'static> Default for Bus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + 'static> Drop for Bus<E> {
    fn drop(&mut self) {
        // Workers hold the registry; closing the channels lets them exit.
        self.registry.write().close_all();
    }
}
