//! # Notify Runtime
//!
//! Owns the bus for the life of the process.
//!
//! ## Startup
//!
//! 1. Build the bus from configuration
//! 2. Build the standard handler table over the store
//! 3. Subscribe every handler
//!
//! ## Shutdown
//!
//! Stop the bus (non-blocking), then wait up to `shutdown_grace` for the
//! workers to finish what was already buffered.

use std::sync::Arc;

use anyhow::{Context, Result};
use stronger_bus::{Bus, NotifyEvent};
use tracing::{info, warn};

use crate::adapters::NotificationStore;
use crate::container::RuntimeConfig;
use crate::registry::HandlerRegistry;
use crate::tracer::RequestTracer;

pub struct NotifyRuntime {
    config: RuntimeConfig,
    bus: Arc<Bus<NotifyEvent>>,
    store: Arc<dyn NotificationStore>,
}

impl NotifyRuntime {
    pub fn new(config: RuntimeConfig, store: Arc<dyn NotificationStore>) -> Self {
        let bus = Arc::new(Bus::with_config(config.bus));
        Self { config, bus, store }
    }

    /// Subscribe the standard handlers. Must run inside a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        self.config
            .validate()
            .context("Invalid runtime configuration")?;

        let registry = HandlerRegistry::standard(Arc::clone(&self.store), self.config.handler_timeout);
        registry
            .subscribe_all(&self.bus, self.config.topic())
            .context("Failed to subscribe handlers")?;

        let topic = self.config.topic();
        info!(
            topics = registry.len(),
            workers = topic.workers,
            capacity = topic.capacity,
            "Notify runtime started"
        );
        Ok(())
    }

    #[must_use]
    pub fn bus(&self) -> Arc<Bus<NotifyEvent>> {
        Arc::clone(&self.bus)
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn NotificationStore> {
        Arc::clone(&self.store)
    }

    /// A tracer publishing on this runtime's bus.
    #[must_use]
    pub fn tracer(&self) -> RequestTracer {
        RequestTracer::new(self.bus())
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Stop the bus and wait, bounded by the grace period, for workers to
    /// drain. Returns `false` if the grace period ran out first.
    pub async fn shutdown(&self) -> bool {
        info!("Shutting down notify runtime");
        self.bus.stop();

        let grace = self.config.shutdown_grace;
        match tokio::time::timeout(grace, self.bus.wait_for_drain()).await {
            Ok(()) => {
                info!("All bus workers drained");
                true
            }
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "Shutdown grace elapsed before workers drained");
                false
            }
        }
    }
}
