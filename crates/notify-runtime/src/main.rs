//! # Stronger Notify Runtime
//!
//! Runs the in-process event bus with the notification and trace handlers.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Load configuration (defaults, then environment)
//! 3. Subscribe handlers (spawns the per-topic workers)
//! 4. Wait for Ctrl+C
//! 5. Stop the bus and wait, bounded, for the workers to drain

use std::sync::Arc;

use anyhow::{Context, Result};
use stronger_telemetry::{gather_text, init_telemetry, TelemetryConfig};
use tracing::{debug, info, warn};

use notify_runtime::{InMemoryStore, NotifyRuntime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    let topic = config.topic();
    info!(
        service = %telemetry.service_name,
        workers = topic.workers,
        capacity = topic.capacity,
        handler_timeout_ms = config.handler_timeout.as_millis() as u64,
        "Loaded configuration"
    );

    let store = Arc::new(InMemoryStore::new());
    let runtime = NotifyRuntime::new(config, store);
    runtime.start()?;

    info!("Notify runtime running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    if !runtime.shutdown().await {
        warn!("Exiting with workers still running");
    }

    match gather_text() {
        Ok(metrics) => debug!(%metrics, "Final bus metrics"),
        Err(e) => warn!(error = %e, "Failed to gather metrics"),
    }
    info!("Notify runtime stopped");
    Ok(())
}
