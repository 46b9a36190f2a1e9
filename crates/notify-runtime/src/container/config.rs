//! # Runtime Configuration
//!
//! Bus fan-out, channel capacity, publish backpressure and handler deadlines.
//! Every value has a default; environment variables override them.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STRONGER_BUS_WORKERS` | `5` | Workers per topic |
//! | `STRONGER_BUS_CAPACITY` | `50` | Channel slots per topic |
//! | `STRONGER_BUS_PUBLISH_TIMEOUT_MS` | unset | Unset blocks publishers; set drops after the wait |
//! | `STRONGER_HANDLER_TIMEOUT_MS` | `5000` | Deadline for a handler's store calls |
//! | `STRONGER_SHUTDOWN_GRACE_MS` | `5000` | How long shutdown waits for workers to drain |

use std::str::FromStr;
use std::time::Duration;

use stronger_bus::{BusConfig, PublishPolicy, TopicConfig};
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Default settings for every topic.
    pub bus: BusConfig,
    /// Deadline each handler applies to its own store calls.
    pub handler_timeout: Duration,
    /// Bound on waiting for workers after the bus is stopped.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            handler_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("handler timeout must be non-zero")]
    ZeroHandlerTimeout,
}

impl RuntimeConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables. Unparsable values are logged
    /// and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let topic = &mut config.bus.default_topic;

        if let Some(workers) = parse_var::<usize>(&lookup, "STRONGER_BUS_WORKERS") {
            topic.workers = workers;
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, "STRONGER_BUS_CAPACITY") {
            topic.capacity = capacity;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STRONGER_BUS_PUBLISH_TIMEOUT_MS") {
            topic.publish_policy = PublishPolicy::Timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STRONGER_HANDLER_TIMEOUT_MS") {
            config.handler_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STRONGER_SHUTDOWN_GRACE_MS") {
            config.shutdown_grace = Duration::from_millis(ms);
        }

        config
    }

    /// Topic settings applied to every handler binding.
    #[must_use]
    pub fn topic(&self) -> TopicConfig {
        self.bus.default_topic
    }

    /// Checks not covered by the bus's own subscribe-time validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handler_timeout.is_zero() {
            return Err(ConfigError::ZeroHandlerTimeout);
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
