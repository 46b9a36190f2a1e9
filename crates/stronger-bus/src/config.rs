//! # Topic Configuration
//!
//! Fan-out, channel capacity, and backpressure behaviour are chosen per topic
//! at subscribe time.

use std::time::Duration;

use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_WORKERS};

/// What `publish` does when a topic's channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishPolicy {
    /// Suspend the publisher until a worker frees a slot.
    #[default]
    Block,
    /// Wait at most this long, then drop the payload and log.
    Timeout(Duration),
}

/// Per-topic worker pool and channel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicConfig {
    /// Number of workers draining the topic's channel.
    pub workers: usize,
    /// Channel slots before publishers feel backpressure.
    pub capacity: usize,
    /// Behaviour of `publish` on a full channel.
    pub publish_policy: PublishPolicy,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            publish_policy: PublishPolicy::Block,
        }
    }
}

impl TopicConfig {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_publish_policy(mut self, policy: PublishPolicy) -> Self {
        self.publish_policy = policy;
        self
    }

    /// Check the settings can back a channel and at least one worker.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.workers == 0 {
            return Err("worker count must be at least 1");
        }
        if self.capacity == 0 {
            return Err("channel capacity must be at least 1");
        }
        if let PublishPolicy::Timeout(after) = self.publish_policy {
            if after.is_zero() {
                return Err("publish timeout must be non-zero");
            }
        }
        Ok(())
    }
}

/// Bus-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusConfig {
    /// Used by `subscribe` when no per-topic config is given.
    pub default_topic: TopicConfig,
}
