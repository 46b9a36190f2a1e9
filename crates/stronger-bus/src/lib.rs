//! # Stronger Bus - In-Process Event Dispatcher
//!
//! Moves side effects (notification rows, request traces) off the request
//! path. Request code publishes after its own transaction commits; a pool of
//! workers per topic runs the bound handler.
//!
//! ```text
//!  publish(topic, payload)
//!         │
//!         ▼
//!  ┌──────────────┐   bounded    ┌──────────┐
//!  │ Topic        │ ──channel──► │ worker 0 │──► handler.handle(payload)
//!  │ Registry     │      │       ├──────────┤
//!  │ (RwLock)     │      ├─────► │ worker 1 │──► handler.handle(payload)
//!  └──────────────┘      │       ├──────────┤
//!         ▲              └─────► │ worker N │──► handler.handle(payload)
//!         │                      └──────────┘
//!  subscribe(topic, handler) / stop()
//! ```
//!
//! ## Delivery
//!
//! - Enqueue order is FIFO per topic; completion order across workers is not
//! - At-most-once: no acknowledgment, no retry, no dead-letter queue
//! - Publishing to a topic with no subscriber logs and drops
//! - Handler errors and panics are contained in the worker
//!
//! ## Lifecycle
//!
//! One-shot per process: `Unregistered -> Active -> Draining -> Terminated`.

#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod events;
pub mod publisher;
pub mod registry;
pub mod subscriber;
mod worker;

// Re-export main types
pub use config::{BusConfig, PublishPolicy, TopicConfig};
pub use events::{
    topics, DecodeError, NotifyEvent, RequestTraced, Topic, UserFollowed, WorkoutCommentPosted,
};
pub use publisher::Bus;
pub use registry::TopicState;
pub use subscriber::{
    handler_fn, Decoding, Handler, HandlerError, HandlerFn, SubscriptionError, TypedHandler,
};

/// Workers spawned per topic unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 5;

/// Channel slots per topic unless configured otherwise.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 50;
