//! # Notify Runtime Library
//!
//! The process around the event bus: storage port and adapter, the
//! notification and trace handlers, the topic table that binds them, and the
//! request tracer that feeds the bus. The main entry point is the `main.rs`
//! binary.
//!
//! ## Layout
//!
//! - `container/` - runtime configuration
//! - `adapters/` - `NotificationStore` port and in-memory adapter
//! - `handlers/` - one handler per application event
//! - `registry/` - topic -> handler table subscribed at startup
//! - `tracer` - request timing published as `RequestTraced`

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod registry;
pub mod runtime;
pub mod tracer;

pub use adapters::{InMemoryStore, NotificationStore};
pub use container::{ConfigError, RuntimeConfig};
pub use registry::HandlerRegistry;
pub use runtime::NotifyRuntime;
pub use tracer::{RequestTracer, Trace};
