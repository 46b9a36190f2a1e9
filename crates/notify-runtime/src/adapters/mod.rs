//! # Adapters
//!
//! The storage port the handlers write through, and the in-memory
//! implementation of it.

pub mod memory_store;
pub mod ports;

pub use memory_store::InMemoryStore;
pub use ports::{
    NewNotification, Notification, NotificationKind, NotificationPayload, NotificationStore,
    StoreError, TraceRecord, Workout, WorkoutComment,
};
