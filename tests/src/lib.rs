//! # Stronger Notify Test Suite
//!
//! Cross-crate scenarios for the event bus and the notify runtime.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── delivery.rs       # Counting, panic isolation, duplicate subscribe
//!     ├── lifecycle.rs      # Stop, drain, backpressure
//!     └── notifications.rs  # Runtime end to end over the in-memory store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p stronger-tests
//! cargo test -p stronger-tests integration::lifecycle::
//! ```

#![allow(dead_code)]

pub mod integration;
