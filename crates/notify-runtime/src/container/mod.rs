//! # Runtime Container
//!
//! Configuration for the notify runtime and the validation run before the bus
//! is built.

pub mod config;

pub use config::{ConfigError, RuntimeConfig};
