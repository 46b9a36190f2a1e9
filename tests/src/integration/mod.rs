//! Integration scenarios. Each file holds a `#[cfg(test)] mod tests`.

pub mod delivery;
pub mod notifications;
