//! Configuration loading and persistence
//!
//! Loads the JSON profile document and the active-profile record from
//! flash, falling back to the built-in profile set.

pub mod loader;

pub use loader::{ConfigError, ConfigPersistence};
