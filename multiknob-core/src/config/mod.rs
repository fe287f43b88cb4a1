//! Configuration types
//!
//! Board-agnostic configuration: the profile set, timing thresholds, and
//! the small record persisted when the active profile changes.

pub mod defaults;
#[cfg(feature = "serde")]
pub mod persist;
pub mod types;

pub use defaults::default_profiles;
#[cfg(feature = "serde")]
pub use persist::{PersistedState, PERSISTED_STATE_SIZE};
pub use types::*;
