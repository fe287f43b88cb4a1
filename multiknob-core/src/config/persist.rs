//! Persisted active-profile record
//!
//! Written through the flash key-value store whenever a profile-control
//! action changes the active profile. Encoded with postcard.

use serde::{Deserialize, Serialize};

use super::types::CONFIG_VERSION;
use crate::profile::PROFILE_COUNT;

/// Buffer size sufficient for an encoded [`PersistedState`]
pub const PERSISTED_STATE_SIZE: usize = 8;

/// State that survives a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistedState {
    pub version: u8,
    /// Active profile (0-based)
    pub active_profile: u8,
}

impl PersistedState {
    pub fn new(active_profile: u8) -> Self {
        Self {
            version: CONFIG_VERSION,
            active_profile,
        }
    }

    /// Returns true if the record is from this format version and in range
    pub fn is_valid(&self) -> bool {
        self.version == CONFIG_VERSION && (self.active_profile as usize) < PROFILE_COUNT
    }

    /// Encode into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
