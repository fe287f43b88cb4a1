//! Configuration persistence
//!
//! Loads the profile document and the active-profile record from flash.
//! Falls back to the built-in profile set if flash is empty or invalid.

use core::str;
use defmt::*;

use multiknob_core::config::{KnobConfig, PersistedState, PERSISTED_STATE_SIZE};
use multiknob_core::json::{parse_config_str, JsonError};
use multiknob_hal_rp2040::flash::{FlashError, Rp2040FlashStorage, StorageKey, MAX_ITEM_SIZE};
// Import the FlashStorage trait to bring methods into scope
use multiknob_hal_rp2040::FlashStorageTrait;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Profile document is not a JSON object
    Json,
    /// Invalid UTF-8 in the profile document
    InvalidUtf8,
    /// Persisted record could not be decoded or encoded
    Deserialize,
    /// Persisted record is from another format version or out of range
    VersionMismatch,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<JsonError> for ConfigError {
    fn from(_: JsonError) -> Self {
        ConfigError::Json
    }
}

/// Configuration persistence manager
///
/// Owns the flash storage for the lifetime of the firmware: it loads the
/// configuration at boot and then writes back active-profile changes.
pub struct ConfigPersistence<'d> {
    storage: Rp2040FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    /// Create a new config persistence manager
    pub fn new(storage: Rp2040FlashStorage<'d>) -> Self {
        Self { storage }
    }

    /// Load the full boot configuration
    ///
    /// Never fails: a missing or broken profile document gives the
    /// built-in profiles, and a valid active-profile record overrides the
    /// document's `current_profile`.
    pub async fn load_or_default(&mut self) -> KnobConfig {
        let mut config = match self.load().await {
            Ok(config) => {
                info!("Loaded profile document from flash");
                config
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No profile document in flash, using built-in profiles");
                KnobConfig::default()
            }
            Err(e) => {
                warn!("Failed to load profile document: {:?}, using built-in profiles", e);
                KnobConfig::default()
            }
        };

        match self.load_active_profile().await {
            Ok(index) => {
                debug!("Restoring active profile {}", index);
                config.active_profile = index;
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No active-profile record, keeping profile {}", config.active_profile);
            }
            Err(e) => {
                warn!("Ignoring active-profile record: {:?}", e);
            }
        }

        log_config_summary(&config);
        config
    }

    /// Load the JSON profile document
    pub async fn load(&mut self) -> Result<KnobConfig, ConfigError> {
        let mut buffer = [0u8; MAX_ITEM_SIZE];
        let len = self
            .storage
            .read(StorageKey::ProfilesJson, &mut buffer)
            .await?;

        debug!("Read {} bytes of profile document from flash", len);

        let text = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
        Ok(parse_config_str(text)?)
    }

    /// Load the persisted active profile (0-based)
    pub async fn load_active_profile(&mut self) -> Result<u8, ConfigError> {
        let mut buffer = [0u8; PERSISTED_STATE_SIZE];
        let len = self
            .storage
            .read(StorageKey::ActiveProfile, &mut buffer)
            .await?;

        let state =
            PersistedState::decode(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        if !state.is_valid() {
            warn!(
                "Active-profile record rejected: version {}, profile {}",
                state.version, state.active_profile
            );
            return Err(ConfigError::VersionMismatch);
        }

        Ok(state.active_profile)
    }

    /// Write the active profile (0-based)
    pub async fn save_active_profile(&mut self, index: u8) -> Result<(), ConfigError> {
        let mut buffer = [0u8; PERSISTED_STATE_SIZE];
        let data = PersistedState::new(index)
            .encode(&mut buffer)
            .map_err(|_| ConfigError::Deserialize)?;

        self.storage.write(StorageKey::ActiveProfile, data).await?;
        Ok(())
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &KnobConfig) {
    info!("Configuration loaded successfully");
    debug!("  active profile {}", config.active_profile);
    debug!(
        "  long press {} ms, multi-click {} ms",
        config.timing.long_press_ms, config.timing.multi_click_ms
    );
    debug!("  debounce {} samples", config.conditioner.debounce_samples);
    for (i, profile) in config.profiles.iter().enumerate() {
        debug!(
            "  profile {}: sensitivity volume={} scroll={} mouse={}",
            i, profile.sensitivity.volume, profile.sensitivity.scroll, profile.sensitivity.mouse
        );
    }
}
