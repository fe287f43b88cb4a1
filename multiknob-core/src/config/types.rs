//! Configuration type definitions
//!
//! `KnobConfig` is what the firmware loads at boot. It is assembled from
//! the JSON profile document and the persisted active-profile record; any
//! part that is missing or malformed keeps its default.

use crate::gesture::TimingConfig;
use crate::input::ConditionerConfig;
use crate::profile::{ProfileSet, PROFILE_COUNT};

use super::defaults::default_profiles;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Longest accepted long-press threshold
pub const MAX_LONG_PRESS_MS: u32 = 5000;

/// Longest accepted multi-click window
pub const MAX_MULTI_CLICK_MS: u32 = 2000;

/// What happens to a running macro when a new gesture arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MacroPolicy {
    /// Queue the gesture until the macro completes
    #[default]
    Finish,
    /// Abort the macro (releasing held keys) and handle the gesture
    Abort,
}

impl MacroPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "finish" => Some(MacroPolicy::Finish),
            "abort" => Some(MacroPolicy::Abort),
            _ => None,
        }
    }
}

/// Complete knob configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KnobConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Active profile at boot (0-based)
    pub active_profile: u8,
    pub profiles: ProfileSet,
    pub timing: TimingConfig,
    pub conditioner: ConditionerConfig,
    pub macro_policy: MacroPolicy,
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            active_profile: 0,
            profiles: default_profiles(),
            timing: TimingConfig::default(),
            conditioner: ConditionerConfig::default(),
            macro_policy: MacroPolicy::default(),
        }
    }
}

impl KnobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace out-of-range values with safe defaults
    pub fn sanitize(&mut self) {
        if self.active_profile as usize >= PROFILE_COUNT {
            warn!("active profile {} out of range, using 0", self.active_profile);
            self.active_profile = 0;
        }

        self.profiles.sanitize();

        let defaults = TimingConfig::default();
        if self.timing.long_press_ms == 0 || self.timing.long_press_ms > MAX_LONG_PRESS_MS {
            warn!("long press {} ms out of range", self.timing.long_press_ms);
            self.timing.long_press_ms = defaults.long_press_ms;
        }
        if self.timing.multi_click_ms == 0 || self.timing.multi_click_ms > MAX_MULTI_CLICK_MS {
            warn!("multi-click window {} ms out of range", self.timing.multi_click_ms);
            self.timing.multi_click_ms = defaults.multi_click_ms;
        }

        let c = &mut self.conditioner;
        c.debounce_samples = c.debounce_samples.clamp(1, 16);
        c.transitions_per_detent = c.transitions_per_detent.clamp(1, 4);
    }

    /// Builder: sanitized copy
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}
