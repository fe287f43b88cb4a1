//! Profiles and layer resolution
//!
//! A profile is a total table from [`GestureKind`] to [`Action`] plus the
//! sensitivity multipliers for the three scaled axes. Exactly
//! [`PROFILE_COUNT`] profiles exist; the count is fixed by the array type.

pub mod resolver;

pub use resolver::{resolve, Layer, ProfileChange, Resolver};

use crate::action::{Action, Axis};
use crate::gesture::{GestureKind, GESTURE_COUNT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of profiles
pub const PROFILE_COUNT: usize = 3;

/// Smallest sensitivity multiplier
pub const MIN_SENSITIVITY: u8 = 1;

/// Largest sensitivity multiplier
pub const MAX_SENSITIVITY: u8 = 10;

/// Per-axis magnitude multipliers (1..=10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensitivity {
    pub volume: u8,
    pub scroll: u8,
    pub mouse: u8,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            volume: MIN_SENSITIVITY,
            scroll: MIN_SENSITIVITY,
            mouse: MIN_SENSITIVITY,
        }
    }
}

impl Sensitivity {
    /// Multiplier for an axis
    pub fn for_axis(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Volume => self.volume,
            Axis::Scroll => self.scroll,
            Axis::Mouse => self.mouse,
        }
    }

    /// Replace out-of-range multipliers with 1
    pub fn sanitized(self) -> Self {
        Self {
            volume: sanitize_multiplier(self.volume),
            scroll: sanitize_multiplier(self.scroll),
            mouse: sanitize_multiplier(self.mouse),
        }
    }

    /// Returns true if all multipliers are in range
    pub fn is_valid(&self) -> bool {
        [self.volume, self.scroll, self.mouse]
            .iter()
            .all(|m| (MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(m))
    }
}

/// Clamp policy for a single multiplier: out of range means 1
pub fn sanitize_multiplier(m: u8) -> u8 {
    if (MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&m) {
        m
    } else {
        MIN_SENSITIVITY
    }
}

/// Gesture table and multipliers of one profile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    /// Indexed by [`GestureKind::index`]
    pub actions: [Action; GESTURE_COUNT],
    pub sensitivity: Sensitivity,
}

impl Profile {
    /// Action bound to a gesture
    pub fn action(&self, gesture: GestureKind) -> &Action {
        &self.actions[gesture.index()]
    }

    /// Bind an action to a gesture
    pub fn set(&mut self, gesture: GestureKind, action: Action) {
        self.actions[gesture.index()] = action;
    }

    /// Builder form of [`Profile::set`]
    pub fn with(mut self, gesture: GestureKind, action: Action) -> Self {
        self.set(gesture, action);
        self
    }
}

/// The fixed set of profiles
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileSet {
    pub profiles: [Profile; PROFILE_COUNT],
}

impl ProfileSet {
    pub fn new(profiles: [Profile; PROFILE_COUNT]) -> Self {
        Self { profiles }
    }

    /// Profile by index, if in range
    pub fn get(&self, index: u8) -> Option<&Profile> {
        self.profiles.get(index as usize)
    }

    /// Profile by index, falling back to the first
    pub fn profile(&self, index: u8) -> &Profile {
        self.get(index).unwrap_or(&self.profiles[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    /// Replace out-of-range multipliers in every profile
    pub fn sanitize(&mut self) {
        for profile in self.profiles.iter_mut() {
            profile.sensitivity = profile.sensitivity.sanitized();
        }
    }
}
