//! Profile and layer resolution
//!
//! Pure lookup plus layer selection. The resolver owns the active profile
//! index and the transient shift layer; a [`ProfileControl`] applied here is
//! the only way the active profile changes.

use super::{ProfileSet, PROFILE_COUNT};
use crate::action::{Action, ProfileControl};
use crate::gesture::GestureKind;

/// Active layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    #[default]
    Base,
    /// Switch held with rotation
    Shift,
}

/// Active profile change produced by a profile-control action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProfileChange {
    pub from: u8,
    pub to: u8,
}

/// Look up the action for a gesture on a layer of a profile
///
/// On the shift layer a plain rotation maps to its shifted kind; every
/// other gesture, including the shift kinds themselves, is looked up as is.
pub fn resolve(profiles: &ProfileSet, index: u8, layer: Layer, gesture: GestureKind) -> &Action {
    let kind = match layer {
        Layer::Base => gesture,
        Layer::Shift => gesture.shifted(),
    };
    profiles.profile(index).action(kind)
}

/// Active profile and layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolver {
    active: u8,
    layer: Layer,
}

impl Resolver {
    /// Create a resolver; an out-of-range index selects profile 0
    pub fn new(active: u8) -> Self {
        let active = if (active as usize) < PROFILE_COUNT {
            active
        } else {
            warn!("active profile {} out of range, using 0", active);
            0
        };
        Self {
            active,
            layer: Layer::Base,
        }
    }

    pub fn active(&self) -> u8 {
        self.active
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Action for a gesture in the active profile and layer
    pub fn resolve<'a>(&self, profiles: &'a ProfileSet, gesture: GestureKind) -> &'a Action {
        resolve(profiles, self.active, self.layer, gesture)
    }

    /// Track the layer from an emitted gesture
    pub fn observe(&mut self, gesture: GestureKind) {
        if gesture.is_shifted() {
            self.layer = Layer::Shift;
        }
    }

    /// Switch released: back to the base layer
    pub fn button_released(&mut self) {
        self.layer = Layer::Base;
    }

    /// Apply a profile-control action
    ///
    /// Returns the change when the active index moved. `SetProfile` with an
    /// out-of-range index is rejected.
    pub fn apply(&mut self, control: ProfileControl) -> Option<ProfileChange> {
        let count = PROFILE_COUNT as u8;
        let to = match control {
            ProfileControl::NextProfile => (self.active + 1) % count,
            ProfileControl::PrevProfile => (self.active + count - 1) % count,
            ProfileControl::SetProfile(n) if n < count => n,
            ProfileControl::SetProfile(n) => {
                warn!("rejected switch to profile {}", n);
                return None;
            }
        };

        if to == self.active {
            return None;
        }

        let change = ProfileChange {
            from: self.active,
            to,
        };
        info!("profile {} -> {}", change.from, change.to);
        self.active = to;
        Some(change)
    }
}
