//! Signal conditioning
//!
//! Turns raw pin levels from the encoder's two quadrature lines and its
//! push switch into clean, timestamped edge events. No gesture semantics
//! live here; this layer is purely signal hygiene.

pub mod conditioner;
pub mod debounce;
pub mod quadrature;

pub use conditioner::{ConditionerConfig, Edges, SignalConditioner};
pub use debounce::Debouncer;
pub use quadrature::{QuadratureDecoder, Rotation};

use crate::time::Millis;

/// Clean edge produced by the conditioner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// One detent clockwise
    RotateCw,
    /// One detent counter-clockwise
    RotateCcw,
    /// Switch closed
    ButtonDown,
    /// Switch opened
    ButtonUp,
}

impl Edge {
    /// Returns true if this is a rotation edge
    pub fn is_rotation(&self) -> bool {
        matches!(self, Edge::RotateCw | Edge::RotateCcw)
    }

    /// Returns true if this is a switch edge
    pub fn is_button(&self) -> bool {
        matches!(self, Edge::ButtonDown | Edge::ButtonUp)
    }
}

/// An edge stamped with the poll time it was detected at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    pub edge: Edge,
    pub at: Millis,
}

/// Raw levels of the three encoder lines for one poll
///
/// `true` means the line reads high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSample {
    /// Quadrature line A (CLK)
    pub a: bool,
    /// Quadrature line B (DT)
    pub b: bool,
    /// Push switch (SW)
    pub switch: bool,
}

impl PinSample {
    /// Encoder at rest on a detent with the switch open (pull-ups)
    pub const fn idle() -> Self {
        Self {
            a: true,
            b: true,
            switch: true,
        }
    }
}

impl Default for PinSample {
    fn default() -> Self {
        Self::idle()
    }
}
