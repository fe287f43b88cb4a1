//! Quadrature decoder
//!
//! Decodes the two encoder phases into detent steps.
//!
//! Quadrature encoding (A is the high bit of the state, pull-ups so the
//! detent rests at A=1, B=1):
//!
//! ```text
//! CW:  11 -> 01 -> 00 -> 10 -> 11   (A changes first)
//! CCW: 11 -> 10 -> 00 -> 01 -> 11   (B changes first)
//! ```
//!
//! Every valid Gray-code transition moves an accumulator by one; a step is
//! reported once the accumulator reaches `transitions_per_detent`. Invalid
//! transitions (both lines flipping at once) carry no direction and are
//! ignored. Returning to the rest state with a partial count discards it,
//! which swallows the half-turn wobble you get when a knob is nudged and
//! released.

/// Transition table for `(prev << 2) | curr`: +1 CW, -1 CCW, 0 invalid/none
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Detent rest state (both lines high)
const REST: u8 = 0b11;

/// Direction of a decoded detent step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Quadrature decoder state
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    prev: u8,
    accum: i8,
    transitions_per_detent: u8,
    inverted: bool,
}

impl QuadratureDecoder {
    /// Create a decoder starting from the given line levels
    pub fn new(a: bool, b: bool, transitions_per_detent: u8, inverted: bool) -> Self {
        Self {
            prev: state_from_levels(a, b),
            accum: 0,
            transitions_per_detent: transitions_per_detent.clamp(1, 4),
            inverted,
        }
    }

    /// Feed the current (debounced) line levels
    ///
    /// Returns a rotation when a full detent has been traversed.
    pub fn update(&mut self, a: bool, b: bool) -> Option<Rotation> {
        let curr = state_from_levels(a, b);
        if curr == self.prev {
            return None;
        }

        let delta = TRANSITIONS[((self.prev << 2) | curr) as usize];
        self.prev = curr;
        self.accum = self.accum.saturating_add(delta);

        let threshold = self.transitions_per_detent as i8;
        if self.accum >= threshold {
            self.accum = 0;
            return Some(self.direction(true));
        }
        if self.accum <= -threshold {
            self.accum = 0;
            return Some(self.direction(false));
        }

        if curr == REST {
            // Partial step that came back to the detent
            self.accum = 0;
        }

        None
    }

    fn direction(&self, positive: bool) -> Rotation {
        if positive != self.inverted {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        }
    }
}

#[inline]
fn state_from_levels(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | (b as u8)
}
