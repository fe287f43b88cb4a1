//! Signal conditioner
//!
//! Debounces all three encoder lines and runs the quadrature decoder over
//! the debounced phases. Should be sampled at a fixed interval (every
//! 1-5ms); the debounce window is `debounce_samples` polls long.

use heapless::Vec;

use super::debounce::Debouncer;
use super::quadrature::{QuadratureDecoder, Rotation};
use super::{Edge, EdgeEvent, PinSample};
use crate::time::Millis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Edges produced by a single poll (switch edge first, then rotation)
pub type Edges = Vec<EdgeEvent, 2>;

/// Signal conditioner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConditionerConfig {
    /// Consecutive polls a level must hold before it is accepted
    pub debounce_samples: u8,
    /// Quadrature transitions per mechanical detent (4 for most encoders)
    pub transitions_per_detent: u8,
    /// Swap CW/CCW (encoder wired the other way round)
    pub invert_direction: bool,
    /// Switch pulls the line low when pressed
    pub switch_active_low: bool,
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        Self {
            debounce_samples: 3,
            transitions_per_detent: 4,
            invert_direction: false,
            switch_active_low: true,
        }
    }
}

/// Turns raw pin samples into clean edge events
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    config: ConditionerConfig,
    a: Debouncer,
    b: Debouncer,
    switch: Debouncer,
    decoder: QuadratureDecoder,
}

impl SignalConditioner {
    /// Create a conditioner settled at the given initial levels
    ///
    /// Seeding with the real levels keeps a button held through boot from
    /// producing a phantom `ButtonDown`.
    pub fn new(config: ConditionerConfig, initial: PinSample) -> Self {
        let pressed = switch_pressed(initial.switch, config.switch_active_low);
        Self {
            config,
            a: Debouncer::new(initial.a, config.debounce_samples),
            b: Debouncer::new(initial.b, config.debounce_samples),
            switch: Debouncer::new(pressed, config.debounce_samples),
            decoder: QuadratureDecoder::new(
                initial.a,
                initial.b,
                config.transitions_per_detent,
                config.invert_direction,
            ),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &ConditionerConfig {
        &self.config
    }

    /// Whether the debounced switch is currently closed
    pub fn button_pressed(&self) -> bool {
        self.switch.level()
    }

    /// Process one poll worth of raw levels
    pub fn sample(&mut self, sample: PinSample, now: Millis) -> Edges {
        let mut edges = Edges::new();

        let pressed = switch_pressed(sample.switch, self.config.switch_active_low);
        if let Some(level) = self.switch.update(pressed) {
            let edge = if level { Edge::ButtonDown } else { Edge::ButtonUp };
            // Capacity is 2 and at most two edges are pushed per poll
            let _ = edges.push(EdgeEvent { edge, at: now });
        }

        let a_changed = self.a.update(sample.a).is_some();
        let b_changed = self.b.update(sample.b).is_some();
        if a_changed || b_changed {
            if let Some(rotation) = self.decoder.update(self.a.level(), self.b.level()) {
                let edge = match rotation {
                    Rotation::Clockwise => Edge::RotateCw,
                    Rotation::CounterClockwise => Edge::RotateCcw,
                };
                let _ = edges.push(EdgeEvent { edge, at: now });
            }
        }

        for e in &edges {
            trace!("edge {:?} at {}", e.edge, e.at);
        }

        edges
    }
}

#[inline]
fn switch_pressed(level_high: bool, active_low: bool) -> bool {
    if active_low {
        !level_high
    } else {
        level_high
    }
}
