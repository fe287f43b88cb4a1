//! Gesture classifier state machine
//!
//! Consumes conditioned edges and emits disambiguated gestures.
//!
//! Rotation and shifted rotation are latency-sensitive and are emitted on
//! the edge that produced them. Clicks are deferred: a single click cannot
//! be reported until the multi-click window has passed without another
//! press, so the pending count lives in the state with its timestamp and
//! [`Classifier::tick`] reports it once the window expires. The long-press
//! check also runs from `tick`, before the release can be counted as a
//! click, which makes long press and clicks mutually exclusive.
//!
//! ```text
//!            rotate / emit Rotate*
//!              +----+
//!              v    |
//!  +--------> Idle -+-- down --> ButtonHeld ---- rotate / emit ShiftRotate* (armed)
//!  |           ^                   |  |  |
//!  |           |     up (armed) ---+  |  +-- held >= long press / emit LongPress
//!  |           |                      |                |
//!  |   window expired / emit click    | up             v
//!  |           |                      v          AwaitingRelease -- up --> Idle
//!  |     AwaitingMultiClick <---------+
//!  |           |
//!  +-- third release / emit TripleClick
//! ```

use heapless::Vec;

use super::GestureKind;
use crate::input::{Edge, EdgeEvent};
use crate::time::{elapsed_ms, Millis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gestures emitted by a single edge or tick
///
/// At most two: a flushed click sequence followed by the gesture that
/// interrupted it.
pub type Gestures = Vec<GestureKind, 2>;

/// Highest click count; reaching it emits `TripleClick` immediately
const MAX_CLICKS: u8 = 3;

/// Timing thresholds for the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Hold time after which a press becomes a long press
    pub long_press_ms: u32,
    /// Time after a release during which another press extends the click count
    pub multi_click_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 600,
            multi_click_ms: 300,
        }
    }
}

/// Classifier states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassifierState {
    /// Nothing pending
    Idle,
    /// Released after `count` clicks, waiting to see if another follows
    AwaitingMultiClick { count: u8, last_up: Millis },
    /// Switch closed since `down_at`
    ///
    /// `clicks` carries the count from an earlier release within the
    /// window; `shift_armed` is set once the knob turned during the hold.
    ButtonHeld {
        down_at: Millis,
        shift_armed: bool,
        clicks: u8,
    },
    /// Long press already reported, swallowing input until release
    AwaitingRelease,
}

/// Timed gesture state machine
#[derive(Debug, Clone)]
pub struct Classifier {
    state: ClassifierState,
    timing: TimingConfig,
}

impl Classifier {
    /// Create a new classifier in `Idle`
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            state: ClassifierState::Idle,
            timing,
        }
    }

    /// Current state
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Timing thresholds in use
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns true when nothing is pending
    pub fn is_idle(&self) -> bool {
        self.state == ClassifierState::Idle
    }

    /// Drop any pending interaction
    pub fn reset(&mut self) {
        self.state = ClassifierState::Idle;
    }

    /// Next time at which [`tick`](Self::tick) could emit something
    pub fn next_deadline(&self) -> Option<Millis> {
        match self.state {
            ClassifierState::AwaitingMultiClick { last_up, .. } => {
                Some(last_up.wrapping_add(self.timing.multi_click_ms))
            }
            ClassifierState::ButtonHeld {
                down_at,
                shift_armed: false,
                ..
            } => Some(down_at.wrapping_add(self.timing.long_press_ms)),
            _ => None,
        }
    }

    /// Process a conditioned edge
    pub fn on_edge(&mut self, event: EdgeEvent) -> Gestures {
        let mut out = Gestures::new();
        let now = event.at;

        match (self.state, event.edge) {
            // Rotation
            (ClassifierState::Idle, Edge::RotateCw | Edge::RotateCcw) => {
                emit(&mut out, plain_rotation(event.edge));
            }
            (ClassifierState::AwaitingMultiClick { count, .. }, Edge::RotateCw | Edge::RotateCcw) => {
                // Turning the knob ends the click sequence
                emit_clicks(&mut out, count);
                emit(&mut out, plain_rotation(event.edge));
                self.state = ClassifierState::Idle;
            }
            (ClassifierState::ButtonHeld { down_at, clicks, .. }, Edge::RotateCw | Edge::RotateCcw) => {
                emit_clicks(&mut out, clicks);
                emit(&mut out, plain_rotation(event.edge).shifted());
                self.state = ClassifierState::ButtonHeld {
                    down_at,
                    shift_armed: true,
                    clicks: 0,
                };
            }
            (ClassifierState::AwaitingRelease, Edge::RotateCw | Edge::RotateCcw) => {
                trace!("rotation ignored while waiting for release");
            }

            // Switch closed
            (ClassifierState::Idle, Edge::ButtonDown) => {
                self.state = ClassifierState::ButtonHeld {
                    down_at: now,
                    shift_armed: false,
                    clicks: 0,
                };
            }
            (ClassifierState::AwaitingMultiClick { count, last_up }, Edge::ButtonDown) => {
                let clicks = if elapsed_ms(now, last_up) < self.timing.multi_click_ms {
                    count
                } else {
                    // Window ran out before a tick saw it
                    emit_clicks(&mut out, count);
                    0
                };
                self.state = ClassifierState::ButtonHeld {
                    down_at: now,
                    shift_armed: false,
                    clicks,
                };
            }
            (ClassifierState::ButtonHeld { .. } | ClassifierState::AwaitingRelease, Edge::ButtonDown) => {
                debug!("duplicate ButtonDown ignored");
            }

            // Switch opened
            (
                ClassifierState::ButtonHeld {
                    down_at,
                    shift_armed,
                    clicks,
                },
                Edge::ButtonUp,
            ) => {
                if shift_armed {
                    // Shift gestures were already emitted during the hold
                    self.state = ClassifierState::Idle;
                } else if elapsed_ms(now, down_at) >= self.timing.long_press_ms {
                    // Held long enough but no tick ran in between
                    emit_clicks(&mut out, clicks);
                    emit(&mut out, GestureKind::LongPress);
                    self.state = ClassifierState::Idle;
                } else {
                    let count = clicks.saturating_add(1).min(MAX_CLICKS);
                    if count == MAX_CLICKS {
                        emit(&mut out, GestureKind::TripleClick);
                        self.state = ClassifierState::Idle;
                    } else {
                        self.state = ClassifierState::AwaitingMultiClick { count, last_up: now };
                    }
                }
            }
            (ClassifierState::AwaitingRelease, Edge::ButtonUp) => {
                self.state = ClassifierState::Idle;
            }
            (ClassifierState::Idle | ClassifierState::AwaitingMultiClick { .. }, Edge::ButtonUp) => {
                debug!("stray ButtonUp ignored");
            }
        }

        out
    }

    /// Advance time-based transitions
    ///
    /// Called every control-loop iteration with the current time.
    pub fn tick(&mut self, now: Millis) -> Gestures {
        let mut out = Gestures::new();

        match self.state {
            ClassifierState::AwaitingMultiClick { count, last_up } => {
                if elapsed_ms(now, last_up) >= self.timing.multi_click_ms {
                    emit_clicks(&mut out, count);
                    self.state = ClassifierState::Idle;
                }
            }
            ClassifierState::ButtonHeld {
                down_at,
                shift_armed: false,
                clicks,
            } => {
                if elapsed_ms(now, down_at) >= self.timing.long_press_ms {
                    emit_clicks(&mut out, clicks);
                    emit(&mut out, GestureKind::LongPress);
                    self.state = ClassifierState::AwaitingRelease;
                }
            }
            _ => {}
        }

        out
    }
}

fn plain_rotation(edge: Edge) -> GestureKind {
    match edge {
        Edge::RotateCcw => GestureKind::RotateCcw,
        _ => GestureKind::RotateCw,
    }
}

fn emit(out: &mut Gestures, gesture: GestureKind) {
    debug!("gesture {:?}", gesture);
    // Never more than two per call by construction
    let _ = out.push(gesture);
}

fn emit_clicks(out: &mut Gestures, count: u8) {
    if let Some(gesture) = GestureKind::from_click_count(count) {
        emit(out, gesture);
    }
}
