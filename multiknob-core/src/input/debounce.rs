//! Stable-count debouncer
//!
//! A line level is only accepted once it has been observed on
//! `threshold` consecutive polls. Anything shorter is contact bounce.

/// Per-line debounce filter
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    /// Last accepted level
    stable: bool,
    /// Most recent raw level
    raw: bool,
    /// Consecutive polls `raw` has held
    count: u8,
    /// Polls required before a new level is accepted
    threshold: u8,
}

impl Debouncer {
    /// Create a debouncer already settled at `initial`
    pub fn new(initial: bool, threshold: u8) -> Self {
        Self {
            stable: initial,
            raw: initial,
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Current debounced level
    pub fn level(&self) -> bool {
        self.stable
    }

    /// Feed one raw sample
    ///
    /// Returns `Some(level)` on the poll where a new level becomes stable.
    pub fn update(&mut self, sample: bool) -> Option<bool> {
        if sample == self.raw {
            self.count = self.count.saturating_add(1);
        } else {
            self.raw = sample;
            self.count = 1;
        }

        if self.count >= self.threshold && self.stable != self.raw {
            self.stable = self.raw;
            return Some(self.stable);
        }

        None
    }
}
