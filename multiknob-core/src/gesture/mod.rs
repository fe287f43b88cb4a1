//! Gesture recognition
//!
//! Disambiguates conditioned edges into the eight named gestures a profile
//! can map to actions.

pub mod classifier;

pub use classifier::{Classifier, ClassifierState, Gestures, TimingConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of gesture slots in a profile table
pub const GESTURE_COUNT: usize = 8;

/// Disambiguated physical interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GestureKind {
    RotateCw,
    RotateCcw,
    SingleClick,
    DoubleClick,
    TripleClick,
    LongPress,
    ShiftRotateCw,
    ShiftRotateCcw,
}

impl GestureKind {
    /// All gestures in table order
    pub const ALL: [GestureKind; GESTURE_COUNT] = [
        GestureKind::RotateCw,
        GestureKind::RotateCcw,
        GestureKind::SingleClick,
        GestureKind::DoubleClick,
        GestureKind::TripleClick,
        GestureKind::LongPress,
        GestureKind::ShiftRotateCw,
        GestureKind::ShiftRotateCcw,
    ];

    /// Slot index in a profile's gesture table
    pub const fn index(self) -> usize {
        match self {
            GestureKind::RotateCw => 0,
            GestureKind::RotateCcw => 1,
            GestureKind::SingleClick => 2,
            GestureKind::DoubleClick => 3,
            GestureKind::TripleClick => 4,
            GestureKind::LongPress => 5,
            GestureKind::ShiftRotateCw => 6,
            GestureKind::ShiftRotateCcw => 7,
        }
    }

    /// Returns true for plain or shifted rotation
    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            GestureKind::RotateCw
                | GestureKind::RotateCcw
                | GestureKind::ShiftRotateCw
                | GestureKind::ShiftRotateCcw
        )
    }

    /// Returns true for rotation while the switch is held
    pub fn is_shifted(&self) -> bool {
        matches!(self, GestureKind::ShiftRotateCw | GestureKind::ShiftRotateCcw)
    }

    /// Returns true for click gestures
    pub fn is_click(&self) -> bool {
        matches!(
            self,
            GestureKind::SingleClick | GestureKind::DoubleClick | GestureKind::TripleClick
        )
    }

    /// The shift-layer counterpart of a plain rotation
    ///
    /// Non-rotation gestures and already shifted gestures map to themselves.
    pub fn shifted(self) -> Self {
        match self {
            GestureKind::RotateCw => GestureKind::ShiftRotateCw,
            GestureKind::RotateCcw => GestureKind::ShiftRotateCcw,
            other => other,
        }
    }

    /// Click gesture for a pending click count (1..=3)
    pub fn from_click_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(GestureKind::SingleClick),
            2 => Some(GestureKind::DoubleClick),
            3 => Some(GestureKind::TripleClick),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_table_order() {
        for (i, g) in GestureKind::ALL.iter().enumerate() {
            assert_eq!(g.index(), i);
        }
    }

    #[test]
    fn test_shifted() {
        assert_eq!(GestureKind::RotateCw.shifted(), GestureKind::ShiftRotateCw);
        assert_eq!(GestureKind::RotateCcw.shifted(), GestureKind::ShiftRotateCcw);
        assert_eq!(GestureKind::SingleClick.shifted(), GestureKind::SingleClick);
        assert_eq!(GestureKind::ShiftRotateCw.shifted(), GestureKind::ShiftRotateCw);
    }

    #[test]
    fn test_click_counts() {
        assert_eq!(GestureKind::from_click_count(0), None);
        assert_eq!(GestureKind::from_click_count(2), Some(GestureKind::DoubleClick));
        assert_eq!(GestureKind::from_click_count(4), None);
    }

    #[test]
    fn test_categories() {
        assert!(GestureKind::ShiftRotateCcw.is_rotation());
        assert!(GestureKind::ShiftRotateCcw.is_shifted());
        assert!(!GestureKind::RotateCw.is_shifted());
        assert!(GestureKind::TripleClick.is_click());
        assert!(!GestureKind::LongPress.is_click());
    }
}
