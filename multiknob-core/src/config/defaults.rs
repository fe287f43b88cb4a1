//! Built-in default profiles
//!
//! Used when no profile document is stored, and to pad a document that
//! defines fewer than three profiles.

use crate::action::{Action, MouseButton, ProfileControl, SimpleAction};
use crate::gesture::GestureKind;
use crate::profile::{Profile, ProfileSet, Sensitivity, PROFILE_COUNT};

/// Multipliers the device ships with
pub const DEFAULT_SENSITIVITY: Sensitivity = Sensitivity {
    volume: 2,
    scroll: 1,
    mouse: 4,
};

fn simple(action: SimpleAction) -> Action {
    Action::Simple(action)
}

/// Default profile by index
///
/// 0: media volume, 1: arrow-key scrolling and playback, 2: mouse wheel with
/// horizontal scroll on the shift layer.
pub fn default_profile(index: usize) -> Profile {
    let base = Profile {
        sensitivity: DEFAULT_SENSITIVITY,
        ..Profile::default()
    };

    match index {
        0 => base
            .with(GestureKind::RotateCw, simple(SimpleAction::VolumeUp))
            .with(GestureKind::RotateCcw, simple(SimpleAction::VolumeDown))
            .with(GestureKind::SingleClick, simple(SimpleAction::Mute))
            .with(
                GestureKind::LongPress,
                Action::ProfileControl(ProfileControl::NextProfile),
            ),
        1 => base
            .with(GestureKind::RotateCw, simple(SimpleAction::ArrowUp))
            .with(GestureKind::RotateCcw, simple(SimpleAction::ArrowDown))
            .with(GestureKind::SingleClick, simple(SimpleAction::PlayPause)),
        2 => base
            .with(GestureKind::RotateCw, simple(SimpleAction::ScrollUp))
            .with(GestureKind::RotateCcw, simple(SimpleAction::ScrollDown))
            .with(
                GestureKind::SingleClick,
                simple(SimpleAction::MouseClick(MouseButton::Middle)),
            )
            .with(GestureKind::ShiftRotateCw, simple(SimpleAction::ScrollRight))
            .with(GestureKind::ShiftRotateCcw, simple(SimpleAction::ScrollLeft)),
        _ => base,
    }
}

/// The complete default profile set
pub fn default_profiles() -> ProfileSet {
    let mut set = ProfileSet::default();
    for (i, profile) in set.profiles.iter_mut().enumerate().take(PROFILE_COUNT) {
        *profile = default_profile(i);
    }
    set
}
