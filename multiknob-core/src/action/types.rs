//! Action definitions
//!
//! An action is what a profile maps a gesture to: a single HID effect, a
//! macro sequence, or a profile switch.

use heapless::Vec;

use super::keycode::KeyCode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum steps per macro
pub const MAX_MACRO_STEPS: usize = 16;

/// Longest wait a macro step may request (ms)
///
/// Longer waits are rejected so a misconfigured macro cannot hold the loop
/// hostage.
pub const MAX_WAIT_MS: u16 = 2000;

/// Macro step sequence
pub type Macro = Vec<Step, MAX_MACRO_STEPS>;

/// Sensitivity axis a simple action is scaled along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    Volume,
    Scroll,
    Mouse,
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Bit in the mouse report button byte
    pub fn bit(self) -> u8 {
        match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
        }
    }

    /// Parse a button name (`left`, `right`, `middle`)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("left") {
            Some(MouseButton::Left)
        } else if name.eq_ignore_ascii_case("right") {
            Some(MouseButton::Right)
        } else if name.eq_ignore_ascii_case("middle") {
            Some(MouseButton::Middle)
        } else {
            None
        }
    }
}

/// Media transport keys (consumer page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MediaKey {
    PlayPause,
    NextTrack,
    PrevTrack,
}

/// Single-event action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SimpleAction {
    /// Unconfigured slot
    #[default]
    Nothing,
    VolumeUp,
    VolumeDown,
    Mute,
    PlayPause,
    NextTrack,
    PrevTrack,
    /// Up arrow key
    ArrowUp,
    /// Down arrow key
    ArrowDown,
    /// Wheel up
    ScrollUp,
    /// Wheel down
    ScrollDown,
    /// Horizontal wheel left
    ScrollLeft,
    /// Horizontal wheel right
    ScrollRight,
    MouseLeft,
    MouseRight,
    MouseUp,
    MouseDown,
    MouseClick(MouseButton),
    /// Ctrl+Z
    Undo,
    /// Ctrl+Y
    Redo,
}

impl SimpleAction {
    /// Sensitivity axis that scales this action, if any
    pub fn axis(self) -> Option<Axis> {
        match self {
            SimpleAction::VolumeUp | SimpleAction::VolumeDown => Some(Axis::Volume),
            SimpleAction::ArrowUp
            | SimpleAction::ArrowDown
            | SimpleAction::ScrollUp
            | SimpleAction::ScrollDown
            | SimpleAction::ScrollLeft
            | SimpleAction::ScrollRight => Some(Axis::Scroll),
            SimpleAction::MouseLeft
            | SimpleAction::MouseRight
            | SimpleAction::MouseUp
            | SimpleAction::MouseDown => Some(Axis::Mouse),
            _ => None,
        }
    }

    /// Look up an action by its configuration name
    ///
    /// Accepts the device's historical names (`mouse_scroll_v_pos`,
    /// `mouse_move_x_neg`, ...) alongside the short ones. `scroll_up` and
    /// `scroll_down` are the arrow keys; the wheel is `mouse_scroll_v_*`.
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name.trim() {
            "nothing" | "none" => SimpleAction::Nothing,
            "volume_up" => SimpleAction::VolumeUp,
            "volume_down" => SimpleAction::VolumeDown,
            "mute" => SimpleAction::Mute,
            "play_pause" => SimpleAction::PlayPause,
            "next_track" => SimpleAction::NextTrack,
            "prev_track" => SimpleAction::PrevTrack,
            "scroll_up" | "arrow_up" => SimpleAction::ArrowUp,
            "scroll_down" | "arrow_down" => SimpleAction::ArrowDown,
            "wheel_up" | "mouse_scroll_v_pos" => SimpleAction::ScrollUp,
            "wheel_down" | "mouse_scroll_v_neg" => SimpleAction::ScrollDown,
            "scroll_left" | "mouse_scroll_h_neg" => SimpleAction::ScrollLeft,
            "scroll_right" | "mouse_scroll_h_pos" => SimpleAction::ScrollRight,
            "mouse_left" | "mouse_move_x_neg" => SimpleAction::MouseLeft,
            "mouse_right" | "mouse_move_x_pos" => SimpleAction::MouseRight,
            "mouse_up" | "mouse_move_y_neg" => SimpleAction::MouseUp,
            "mouse_down" | "mouse_move_y_pos" => SimpleAction::MouseDown,
            "mouse_click_left" => SimpleAction::MouseClick(MouseButton::Left),
            "mouse_click_right" => SimpleAction::MouseClick(MouseButton::Right),
            "mouse_click_middle" => SimpleAction::MouseClick(MouseButton::Middle),
            "undo" => SimpleAction::Undo,
            "redo" => SimpleAction::Redo,
            _ => return None,
        };
        Some(action)
    }
}

/// Profile selection side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProfileControl {
    NextProfile,
    PrevProfile,
    /// Select a profile by 0-based index
    SetProfile(u8),
}

impl ProfileControl {
    /// Look up a profile-control name
    ///
    /// `switch_profile_N` is 1-based, as shown to users.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "next_profile" => Some(ProfileControl::NextProfile),
            "prev_profile" => Some(ProfileControl::PrevProfile),
            other => {
                let n: u8 = other.strip_prefix("switch_profile_")?.parse().ok()?;
                n.checked_sub(1).map(ProfileControl::SetProfile)
            }
        }
    }
}

/// One macro step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Step {
    /// Press and hold a key
    KeyPress(KeyCode),
    /// Release a held key
    KeyRelease(KeyCode),
    /// Press and immediately release a key
    KeyTap(KeyCode),
    /// Release every key the macro engine is holding
    ReleaseAll,
    /// Relative pointer motion
    MouseMove { dx: i8, dy: i8 },
    /// Press or release a mouse button
    MouseButton { button: MouseButton, pressed: bool },
    /// Pause before the next step (ms)
    Wait(u16),
}

/// Configured response to a gesture
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    Simple(SimpleAction),
    Macro(Macro),
    ProfileControl(ProfileControl),
}

impl Action {
    /// The defined no-op
    pub const fn nothing() -> Self {
        Action::Simple(SimpleAction::Nothing)
    }

    /// Returns true for the no-op action
    pub fn is_nothing(&self) -> bool {
        matches!(self, Action::Simple(SimpleAction::Nothing))
    }

    /// Build a macro from a step slice, truncating at capacity
    pub fn from_steps(steps: &[Step]) -> Self {
        let mut seq = Macro::new();
        for step in steps.iter().take(MAX_MACRO_STEPS) {
            let _ = seq.push(*step);
        }
        Action::Macro(seq)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::nothing()
    }
}
