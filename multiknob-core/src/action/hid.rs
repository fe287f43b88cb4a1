//! HID output events
//!
//! The dispatcher talks to the host through discrete events handed to an
//! [`HidSink`]. How they become USB reports is the transport's business.

use super::keycode::KeyCode;
use super::types::{MediaKey, MouseButton};

/// Discrete HID output event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidEvent {
    /// Volume up by `n` steps
    VolumeUp(u8),
    /// Volume down by `n` steps
    VolumeDown(u8),
    Mute,
    Media(MediaKey),
    /// Wheel delta (positive = up)
    ScrollVertical(i8),
    /// Horizontal wheel delta (positive = right)
    ScrollHorizontal(i8),
    /// Relative pointer motion (positive y = down)
    MouseMove { dx: i8, dy: i8 },
    MouseButton { button: MouseButton, pressed: bool },
    /// Press and release a mouse button
    MouseClick(MouseButton),
    KeyPress(KeyCode),
    KeyRelease(KeyCode),
    /// Press `key` with the `modifiers` bitmask held, then release both
    Chord { modifiers: u8, key: KeyCode },
    /// Press and release `key` `count` times
    KeyTap { key: KeyCode, count: u8 },
}

/// Output sink for HID events
///
/// Events must be delivered in the order they are emitted.
pub trait HidSink {
    /// Accept one event
    fn emit(&mut self, event: HidEvent);
}

impl<S: HidSink + ?Sized> HidSink for &mut S {
    fn emit(&mut self, event: HidEvent) {
        (**self).emit(event)
    }
}

/// Sink that keeps everything it is given, for tests and host tools
#[derive(Debug, Default, Clone)]
pub struct RecordingSink<const N: usize> {
    pub events: heapless::Vec<HidEvent, N>,
}

impl<const N: usize> RecordingSink<N> {
    pub fn new() -> Self {
        Self {
            events: heapless::Vec::new(),
        }
    }

    /// Take the recorded events, leaving the sink empty
    pub fn take(&mut self) -> heapless::Vec<HidEvent, N> {
        core::mem::take(&mut self.events)
    }
}

impl<const N: usize> HidSink for RecordingSink<N> {
    fn emit(&mut self, event: HidEvent) {
        if self.events.push(event).is_err() {
            warn!("recording sink full, event dropped");
        }
    }
}
