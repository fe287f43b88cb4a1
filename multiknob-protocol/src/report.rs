//! USB HID report encoding
//!
//! The device exposes three HID interfaces: a boot keyboard, a mouse with
//! vertical and horizontal wheels, and a consumer-control page for media
//! keys. [`ReportEncoder`] keeps the keyboard and mouse button state and
//! turns each [`HidEvent`] into the input reports that express it.
//!
//! Report layouts:
//! - Keyboard (8 bytes): modifier bitmap, reserved, six key slots
//! - Mouse (5 bytes): buttons, x, y, wheel, pan
//! - Consumer (2 bytes): usage id, little endian; 0 releases

use heapless::Vec;

use multiknob_core::action::{HidEvent, KeyCode, MediaKey};
use multiknob_core::profile::MAX_SENSITIVITY;

/// Consumer page usage ids
pub mod usage {
    pub const VOLUME_INCREMENT: u16 = 0x00E9;
    pub const VOLUME_DECREMENT: u16 = 0x00EA;
    pub const MUTE: u16 = 0x00E2;
    pub const PLAY_PAUSE: u16 = 0x00CD;
    pub const SCAN_NEXT_TRACK: u16 = 0x00B5;
    pub const SCAN_PREVIOUS_TRACK: u16 = 0x00B6;
}

/// Most reports a single event can produce (a volume step burst)
pub const MAX_REPORTS: usize = 2 * MAX_SENSITIVITY as usize;

/// Reports produced by one event, in send order
pub type Reports = Vec<Report, MAX_REPORTS>;

/// Boot keyboard input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0] = self.modifier;
        out[2..].copy_from_slice(&self.keycodes);
        out
    }

    fn register(&mut self, key: KeyCode) -> bool {
        if key.is_modifier() {
            self.modifier |= key.modifier_bit();
            return true;
        }
        if self.keycodes.contains(&key.0) {
            return true;
        }
        match self.keycodes.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = key.0;
                true
            }
            None => false,
        }
    }

    fn unregister(&mut self, key: KeyCode) {
        if key.is_modifier() {
            self.modifier &= !key.modifier_bit();
            return;
        }
        for slot in self.keycodes.iter_mut() {
            if *slot == key.0 {
                *slot = 0;
            }
        }
    }
}

/// Mouse input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
    pub pan: i8,
}

impl MouseReport {
    pub fn to_bytes(&self) -> [u8; 5] {
        [
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
            self.pan as u8,
        ]
    }
}

/// Consumer-control input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumerReport {
    pub usage_id: u16,
}

impl ConsumerReport {
    pub fn to_bytes(&self) -> [u8; 2] {
        self.usage_id.to_le_bytes()
    }
}

/// One report for one of the three interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Consumer(ConsumerReport),
}

/// Stateful event-to-report translator
#[derive(Debug, Clone, Default)]
pub struct ReportEncoder {
    keyboard: KeyboardReport,
    buttons: u8,
}

impl ReportEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current keyboard state
    pub fn keyboard(&self) -> &KeyboardReport {
        &self.keyboard
    }

    /// Currently pressed mouse buttons
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Reports that express `event`, in send order
    pub fn encode(&mut self, event: HidEvent) -> Reports {
        let mut out = Reports::new();

        match event {
            HidEvent::VolumeUp(steps) => consumer_taps(&mut out, usage::VOLUME_INCREMENT, steps),
            HidEvent::VolumeDown(steps) => consumer_taps(&mut out, usage::VOLUME_DECREMENT, steps),
            HidEvent::Mute => consumer_taps(&mut out, usage::MUTE, 1),
            HidEvent::Media(key) => consumer_taps(&mut out, media_usage(key), 1),
            HidEvent::ScrollVertical(delta) => push(
                &mut out,
                Report::Mouse(MouseReport {
                    buttons: self.buttons,
                    wheel: delta,
                    ..MouseReport::default()
                }),
            ),
            HidEvent::ScrollHorizontal(delta) => push(
                &mut out,
                Report::Mouse(MouseReport {
                    buttons: self.buttons,
                    pan: delta,
                    ..MouseReport::default()
                }),
            ),
            HidEvent::MouseMove { dx, dy } => push(
                &mut out,
                Report::Mouse(MouseReport {
                    buttons: self.buttons,
                    x: dx,
                    y: dy,
                    ..MouseReport::default()
                }),
            ),
            HidEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.buttons |= button.bit();
                } else {
                    self.buttons &= !button.bit();
                }
                push(&mut out, self.mouse_buttons(self.buttons));
            }
            HidEvent::MouseClick(button) => {
                push(&mut out, self.mouse_buttons(self.buttons | button.bit()));
                push(&mut out, self.mouse_buttons(self.buttons));
            }
            HidEvent::KeyPress(key) => {
                // Full rollover: the key is dropped but the state still reported
                let _ = self.keyboard.register(key);
                push(&mut out, Report::Keyboard(self.keyboard));
            }
            HidEvent::KeyRelease(key) => {
                self.keyboard.unregister(key);
                push(&mut out, Report::Keyboard(self.keyboard));
            }
            HidEvent::Chord { modifiers, key } => {
                let mut chord = self.keyboard;
                chord.modifier |= modifiers;
                let _ = chord.register(key);
                push(&mut out, Report::Keyboard(chord));
                push(&mut out, Report::Keyboard(self.keyboard));
            }
            HidEvent::KeyTap { key, count } => {
                let mut tap = self.keyboard;
                let _ = tap.register(key);
                for _ in 0..count.clamp(1, MAX_SENSITIVITY) {
                    push(&mut out, Report::Keyboard(tap));
                    push(&mut out, Report::Keyboard(self.keyboard));
                }
            }
        }

        out
    }

    /// Reports that release every key and button
    pub fn release_all(&mut self) -> Reports {
        let mut out = Reports::new();
        self.keyboard = KeyboardReport::default();
        self.buttons = 0;
        push(&mut out, Report::Keyboard(self.keyboard));
        push(&mut out, self.mouse_buttons(0));
        out
    }

    fn mouse_buttons(&self, buttons: u8) -> Report {
        Report::Mouse(MouseReport {
            buttons,
            ..MouseReport::default()
        })
    }
}

/// What to do with an event given the host's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Host away; drop the event
    Discard,
    /// First event after (re)connection; write these before the event
    Reconnect(Reports),
    /// Host present; encode and write the event
    Send,
}

/// Report encoder that follows the host coming and going
///
/// Events are discarded while the host is away. The encoder state is
/// reset on reconnect, since a bus reset or resume leaves the host with
/// no reliable view of what is held.
#[derive(Debug, Clone, Default)]
pub struct HostLink {
    encoder: ReportEncoder,
    connected: bool,
}

impl HostLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Decide how to handle the next event
    pub fn admit(&mut self, host_ready: bool) -> Admission {
        match (host_ready, self.connected) {
            (false, _) => {
                self.connected = false;
                Admission::Discard
            }
            (true, false) => {
                self.connected = true;
                Admission::Reconnect(self.encoder.release_all())
            }
            (true, true) => Admission::Send,
        }
    }

    /// Reports for an admitted event
    pub fn encode(&mut self, event: HidEvent) -> Reports {
        self.encoder.encode(event)
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }
}

fn media_usage(key: MediaKey) -> u16 {
    match key {
        MediaKey::PlayPause => usage::PLAY_PAUSE,
        MediaKey::NextTrack => usage::SCAN_NEXT_TRACK,
        MediaKey::PrevTrack => usage::SCAN_PREVIOUS_TRACK,
    }
}

/// Press and release a consumer usage `times` times
fn consumer_taps(out: &mut Reports, usage_id: u16, times: u8) {
    let times = times.clamp(1, MAX_SENSITIVITY);
    for _ in 0..times {
        push(out, Report::Consumer(ConsumerReport { usage_id }));
        push(out, Report::Consumer(ConsumerReport { usage_id: 0 }));
    }
}

fn push(out: &mut Reports, report: Report) {
    // Bounded by MAX_REPORTS by construction
    let _ = out.push(report);
}
