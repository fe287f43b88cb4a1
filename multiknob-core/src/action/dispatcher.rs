//! Action dispatcher and macro engine
//!
//! Simple actions become exactly one HID event, scaled by the profile's
//! sensitivity for the action's axis. Macros run step by step; a `Wait`
//! step suspends the macro until its deadline and [`Dispatcher::poll`]
//! picks it up again, so the control loop keeps sampling the encoder while
//! a macro is in flight.
//!
//! The dispatcher is the only owner of the held-key set. Every path that
//! ends a macro (completion, abort, `ReleaseAll`) releases what is held.

use heapless::Vec;

use super::hid::{HidEvent, HidSink};
use super::keycode::KeyCode;
use super::types::{Action, Macro, MediaKey, MouseButton, SimpleAction, Step, MAX_WAIT_MS};
use crate::profile::Sensitivity;
use crate::time::{deadline_reached, Millis};

/// Maximum keys held at once
pub const MAX_HELD_KEYS: usize = 8;

/// Reasons a macro step is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepError {
    /// Key code outside the sendable range
    UnknownKey,
    /// Wait longer than [`MAX_WAIT_MS`]
    WaitTooLong,
    /// Already holding [`MAX_HELD_KEYS`] keys
    HeldKeysFull,
    /// Release of a key that is not held
    NotHeld,
}

/// Keys currently pressed by the macro engine, in press order
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    keys: Vec<KeyCode, MAX_HELD_KEYS>,
    /// Mouse buttons held via `MouseButton` steps (report bitmask)
    buttons: u8,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.buttons == 0
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Held keys in press order
    pub fn keys(&self) -> &[KeyCode] {
        &self.keys
    }

    fn press(&mut self, key: KeyCode) -> Result<bool, StepError> {
        if self.contains(key) {
            return Ok(false);
        }
        self.keys.push(key).map_err(|_| StepError::HeldKeysFull)?;
        Ok(true)
    }

    fn release(&mut self, key: KeyCode) -> Result<(), StepError> {
        let pos = self
            .keys
            .iter()
            .position(|k| *k == key)
            .ok_or(StepError::NotHeld)?;
        self.keys.remove(pos);
        Ok(())
    }

    fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons |= button.bit();
        } else {
            self.buttons &= !button.bit();
        }
    }

    /// Release everything, most recently pressed key first
    fn release_all<S: HidSink>(&mut self, sink: &mut S) {
        while let Some(key) = self.keys.pop() {
            sink.emit(HidEvent::KeyRelease(key));
        }
        for button in [MouseButton::Left, MouseButton::Right, MouseButton::Middle] {
            if self.buttons & button.bit() != 0 {
                sink.emit(HidEvent::MouseButton {
                    button,
                    pressed: false,
                });
            }
        }
        self.buttons = 0;
    }
}

/// In-flight macro
#[derive(Debug, Clone)]
struct MacroRun {
    steps: Macro,
    /// Index of the next step to execute
    next: usize,
    /// Deadline of the current `Wait`, if suspended
    resume_at: Option<Millis>,
}

/// Result of starting or advancing an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchStatus {
    /// Action finished
    Done,
    /// Macro suspended in a `Wait` step
    Waiting,
}

/// Executes actions against an output sink
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    held: HeldKeys,
    running: Option<MacroRun>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a macro is suspended
    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    /// Keys the engine currently holds
    pub fn held_keys(&self) -> &HeldKeys {
        &self.held
    }

    /// Deadline of the current wait, if any
    pub fn resume_at(&self) -> Option<Millis> {
        self.running.as_ref().and_then(|run| run.resume_at)
    }

    /// Execute an action
    ///
    /// Never interleaves macros: if one is still running it is aborted
    /// (releasing its keys) before the new action starts. Profile control
    /// actions carry no HID output and are ignored here.
    pub fn dispatch<S: HidSink>(
        &mut self,
        action: &Action,
        sensitivity: &Sensitivity,
        now: Millis,
        sink: &mut S,
    ) -> DispatchStatus {
        if self.is_busy() {
            warn!("dispatch while a macro is running, aborting it");
            self.abort(sink);
        }

        match action {
            Action::Simple(simple) => {
                emit_simple(*simple, sensitivity, sink);
                DispatchStatus::Done
            }
            Action::Macro(steps) => {
                debug!("macro start ({} steps)", steps.len());
                self.running = Some(MacroRun {
                    steps: steps.clone(),
                    next: 0,
                    resume_at: None,
                });
                self.run(now, sink)
            }
            Action::ProfileControl(pc) => {
                trace!("profile control {:?} has no HID output", pc);
                DispatchStatus::Done
            }
        }
    }

    /// Advance a suspended macro
    pub fn poll<S: HidSink>(&mut self, now: Millis, sink: &mut S) -> DispatchStatus {
        let Some(run) = self.running.as_ref() else {
            return DispatchStatus::Done;
        };

        match run.resume_at {
            Some(deadline) if deadline_reached(now, deadline) => {
                // Chain from the deadline so consecutive waits don't drift
                self.run(deadline, sink)
            }
            Some(_) => DispatchStatus::Waiting,
            None => self.run(now, sink),
        }
    }

    /// Drop the rest of the running macro and release everything it holds
    pub fn abort<S: HidSink>(&mut self, sink: &mut S) {
        if let Some(run) = self.running.take() {
            debug!("macro aborted at step {}", run.next);
        }
        self.held.release_all(sink);
    }

    /// Release every held key without touching a running macro
    pub fn release_all<S: HidSink>(&mut self, sink: &mut S) {
        self.held.release_all(sink);
    }

    /// Run steps from the cursor until a wait or the end
    fn run<S: HidSink>(&mut self, now: Millis, sink: &mut S) -> DispatchStatus {
        let Some(mut run) = self.running.take() else {
            return DispatchStatus::Done;
        };
        run.resume_at = None;

        while run.next < run.steps.len() {
            let step = run.steps[run.next];
            run.next += 1;

            if let Step::Wait(ms) = step {
                if ms > MAX_WAIT_MS {
                    warn!("macro step skipped: {:?}", StepError::WaitTooLong);
                    continue;
                }
                if ms == 0 {
                    continue;
                }
                run.resume_at = Some(now.wrapping_add(ms as u32));
                self.running = Some(run);
                return DispatchStatus::Waiting;
            }

            if let Err(e) = self.execute(step, sink) {
                warn!("macro step skipped: {:?}", e);
            }
        }

        if !self.held.is_empty() {
            debug!("macro ended with keys held, releasing");
            self.held.release_all(sink);
        }
        debug!("macro done");
        DispatchStatus::Done
    }

    /// Execute a single non-wait step
    fn execute<S: HidSink>(&mut self, step: Step, sink: &mut S) -> Result<(), StepError> {
        match step {
            Step::KeyPress(key) => {
                check_key(key)?;
                if self.held.press(key)? {
                    sink.emit(HidEvent::KeyPress(key));
                }
            }
            Step::KeyRelease(key) => {
                check_key(key)?;
                self.held.release(key)?;
                sink.emit(HidEvent::KeyRelease(key));
            }
            Step::KeyTap(key) => {
                check_key(key)?;
                // A tap of a held key leaves it released
                let _ = self.held.release(key);
                sink.emit(HidEvent::KeyPress(key));
                sink.emit(HidEvent::KeyRelease(key));
            }
            Step::ReleaseAll => self.held.release_all(sink),
            Step::MouseMove { dx, dy } => sink.emit(HidEvent::MouseMove { dx, dy }),
            Step::MouseButton { button, pressed } => {
                self.held.set_button(button, pressed);
                sink.emit(HidEvent::MouseButton { button, pressed });
            }
            Step::Wait(_) => {}
        }
        Ok(())
    }
}

fn check_key(key: KeyCode) -> Result<(), StepError> {
    if key.is_valid() {
        Ok(())
    } else {
        Err(StepError::UnknownKey)
    }
}

/// Emit the single HID event for a simple action
///
/// Sensitivity scales the event's magnitude, never the number of events.
fn emit_simple<S: HidSink>(action: SimpleAction, sensitivity: &Sensitivity, sink: &mut S) {
    let m = action.axis().map(|axis| sensitivity.for_axis(axis)).unwrap_or(1);
    let delta = m.min(i8::MAX as u8) as i8;

    let event = match action {
        SimpleAction::Nothing => return,
        SimpleAction::VolumeUp => HidEvent::VolumeUp(m),
        SimpleAction::VolumeDown => HidEvent::VolumeDown(m),
        SimpleAction::Mute => HidEvent::Mute,
        SimpleAction::PlayPause => HidEvent::Media(MediaKey::PlayPause),
        SimpleAction::NextTrack => HidEvent::Media(MediaKey::NextTrack),
        SimpleAction::PrevTrack => HidEvent::Media(MediaKey::PrevTrack),
        SimpleAction::ArrowUp => HidEvent::KeyTap {
            key: KeyCode::UP,
            count: m,
        },
        SimpleAction::ArrowDown => HidEvent::KeyTap {
            key: KeyCode::DOWN,
            count: m,
        },
        SimpleAction::ScrollUp => HidEvent::ScrollVertical(delta),
        SimpleAction::ScrollDown => HidEvent::ScrollVertical(-delta),
        SimpleAction::ScrollLeft => HidEvent::ScrollHorizontal(-delta),
        SimpleAction::ScrollRight => HidEvent::ScrollHorizontal(delta),
        SimpleAction::MouseLeft => HidEvent::MouseMove { dx: -delta, dy: 0 },
        SimpleAction::MouseRight => HidEvent::MouseMove { dx: delta, dy: 0 },
        SimpleAction::MouseUp => HidEvent::MouseMove { dx: 0, dy: -delta },
        SimpleAction::MouseDown => HidEvent::MouseMove { dx: 0, dy: delta },
        SimpleAction::MouseClick(button) => HidEvent::MouseClick(button),
        SimpleAction::Undo => HidEvent::Chord {
            modifiers: KeyCode::LEFT_CTRL.modifier_bit(),
            key: KeyCode::Z,
        },
        SimpleAction::Redo => HidEvent::Chord {
            modifiers: KeyCode::LEFT_CTRL.modifier_bit(),
            key: KeyCode::Y,
        },
    };

    trace!("simple {:?} -> {:?}", action, event);
    sink.emit(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::hid::RecordingSink;

    type Sink = RecordingSink<32>;

    fn sens(volume: u8, scroll: u8, mouse: u8) -> Sensitivity {
        Sensitivity {
            volume,
            scroll,
            mouse,
        }
    }

    #[test]
    fn test_scroll_scaled_to_single_event() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        for m in 1..=10u8 {
            d.dispatch(
                &Action::Simple(SimpleAction::ScrollUp),
                &sens(1, m, 1),
                0,
                &mut sink,
            );
            assert_eq!(sink.take().as_slice(), &[HidEvent::ScrollVertical(m as i8)]);
        }
    }

    #[test]
    fn test_arrow_taps_scaled_by_scroll() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let s = sens(2, 3, 4);
        d.dispatch(&Action::Simple(SimpleAction::ArrowUp), &s, 0, &mut sink);
        d.dispatch(&Action::Simple(SimpleAction::ArrowDown), &s, 0, &mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[
                HidEvent::KeyTap {
                    key: KeyCode::UP,
                    count: 3
                },
                HidEvent::KeyTap {
                    key: KeyCode::DOWN,
                    count: 3
                },
            ]
        );
        assert!(d.held_keys().is_empty());
    }

    #[test]
    fn test_axis_selects_multiplier() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let s = sens(3, 5, 7);
        d.dispatch(&Action::Simple(SimpleAction::VolumeDown), &s, 0, &mut sink);
        d.dispatch(&Action::Simple(SimpleAction::ScrollLeft), &s, 0, &mut sink);
        d.dispatch(&Action::Simple(SimpleAction::MouseUp), &s, 0, &mut sink);
        d.dispatch(&Action::Simple(SimpleAction::Mute), &s, 0, &mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[
                HidEvent::VolumeDown(3),
                HidEvent::ScrollHorizontal(-5),
                HidEvent::MouseMove { dx: 0, dy: -7 },
                HidEvent::Mute,
            ]
        );
    }

    #[test]
    fn test_nothing_emits_nothing() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let status = d.dispatch(&Action::nothing(), &Sensitivity::default(), 0, &mut sink);
        assert_eq!(status, DispatchStatus::Done);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_macro_order_and_wait() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::KeyPress(KeyCode::A),
            Step::Wait(50),
            Step::KeyTap(KeyCode::B),
            Step::ReleaseAll,
        ]);

        let status = d.dispatch(&action, &Sensitivity::default(), 1000, &mut sink);
        assert_eq!(status, DispatchStatus::Waiting);
        assert_eq!(sink.take().as_slice(), &[HidEvent::KeyPress(KeyCode::A)]);

        assert_eq!(d.poll(1049, &mut sink), DispatchStatus::Waiting);
        assert!(sink.events.is_empty());

        assert_eq!(d.poll(1050, &mut sink), DispatchStatus::Done);
        assert_eq!(
            sink.take().as_slice(),
            &[
                HidEvent::KeyPress(KeyCode::B),
                HidEvent::KeyRelease(KeyCode::B),
                HidEvent::KeyRelease(KeyCode::A),
            ]
        );
        assert!(!d.is_busy());
        assert!(d.held_keys().is_empty());
    }

    #[test]
    fn test_consecutive_waits_do_not_drift() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::Wait(100),
            Step::KeyTap(KeyCode::A),
            Step::Wait(100),
            Step::KeyTap(KeyCode::B),
        ]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        // Polled late: the second wait still ends at 200
        d.poll(130, &mut sink);
        assert_eq!(d.resume_at(), Some(200));
        assert_eq!(d.poll(200, &mut sink), DispatchStatus::Done);
        assert_eq!(sink.events.len(), 4);
    }

    #[test]
    fn test_abort_releases_held_keys() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::KeyPress(KeyCode::LEFT_CTRL),
            Step::KeyPress(KeyCode::LEFT_SHIFT),
            Step::Wait(500),
            Step::KeyTap(KeyCode::A),
        ]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        sink.take();

        d.abort(&mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[
                HidEvent::KeyRelease(KeyCode::LEFT_SHIFT),
                HidEvent::KeyRelease(KeyCode::LEFT_CTRL),
            ]
        );
        assert!(!d.is_busy());
        assert!(d.held_keys().is_empty());
    }

    #[test]
    fn test_dispatch_while_busy_aborts_first() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[Step::KeyPress(KeyCode::A), Step::Wait(500)]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        d.dispatch(
            &Action::Simple(SimpleAction::Mute),
            &Sensitivity::default(),
            10,
            &mut sink,
        );
        assert_eq!(
            sink.events.as_slice(),
            &[
                HidEvent::KeyPress(KeyCode::A),
                HidEvent::KeyRelease(KeyCode::A),
                HidEvent::Mute,
            ]
        );
    }

    #[test]
    fn test_bad_steps_are_skipped() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::KeyPress(KeyCode(0xF0)),
            Step::Wait(MAX_WAIT_MS + 1),
            Step::KeyRelease(KeyCode::B),
            Step::KeyTap(KeyCode::C),
        ]);
        let status = d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        assert_eq!(status, DispatchStatus::Done);
        assert_eq!(
            sink.events.as_slice(),
            &[HidEvent::KeyPress(KeyCode::C), HidEvent::KeyRelease(KeyCode::C)]
        );
    }

    #[test]
    fn test_keys_left_held_are_released_at_end() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::KeyPress(KeyCode::LEFT_CTRL),
            Step::KeyTap(KeyCode::C),
        ]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        assert_eq!(
            sink.events.last(),
            Some(&HidEvent::KeyRelease(KeyCode::LEFT_CTRL))
        );
        assert!(d.held_keys().is_empty());
    }

    #[test]
    fn test_held_key_capacity() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let mut steps: std::vec::Vec<Step> = (0..9u8)
            .map(|i| Step::KeyPress(KeyCode(KeyCode::A.0 + i)))
            .collect();
        steps.push(Step::Wait(10));
        d.dispatch(&Action::from_steps(&steps), &Sensitivity::default(), 0, &mut sink);
        assert_eq!(d.held_keys().len(), MAX_HELD_KEYS);
        assert_eq!(sink.events.len(), MAX_HELD_KEYS);
    }

    #[test]
    fn test_mouse_buttons_released_on_abort() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::MouseButton {
                button: MouseButton::Left,
                pressed: true,
            },
            Step::MouseMove { dx: 10, dy: -3 },
            Step::Wait(200),
        ]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        d.abort(&mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[
                HidEvent::MouseButton {
                    button: MouseButton::Left,
                    pressed: true
                },
                HidEvent::MouseMove { dx: 10, dy: -3 },
                HidEvent::MouseButton {
                    button: MouseButton::Left,
                    pressed: false
                },
            ]
        );
    }

    #[test]
    fn test_repeated_press_is_idempotent() {
        let mut d = Dispatcher::new();
        let mut sink = Sink::new();
        let action = Action::from_steps(&[
            Step::KeyPress(KeyCode::A),
            Step::KeyPress(KeyCode::A),
            Step::KeyRelease(KeyCode::A),
        ]);
        d.dispatch(&action, &Sensitivity::default(), 0, &mut sink);
        assert_eq!(
            sink.events.as_slice(),
            &[HidEvent::KeyPress(KeyCode::A), HidEvent::KeyRelease(KeyCode::A)]
        );
    }
}
