//! Actions and their execution
//!
//! Action types, key codes, HID output events, and the dispatcher that
//! runs simple actions and macros against an output sink.

pub mod dispatcher;
pub mod hid;
pub mod keycode;
pub mod types;

pub use dispatcher::{DispatchStatus, Dispatcher, HeldKeys, StepError, MAX_HELD_KEYS};
pub use hid::{HidEvent, HidSink, RecordingSink};
pub use keycode::KeyCode;
pub use types::{
    Action, Axis, Macro, MediaKey, MouseButton, ProfileControl, SimpleAction, Step,
    MAX_MACRO_STEPS, MAX_WAIT_MS,
};
