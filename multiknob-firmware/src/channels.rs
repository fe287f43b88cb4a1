//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use multiknob_core::action::HidEvent;

/// Channel capacity for HID events waiting on the USB writer
pub const HID_CHANNEL_SIZE: usize = 32;

/// HID events from the control loop, in generation order
pub static HID_CHANNEL: Channel<CriticalSectionRawMutex, HidEvent, HID_CHANNEL_SIZE> =
    Channel::new();

/// Active profile to write back to flash (0-based)
///
/// A newer request replaces one that has not been written yet.
pub static PERSIST_REQUEST: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Host has configured the device and is not suspended
///
/// While clear, the control loop drops HID events instead of queueing them.
pub static HID_READY: AtomicBool = AtomicBool::new(false);
