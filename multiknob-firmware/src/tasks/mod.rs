//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod control;
pub mod hid;
pub mod persist;
pub mod serial;
pub mod usb;

pub use control::control_task;
pub use hid::hid_task;
pub use persist::persist_task;
pub use serial::serial_task;
pub use usb::usb_task;
