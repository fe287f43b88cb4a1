//! Multiknob wire protocols
//!
//! Two small protocols sit at the edges of the control loop:
//!
//! - **Side channel**: a line-oriented text protocol on the USB CDC-ACM
//!   serial port. The only recognized command is `REBOOT`.
//! - **HID reports**: translation of discrete [`HidEvent`]s into boot
//!   keyboard, mouse and consumer-control input reports.
//!
//! ```text
//! host ──"REBOOT\n"──▶ CommandParser ──▶ ControlCommand::Reboot
//! HidEvent ──▶ ReportEncoder ──▶ [Report::Keyboard | Mouse | Consumer]...
//! ```
//!
//! [`HidEvent`]: multiknob_core::action::HidEvent

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod report;

pub use command::{CommandError, CommandParser, ControlCommand, MAX_COMMAND_LEN};
pub use report::{
    Admission, ConsumerReport, HostLink, KeyboardReport, MouseReport, Report, ReportEncoder,
    Reports, MAX_REPORTS,
};
