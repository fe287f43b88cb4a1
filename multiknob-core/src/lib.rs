//! Board-agnostic core logic for the Multiknob firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Signal conditioning (debounce + quadrature decoding)
//! - Gesture classifier state machine
//! - Profile and shift-layer resolution
//! - Action dispatcher and macro engine
//! - Configuration type definitions and the built-in default profiles
//! - The `Knob` control-loop context tying it all together
//!
//! Everything here is driven by explicit `now_ms` timestamps supplied by
//! the caller, so the whole pipeline runs on the host with synthetic
//! pin samples and no hardware.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "json")]
extern crate alloc;

#[macro_use]
mod log;

pub mod action;
pub mod config;
pub mod engine;
pub mod gesture;
pub mod input;
#[cfg(feature = "json")]
pub mod json;
pub mod profile;
pub mod time;

pub use engine::{Knob, StepOutcome};
