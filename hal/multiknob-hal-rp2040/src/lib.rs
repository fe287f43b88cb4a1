//! RP2040-specific HAL for the Multiknob firmware
//!
//! Implementations of the shared `multiknob-hal` traits:
//!
//! - Encoder input pins with pull-ups (implements `multiknob_hal::InputPin`)
//! - Flash storage driver (implements `multiknob_hal::FlashStorage`)

#![no_std]

pub mod flash;
pub mod gpio;

// Re-export shared traits from multiknob-hal for convenience
pub use multiknob_hal::{FlashStorage as FlashStorageTrait, StorageKey};
