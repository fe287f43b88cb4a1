//! Multiknob - Rotary Encoder Macro Knob Firmware
//!
//! Main firmware binary for RP2040-based knobs: one quadrature encoder
//! with a push switch, three profiles, USB HID output.
//!
//! Pin assignments (encoder lines are open contacts with internal pull-ups):
//!
//! | Line      | GPIO |
//! |-----------|------|
//! | A (CLK)   | 13   |
//! | B (DT)    | 14   |
//! | SW        | 15   |

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler as UsbInterruptHandler};
use embedded_alloc::LlffHeap as Heap;
use {defmt_rtt as _, panic_probe as _};

use multiknob_hal_rp2040::flash::Rp2040FlashStorage;
use multiknob_hal_rp2040::gpio::encoder_lines;

use crate::config::ConfigPersistence;

// Heap allocator for JSON profile document parsing
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 48KB
const HEAP_SIZE: usize = 48 * 1024;

mod channels;
mod config;
mod tasks;
mod usb;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => UsbInterruptHandler<USB>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Multiknob firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load configuration from flash (or use built-in profiles)
    let flash_storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let mut persistence = ConfigPersistence::new(flash_storage);
    let config = persistence.load_or_default().await;

    // Encoder lines
    let lines = encoder_lines(p.PIN_13, p.PIN_14, p.PIN_15);
    info!("Encoder lines initialized");

    // USB composite device: HID keyboard/mouse/consumer + CDC-ACM
    let driver = Driver::new(p.USB, Irqs);
    let usb = usb::build(driver);
    info!("USB device built");

    // Spawn tasks
    spawner.spawn(tasks::usb_task(usb.device)).unwrap();
    spawner.spawn(tasks::hid_task(usb.hid)).unwrap();
    spawner.spawn(tasks::serial_task(usb.serial)).unwrap();
    spawner.spawn(tasks::persist_task(persistence)).unwrap();
    spawner.spawn(tasks::control_task(lines, config)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
