//! USB device setup
//!
//! One composite device carrying three HID interfaces (boot keyboard,
//! mouse with wheel and pan, consumer control) and a CDC-ACM serial port
//! for the side channel.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State as CdcState};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State as HidState};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config, Handler, UsbDevice};
use portable_atomic::Ordering;
use static_cell::StaticCell;
use usbd_hid::descriptor::{
    KeyboardReport as KeyboardDescriptor, MediaKeyboardReport as ConsumerDescriptor,
    MouseReport as MouseDescriptor, SerializedDescriptor,
};

use multiknob_protocol::Report;

use crate::channels::HID_READY;

/// RP2040 USB driver
pub type UsbDriver = Driver<'static, USB>;

/// Packet size of the serial data endpoints
pub const SERIAL_PACKET_SIZE: u16 = 64;

/// Host poll interval for the HID endpoints
const HID_POLL_MS: u8 = 1;

// pid.codes test VID/PID
const USB_VID: u16 = 0x1209;
const USB_PID: u16 = 0x0001;

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

static KEYBOARD_STATE: StaticCell<HidState> = StaticCell::new();
static MOUSE_STATE: StaticCell<HidState> = StaticCell::new();
static CONSUMER_STATE: StaticCell<HidState> = StaticCell::new();
static SERIAL_STATE: StaticCell<CdcState> = StaticCell::new();
static DEVICE_STATE: StaticCell<DeviceState> = StaticCell::new();

/// Tracks bus state into [`HID_READY`]
#[derive(Default)]
struct DeviceState {
    configured: bool,
    suspended: bool,
}

impl DeviceState {
    fn publish(&self) {
        HID_READY.store(self.configured && !self.suspended, Ordering::Relaxed);
    }
}

impl Handler for DeviceState {
    fn reset(&mut self) {
        defmt::debug!("USB reset");
        self.configured = false;
        self.publish();
    }

    fn configured(&mut self, configured: bool) {
        defmt::info!("USB configured: {}", configured);
        self.configured = configured;
        self.publish();
    }

    fn suspended(&mut self, suspended: bool) {
        defmt::debug!("USB suspended: {}", suspended);
        self.suspended = suspended;
        self.publish();
    }
}

/// HID input endpoints
pub struct HidWriters {
    pub keyboard: HidWriter<'static, UsbDriver, 8>,
    pub mouse: HidWriter<'static, UsbDriver, 8>,
    pub consumer: HidWriter<'static, UsbDriver, 8>,
}

impl HidWriters {
    /// Send one report on the interface it belongs to
    pub async fn write(&mut self, report: &Report) -> Result<(), EndpointError> {
        match report {
            Report::Keyboard(r) => self.keyboard.write(&r.to_bytes()).await,
            Report::Mouse(r) => self.mouse.write(&r.to_bytes()).await,
            Report::Consumer(r) => self.consumer.write(&r.to_bytes()).await,
        }
    }
}

/// Everything built from the USB peripheral
pub struct UsbInterfaces {
    pub device: UsbDevice<'static, UsbDriver>,
    pub hid: HidWriters,
    pub serial: CdcAcmClass<'static, UsbDriver>,
}

/// Build the composite device
///
/// Must be called once; the descriptor buffers are static.
pub fn build(driver: UsbDriver) -> UsbInterfaces {
    let mut config = Config::new(USB_VID, USB_PID);
    config.manufacturer = Some("Multiknob");
    config.product = Some("Multiknob macro knob");
    config.serial_number = Some("MK000001");
    config.max_power = 100;
    config.max_packet_size_0 = 64;

    // Composite device with interface association descriptors (CDC-ACM)
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );

    builder.handler(DEVICE_STATE.init(DeviceState::default()));

    let keyboard = HidWriter::new(
        &mut builder,
        KEYBOARD_STATE.init(HidState::new()),
        hid_config(KeyboardDescriptor::desc()),
    );
    let mouse = HidWriter::new(
        &mut builder,
        MOUSE_STATE.init(HidState::new()),
        hid_config(MouseDescriptor::desc()),
    );
    let consumer = HidWriter::new(
        &mut builder,
        CONSUMER_STATE.init(HidState::new()),
        hid_config(ConsumerDescriptor::desc()),
    );

    let serial = CdcAcmClass::new(
        &mut builder,
        SERIAL_STATE.init(CdcState::new()),
        SERIAL_PACKET_SIZE,
    );

    UsbInterfaces {
        device: builder.build(),
        hid: HidWriters {
            keyboard,
            mouse,
            consumer,
        },
        serial,
    }
}

fn hid_config(report_descriptor: &'static [u8]) -> HidConfig<'static> {
    HidConfig {
        report_descriptor,
        request_handler: None,
        poll_ms: HID_POLL_MS,
        max_packet_size: 8,
    }
}
