//! Side-channel task
//!
//! Reads line commands from the CDC-ACM serial port. A packet shorter
//! than the endpoint size ends a burst, which also ends a pending line.

use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_time::Timer;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;

use multiknob_protocol::{CommandParser, ControlCommand};

use crate::usb::{UsbDriver, SERIAL_PACKET_SIZE};

#[embassy_executor::task]
pub async fn serial_task(mut class: CdcAcmClass<'static, UsbDriver>) {
    info!("Serial task started");

    let mut parser = CommandParser::new();
    let mut buf = [0u8; SERIAL_PACKET_SIZE as usize];

    loop {
        class.wait_connection().await;
        info!("Serial connected");
        parser.reset();

        loop {
            let n = match class.read_packet(&mut buf).await {
                Ok(n) => n,
                Err(EndpointError::Disabled) => break,
                Err(e) => {
                    warn!("Serial read error: {:?}", e);
                    continue;
                }
            };
            trace!("Serial RX: {} bytes", n);

            for &byte in &buf[..n] {
                match parser.feed(byte) {
                    Ok(Some(cmd)) => handle_command(cmd).await,
                    Ok(None) => {}
                    Err(e) => warn!("Command rejected: {:?}", e),
                }
            }

            if n < buf.len() {
                if let Some(cmd) = parser.finish() {
                    handle_command(cmd).await;
                }
            }
        }

        info!("Serial disconnected");
    }
}

async fn handle_command(cmd: ControlCommand) {
    match cmd {
        ControlCommand::Reboot => {
            info!("REBOOT requested, restarting");
            // Give RTT a moment to drain
            Timer::after_millis(10).await;
            SCB::sys_reset();
        }
        ControlCommand::Unknown => {
            warn!("Unknown side-channel command ignored");
        }
    }
}
