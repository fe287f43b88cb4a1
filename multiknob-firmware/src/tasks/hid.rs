//! USB HID writer task
//!
//! Drains the HID channel in order and turns each event into reports.
//! The channel is drained even while the host is away, so the control
//! loop never waits on an absent host.

use defmt::*;
use portable_atomic::Ordering;

use multiknob_protocol::{Admission, HostLink, Reports};

use crate::channels::{HID_CHANNEL, HID_READY};
use crate::usb::HidWriters;

#[embassy_executor::task]
pub async fn hid_task(mut writers: HidWriters) {
    info!("HID task started");

    let mut link = HostLink::new();

    loop {
        let event = HID_CHANNEL.receive().await;

        match link.admit(HID_READY.load(Ordering::Relaxed)) {
            Admission::Discard => {
                trace!("HID event {:?} discarded, host away", event);
                continue;
            }
            Admission::Reconnect(releases) => {
                info!("USB host ready, releasing all keys");
                send(&mut writers, releases).await;
            }
            Admission::Send => {}
        }

        trace!("HID event {:?}", event);
        send(&mut writers, link.encode(event)).await;
    }
}

async fn send(writers: &mut HidWriters, reports: Reports) {
    for report in reports {
        if let Err(e) = writers.write(&report).await {
            warn!("HID write failed: {:?}", e);
        }
    }
}
