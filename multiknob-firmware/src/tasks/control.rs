//! Control loop task
//!
//! Polls the encoder lines on a fixed ticker and runs one [`Knob::step`]
//! per tick. HID events go to the writer task in order while the host is
//! ready (dropped otherwise); profile changes go to the persist task.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use multiknob_core::action::RecordingSink;
use multiknob_core::config::KnobConfig;
use multiknob_core::input::PinSample;
use multiknob_core::Knob;
use multiknob_hal_rp2040::gpio::Rp2040EncoderLines;

use crate::channels::{HID_CHANNEL, HID_READY, PERSIST_REQUEST};

/// Poll interval in milliseconds
pub const POLL_INTERVAL_MS: u64 = 2;

/// Events one step may emit before the overflow is dropped
const STEP_EVENT_CAPACITY: usize = 64;

#[embassy_executor::task]
pub async fn control_task(lines: Rp2040EncoderLines<'static>, config: KnobConfig) {
    info!("Control task started");

    let mut knob = Knob::new(config, read_sample(&lines));
    let mut sink = RecordingSink::<STEP_EVENT_CAPACITY>::new();

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let start = Instant::now();

    loop {
        ticker.next().await;

        // Wraps after ~49 days; the core uses wrapping arithmetic
        let now_ms = start.elapsed().as_millis() as u32;

        let outcome = knob.step(read_sample(&lines), now_ms, &mut sink);

        for gesture in &outcome.gestures {
            debug!("Gesture {:?} on profile {}", gesture, knob.active_profile());
        }

        let events = sink.take();
        if HID_READY.load(Ordering::Relaxed) {
            for event in events {
                HID_CHANNEL.send(event).await;
            }
        } else if !events.is_empty() {
            debug!("USB not configured, {} HID events dropped", events.len());
        }

        if let Some(index) = outcome.persist {
            info!("Switched to profile {}", index);
            PERSIST_REQUEST.signal(index);
        }
    }
}

fn read_sample(lines: &Rp2040EncoderLines<'_>) -> PinSample {
    let levels = lines.read();
    PinSample {
        a: levels.a,
        b: levels.b,
        switch: levels.switch,
    }
}
