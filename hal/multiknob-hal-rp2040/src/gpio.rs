//! Encoder input pins
//!
//! The encoder's lines are open contacts to ground, so every input is
//! configured with the internal pull-up and reads high at rest.

use embassy_rp::gpio::{Input, Pin, Pull};
use embassy_rp::Peri;

use multiknob_hal::gpio::{EncoderLines, InputPin};

/// GPIO input with pull-up
pub struct Rp2040InputPin<'d> {
    input: Input<'d>,
}

impl<'d> Rp2040InputPin<'d> {
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            input: Input::new(pin, Pull::Up),
        }
    }
}

impl InputPin for Rp2040InputPin<'_> {
    fn is_high(&self) -> bool {
        self.input.is_high()
    }
}

/// Encoder lines on RP2040 GPIO
pub type Rp2040EncoderLines<'d> =
    EncoderLines<Rp2040InputPin<'d>, Rp2040InputPin<'d>, Rp2040InputPin<'d>>;

/// Configure the three encoder pins
pub fn encoder_lines<'d>(
    a: Peri<'d, impl Pin>,
    b: Peri<'d, impl Pin>,
    switch: Peri<'d, impl Pin>,
) -> Rp2040EncoderLines<'d> {
    EncoderLines::new(
        Rp2040InputPin::new(a),
        Rp2040InputPin::new(b),
        Rp2040InputPin::new(switch),
    )
}
