//! GPIO pin abstractions
//!
//! The knob only reads pins: two quadrature lines and the push switch.

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Raw levels of the encoder lines at one instant (`true` = high)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineLevels {
    pub a: bool,
    pub b: bool,
    pub switch: bool,
}

/// The three input lines of a rotary encoder with push switch
pub struct EncoderLines<A, B, S> {
    /// Quadrature line A (CLK)
    pub a: A,
    /// Quadrature line B (DT)
    pub b: B,
    /// Push switch (SW)
    pub switch: S,
}

impl<A: InputPin, B: InputPin, S: InputPin> EncoderLines<A, B, S> {
    pub fn new(a: A, b: B, switch: S) -> Self {
        Self { a, b, switch }
    }

    /// Read all three lines
    pub fn read(&self) -> LineLevels {
        LineLevels {
            a: self.a.is_high(),
            b: self.b.is_high(),
            switch: self.switch.is_high(),
        }
    }
}
