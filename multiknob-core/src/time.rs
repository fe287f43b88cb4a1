//! Millisecond timestamps
//!
//! The control loop hands every component a `u32` millisecond counter
//! measured from boot. It wraps after ~49 days, so all interval math goes
//! through [`elapsed_ms`].

/// Monotonic milliseconds since boot
pub type Millis = u32;

/// Milliseconds elapsed from `since` to `now`, tolerant of counter wrap
#[inline]
pub fn elapsed_ms(now: Millis, since: Millis) -> u32 {
    now.wrapping_sub(since)
}

/// True once `now` has reached `deadline`
///
/// Deadlines are only ever set less than half the counter range ahead, so
/// the signed difference tells us which side of the deadline we're on.
#[inline]
pub fn deadline_reached(now: Millis, deadline: Millis) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}
