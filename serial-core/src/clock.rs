//! Monotonic time collaborator used for timed reads.

use embedded_hal::delay::DelayNs;

/// A monotonic millisecond clock that can also block the caller.
///
/// The blocking half comes from [`DelayNs`]; the retry loop calls
/// `delay_ms(1)` between polls and checks [`now_ms`](Clock::now_ms) against
/// its deadline, so the tick length does not affect correctness.
pub trait Clock: DelayNs {
    /// Milliseconds since an arbitrary fixed point. Never decreases.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    #[inline]
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
