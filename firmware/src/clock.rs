//! Monotonic clock backed by the embassy time driver.

use embassy_time::{block_for, Duration, Instant};
use embedded_hal::delay::DelayNs;
use serial_core::Clock;

/// Busy-waiting clock for the foreground parser.
///
/// Delays spin on the time driver instead of yielding, so the interrupt
/// executor feeding the receive ring keeps running underneath.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        block_for(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
