//! UART1 binding for the serial core.
//!
//! Reception is split from transmission: [`pump_rx`] owns the receiver and
//! runs on an interrupt-priority executor, handing each byte to the
//! [`RxLink`]. The foreground [`RpUart`] owns the transmitter and talks to the
//! link to arm, disarm, or poll reception.
//!
//! # Pins
//!
//! Uses UART1:
//! - GPIO 8: TX
//! - GPIO 9: RX

use defmt::{trace, warn};
use embassy_rp::uart::{Async, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{block_for, Duration, Instant};
use portable_atomic::{AtomicBool, Ordering};
use serial_core::{SharedRing, TransmitError, UartPeripheral, SERIAL_BUFFER_SIZE};

/// Receive ring used by the firmware.
pub type RxRing = SharedRing<SERIAL_BUFFER_SIZE>;

/// Depth of the RP2040 UART transmit FIFO.
const TX_FIFO_DEPTH: usize = 32;

/// Spin interval while waiting for a byte in blocking mode.
const RX_SPIN: Duration = Duration::from_micros(20);

/// Receive-side state shared between [`pump_rx`] and [`RpUart`].
///
/// While armed, received bytes go into the ring. While disarmed, only the
/// most recent byte is kept (latest value wins), which is what a single
/// blocking receive would have seen.
pub struct RxLink {
    ring: RxRing,
    armed: AtomicBool,
    latest: Signal<CriticalSectionRawMutex, u8>,
}

impl RxLink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: SharedRing::new(),
            armed: AtomicBool::new(false),
            latest: Signal::new(),
        }
    }

    /// The ring a continuous-mode [`Serial`](serial_core::Serial) drains.
    #[inline]
    pub fn ring(&self) -> &RxRing {
        &self.ring
    }

    /// Hand over one received byte. Called from interrupt context.
    fn deliver(&self, byte: u8) {
        if self.armed.load(Ordering::Acquire) {
            if !self.ring.push(byte) {
                trace!("rx ring overrun, oldest byte dropped");
            }
        } else {
            self.latest.signal(byte);
        }
    }
}

impl Default for RxLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive loop: one DMA transfer per byte, forwarded to `link`.
///
/// Spawn this on an [`InterruptExecutor`](embassy_executor::InterruptExecutor)
/// so it preempts the busy-waiting foreground.
pub async fn pump_rx(mut rx: UartRx<'static, Async>, link: &'static RxLink) -> ! {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => link.deliver(byte[0]),
            Err(e) => warn!("UART rx error: {:?}", e),
        }
    }
}

/// Foreground side of UART1.
pub struct RpUart<'d> {
    tx: UartTx<'d, Async>,
    link: &'static RxLink,
}

impl<'d> RpUart<'d> {
    /// Create the peripheral from the transmit half and the link shared with
    /// [`pump_rx`].
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>, link: &'static RxLink) -> Self {
        Self { tx, link }
    }
}

impl UartPeripheral for RpUart<'_> {
    fn init(&mut self, baud_rate: u32) {
        self.tx.set_baudrate(baud_rate);
    }

    fn receive_byte(&mut self, max_wait_ms: u32) -> Option<u8> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(max_wait_ms));
        loop {
            if let Some(byte) = self.link.latest.try_take() {
                return Some(byte);
            }
            if Instant::now() >= deadline {
                return None;
            }
            block_for(RX_SPIN);
        }
    }

    fn start_continuous_receive(&mut self) {
        // Drop anything a blocking read never picked up.
        self.link.latest.reset();
        self.link.armed.store(true, Ordering::Release);
    }

    fn stop_continuous_receive(&mut self) {
        self.link.armed.store(false, Ordering::Release);
    }

    fn transmit(&mut self, bytes: &[u8], max_wait_ms: u32) -> Result<(), TransmitError> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(max_wait_ms));
        let mut written = 0;

        for chunk in bytes.chunks(TX_FIFO_DEPTH) {
            if Instant::now() > deadline {
                return Err(TransmitError::Timeout { written });
            }
            self.tx.blocking_write(chunk).map_err(|e| {
                warn!("UART tx error: {:?}", e);
                TransmitError::Hardware
            })?;
            written += chunk.len();
        }

        self.tx.blocking_flush().map_err(|_| TransmitError::Hardware)
    }

    fn deinit(&mut self) {
        self.stop_continuous_receive();
    }
}
