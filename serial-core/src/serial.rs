//! UART-backed byte source.

use crate::config::{SerialConfig, SERIAL_BUFFER_SIZE};
use crate::peripheral::{TransmitError, UartPeripheral};
use crate::ring::SharedRing;
use crate::source::ByteSource;

/// A serial port bound to one UART peripheral.
///
/// Two reception modes are supported:
///
/// - **Blocking** ([`Serial::new`]): every [`read`](ByteSource::read) performs
///   one short hardware receive. [`available`](ByteSource::available) is
///   always 0 because nothing is buffered.
/// - **Continuous** ([`Serial::with_ring`]): after [`begin`](Serial::begin)
///   the peripheral fills a [`SharedRing`] from interrupt context and reads
///   drain it without touching the hardware.
///
/// The port owns its peripheral for its whole life. Dropping it stops
/// reception and de-initialises the hardware.
pub struct Serial<'r, P: UartPeripheral, const N: usize = SERIAL_BUFFER_SIZE> {
    peripheral: P,
    ring: Option<&'r SharedRing<N>>,
    config: SerialConfig,
    baud_rate: u32,
    receiving: bool,
}

impl<'r, P: UartPeripheral, const N: usize> Serial<'r, P, N> {
    /// Create a blocking-mode port, initialising the peripheral at the default
    /// baud rate.
    pub fn new(peripheral: P) -> Self {
        Self::build(peripheral, None, SerialConfig::default())
    }

    /// Create a continuous-receive port draining `ring`.
    ///
    /// The peripheral must already be wired to push into the same ring.
    /// Reception starts on [`begin`](Serial::begin).
    pub fn with_ring(peripheral: P, ring: &'r SharedRing<N>) -> Self {
        Self::build(peripheral, Some(ring), SerialConfig::default())
    }

    /// Create a port with explicit settings.
    pub fn with_config(
        peripheral: P,
        ring: Option<&'r SharedRing<N>>,
        config: SerialConfig,
    ) -> Self {
        Self::build(peripheral, ring, config)
    }

    fn build(mut peripheral: P, ring: Option<&'r SharedRing<N>>, config: SerialConfig) -> Self {
        peripheral.init(config.baud_rate);
        Self {
            peripheral,
            ring,
            config,
            baud_rate: config.baud_rate,
            receiving: false,
        }
    }

    /// Reconfigure the peripheral for `baud_rate` and, in continuous mode,
    /// arm background reception into an emptied ring.
    pub fn begin(&mut self, baud_rate: u32) {
        if self.receiving {
            self.peripheral.stop_continuous_receive();
            self.receiving = false;
        }

        self.peripheral.init(baud_rate);
        self.baud_rate = baud_rate;

        if let Some(ring) = self.ring {
            ring.clear();
            self.peripheral.start_continuous_receive();
            self.receiving = true;
        }
        debug!("serial begin at {} baud, continuous={}", baud_rate, self.receiving);
    }

    /// Halt continuous reception.
    ///
    /// Until the next [`begin`](Serial::begin), the ring is considered stale:
    /// `available` reports 0 and `read` yields nothing.
    pub fn end(&mut self) {
        if self.receiving {
            self.peripheral.stop_continuous_receive();
            self.receiving = false;
            debug!("serial continuous receive stopped");
        }
    }

    /// Transmit `text`, blocking until the hardware has accepted it.
    ///
    /// Returns the number of bytes sent.
    pub fn print(&mut self, text: &str) -> Result<usize, TransmitError> {
        self.write_bytes(text.as_bytes())
    }

    /// Transmit `text` followed by CR LF.
    pub fn println(&mut self, text: &str) -> Result<usize, TransmitError> {
        let sent = self.write_bytes(text.as_bytes())?;
        Ok(sent + self.write_bytes(b"\r\n")?)
    }

    /// Transmit raw bytes, blocking until the hardware has accepted them.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, TransmitError> {
        if bytes.is_empty() {
            return Ok(0);
        }
        self.peripheral
            .transmit(bytes, self.config.tx_max_wait_ms)
            .map(|()| bytes.len())
            .inspect_err(|e| warn!("serial transmit failed: {}", e))
    }

    /// Baud rate last applied to the peripheral.
    #[inline]
    #[must_use]
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Whether continuous reception is currently armed.
    #[inline]
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Bytes lost to ring overruns since the last [`begin`](Serial::begin).
    #[must_use]
    pub fn overrun_count(&self) -> usize {
        self.ring.map_or(0, SharedRing::overrun_count)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Get a reference to the underlying peripheral.
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Get a mutable reference to the underlying peripheral.
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }
}

impl<P: UartPeripheral, const N: usize> ByteSource for Serial<'_, P, N> {
    fn available(&mut self) -> usize {
        match self.ring {
            Some(ring) if self.receiving => ring.len(),
            _ => 0,
        }
    }

    fn read(&mut self) -> Option<u8> {
        match self.ring {
            Some(ring) if self.receiving => ring.pop(),
            Some(_) => None,
            None => self.peripheral.receive_byte(self.config.rx_poll_wait_ms),
        }
    }
}

impl<P: UartPeripheral, const N: usize> Drop for Serial<'_, P, N> {
    fn drop(&mut self) {
        self.end();
        self.peripheral.deinit();
    }
}

impl<P: UartPeripheral, const N: usize> core::fmt::Write for Serial<'_, P, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes())
            .map(|_| ())
            .map_err(|_| core::fmt::Error)
    }
}

#[cfg(feature = "embedded-io")]
impl<P: UartPeripheral, const N: usize> embedded_io::ErrorType for Serial<'_, P, N> {
    type Error = TransmitError;
}

#[cfg(feature = "embedded-io")]
impl<P: UartPeripheral, const N: usize> embedded_io::Write for Serial<'_, P, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // `transmit` only returns once the hardware has taken every byte.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::fmt::Write as _;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Default)]
    struct Log {
        inits: Vec<u32>,
        tx: Vec<u8>,
        armed: bool,
        deinit: bool,
    }

    /// Mock UART: bytes in `fifo` are returned by blocking receives, bytes
    /// passed to `deliver` land in the ring while armed.
    struct MockUart<'r> {
        fifo: VecDeque<u8>,
        ring: Option<&'r SharedRing<8>>,
        log: Rc<RefCell<Log>>,
        fail_tx: bool,
    }

    impl<'r> MockUart<'r> {
        fn new(ring: Option<&'r SharedRing<8>>) -> (Self, Rc<RefCell<Log>>) {
            let log = Rc::new(RefCell::new(Log::default()));
            let uart = Self {
                fifo: VecDeque::new(),
                ring,
                log: log.clone(),
                fail_tx: false,
            };
            (uart, log)
        }

        fn deliver(&self, bytes: &[u8]) {
            if self.log.borrow().armed {
                if let Some(ring) = self.ring {
                    ring.push_slice(bytes);
                }
            }
        }
    }

    impl UartPeripheral for MockUart<'_> {
        fn init(&mut self, baud_rate: u32) {
            self.log.borrow_mut().inits.push(baud_rate);
        }

        fn receive_byte(&mut self, _max_wait_ms: u32) -> Option<u8> {
            self.fifo.pop_front()
        }

        fn start_continuous_receive(&mut self) {
            self.log.borrow_mut().armed = true;
        }

        fn stop_continuous_receive(&mut self) {
            self.log.borrow_mut().armed = false;
        }

        fn transmit(&mut self, bytes: &[u8], _max_wait_ms: u32) -> Result<(), TransmitError> {
            if self.fail_tx {
                return Err(TransmitError::Timeout { written: 0 });
            }
            self.log.borrow_mut().tx.extend_from_slice(bytes);
            Ok(())
        }

        fn deinit(&mut self) {
            self.log.borrow_mut().deinit = true;
        }
    }

    #[test]
    fn test_new_initialises_default_baud() {
        let (uart, log) = MockUart::new(None);
        let serial: Serial<'_, _, 8> = Serial::new(uart);
        assert_eq!(serial.baud_rate(), 9_600);
        assert_eq!(log.borrow().inits, [9_600]);
    }

    #[test]
    fn test_blocking_mode_reads_hardware() {
        let (mut uart, _log) = MockUart::new(None);
        uart.fifo.extend(b"ok");
        let mut serial: Serial<'_, _, 8> = Serial::new(uart);

        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), Some(b'o'));
        assert_eq!(serial.read(), Some(b'k'));
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn test_ring_mode_fifo_after_begin() {
        let ring = SharedRing::<8>::new();
        let (uart, log) = MockUart::new(Some(&ring));
        let mut serial = Serial::with_ring(uart, &ring);

        serial.begin(115_200);
        assert!(serial.is_receiving());
        assert!(log.borrow().armed);
        assert_eq!(log.borrow().inits, [9_600, 115_200]);

        serial.peripheral().deliver(b"abc");
        assert_eq!(serial.available(), 3);
        assert_eq!(serial.read(), Some(b'a'));
        assert_eq!(serial.read(), Some(b'b'));
        assert_eq!(serial.read(), Some(b'c'));
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn test_ring_mode_overrun_is_bounded() {
        let ring = SharedRing::<8>::new();
        let (uart, _log) = MockUart::new(Some(&ring));
        let mut serial = Serial::with_ring(uart, &ring);
        serial.begin(9_600);

        serial.peripheral().deliver(b"0123456789ABCDEF");
        assert_eq!(serial.available(), 8);
        assert_eq!(serial.overrun_count(), 8);
        assert_eq!(serial.read(), Some(b'8'));
    }

    #[test]
    fn test_end_makes_ring_stale() {
        let ring = SharedRing::<8>::new();
        let (uart, log) = MockUart::new(Some(&ring));
        let mut serial = Serial::with_ring(uart, &ring);
        serial.begin(9_600);
        serial.peripheral().deliver(b"xy");

        serial.end();
        assert!(!log.borrow().armed);
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), None);

        // begin discards whatever was left behind
        serial.begin(9_600);
        assert_eq!(serial.available(), 0);
    }

    #[test]
    fn test_ring_mode_before_begin_reads_nothing() {
        let ring = SharedRing::<8>::new();
        ring.push(b'z');
        let (uart, _log) = MockUart::new(Some(&ring));
        let mut serial = Serial::with_ring(uart, &ring);
        assert_eq!(serial.available(), 0);
        assert_eq!(serial.read(), None);
    }

    #[test]
    fn test_print_and_write_macro() {
        let (uart, log) = MockUart::new(None);
        let mut serial: Serial<'_, _, 8> = Serial::new(uart);

        assert_eq!(serial.print("hi "), Ok(3));
        write!(serial, "{}", 42).unwrap();
        assert_eq!(serial.println("!"), Ok(3));
        assert_eq!(serial.print(""), Ok(0));
        assert_eq!(log.borrow().tx, b"hi 42!\r\n");
    }

    #[test]
    fn test_print_propagates_transmit_error() {
        let (mut uart, _log) = MockUart::new(None);
        uart.fail_tx = true;
        let mut serial: Serial<'_, _, 8> = Serial::new(uart);
        assert_eq!(
            serial.print("lost"),
            Err(TransmitError::Timeout { written: 0 })
        );
    }

    #[test]
    fn test_drop_stops_and_deinitialises() {
        let ring = SharedRing::<8>::new();
        let (uart, log) = MockUart::new(Some(&ring));
        {
            let mut serial = Serial::with_ring(uart, &ring);
            serial.begin(9_600);
        }
        assert!(!log.borrow().armed);
        assert!(log.borrow().deinit);
    }
}
