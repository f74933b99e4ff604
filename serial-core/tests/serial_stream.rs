//! End-to-end tests: a ring-backed `Serial` port feeding a `TimedStream`.
//!
//! The mock UART stands in for the interrupt-context producer; the simulated
//! clock lets "late" bytes arrive while the stream is polling.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use serial_core::{
    ByteSource, Clock, Serial, SharedRing, TimedStream, TransmitError, UartPeripheral,
};

const RING_SIZE: usize = 32;

/// Shared simulated time plus the bytes scheduled to arrive on the wire.
#[derive(Default)]
struct Wire {
    now_ns: Cell<u64>,
    scheduled: RefCell<VecDeque<(u64, u8)>>,
    armed: Cell<bool>,
    tx: RefCell<Vec<u8>>,
}

impl Wire {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    fn schedule(&self, at_ms: u64, bytes: &[u8]) {
        self.scheduled
            .borrow_mut()
            .extend(bytes.iter().map(|&b| (at_ms, b)));
    }
}

struct SimClock {
    wire: Rc<Wire>,
    ring: &'static SharedRing<RING_SIZE>,
}

impl SimClock {
    /// Move every byte whose arrival time has passed into the ring, the way
    /// the receive interrupt would.
    fn deliver_due(&self) {
        let now = self.wire.now_ms();
        let mut scheduled = self.wire.scheduled.borrow_mut();
        while let Some(&(at, byte)) = scheduled.front() {
            if at > now {
                break;
            }
            scheduled.pop_front();
            if self.wire.armed.get() {
                self.ring.push(byte);
            }
        }
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.wire.now_ns.set(self.wire.now_ns.get() + u64::from(ns));
        self.deliver_due();
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wire
            .now_ns
            .set(self.wire.now_ns.get() + u64::from(ms) * 1_000_000);
        self.deliver_due();
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.wire.now_ms()
    }
}

struct MockUart {
    wire: Rc<Wire>,
}

impl UartPeripheral for MockUart {
    fn init(&mut self, _baud_rate: u32) {}

    fn receive_byte(&mut self, _max_wait_ms: u32) -> Option<u8> {
        None
    }

    fn start_continuous_receive(&mut self) {
        self.wire.armed.set(true);
    }

    fn stop_continuous_receive(&mut self) {
        self.wire.armed.set(false);
    }

    fn transmit(&mut self, bytes: &[u8], _max_wait_ms: u32) -> Result<(), TransmitError> {
        self.wire.tx.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

fn leak_ring() -> &'static SharedRing<RING_SIZE> {
    Box::leak(Box::new(SharedRing::new()))
}

fn setup() -> (Serial<'static, MockUart, RING_SIZE>, SimClock, Rc<Wire>) {
    let wire = Rc::new(Wire::default());
    let ring = leak_ring();
    let mut serial = Serial::with_ring(MockUart { wire: wire.clone() }, ring);
    serial.begin(115_200);
    let clock = SimClock {
        wire: wire.clone(),
        ring,
    };
    (serial, clock, wire)
}

#[test]
fn test_command_response_over_ring() {
    let (mut serial, clock, wire) = setup();
    wire.schedule(0, b"AT+TEMP?\r\n");
    wire.schedule(5, b"+TEMP: 23.75\r\nOK\r\n");
    clock.deliver_due();

    let mut stream = TimedStream::with_timeout(&mut serial, clock, 20);
    assert!(stream.find(b"\r\n"));
    assert!(stream.find_until(b"+TEMP:", b"ERROR"));
    let temp = stream.parse_float();
    assert!((temp - 23.75).abs() < 1e-4, "got {temp}");
    assert!(stream.find(b"OK"));

    let (serial, _clock) = stream.into_parts();
    serial.print("done").unwrap();
    assert_eq!(wire.tx.borrow().as_slice(), b"done");
}

#[test]
fn test_read_bytes_until_with_late_bytes() {
    let (mut serial, clock, wire) = setup();
    wire.schedule(0, b"hel");
    wire.schedule(30, b"lo,world");
    clock.deliver_due();

    let mut stream = TimedStream::with_timeout(&mut serial, clock, 50);
    let mut buf = [0u8; 10];
    assert_eq!(stream.read_bytes_until(b',', &mut buf), 5);
    assert_eq!(&buf[..5], b"hello");
}

#[test]
fn test_overrun_without_consumer_is_bounded() {
    let (mut serial, clock, wire) = setup();
    wire.schedule(0, &[b'x'; 3 * RING_SIZE]);
    clock.deliver_due();

    assert_eq!(serial.available(), RING_SIZE);
    assert_eq!(serial.overrun_count(), 2 * RING_SIZE);

    let mut drained = 0;
    while serial.read().is_some() {
        drained += 1;
    }
    assert_eq!(drained, RING_SIZE);
    assert_eq!(serial.available(), 0);
}

#[test]
fn test_fifo_delivery_below_capacity() {
    let (mut serial, clock, wire) = setup();
    let payload: Vec<u8> = (0..10).collect();
    wire.schedule(0, &payload);
    clock.deliver_due();

    assert_eq!(serial.available(), payload.len());
    for &expected in &payload {
        assert_eq!(serial.read(), Some(expected));
    }
    assert_eq!(serial.available(), 0);
}

#[test]
fn test_bytes_after_end_are_dropped() {
    let (mut serial, clock, wire) = setup();
    serial.end();
    wire.schedule(0, b"ignored");
    clock.deliver_due();

    serial.begin(9_600);
    assert_eq!(serial.available(), 0);

    let mut stream = TimedStream::with_timeout(&mut serial, clock, 10);
    assert!(!stream.find(b"ignored"));
}

#[test]
fn test_parse_int_from_slice_source() {
    struct Still;

    impl DelayNs for Still {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    impl Clock for Still {
        fn now_ms(&self) -> u64 {
            0
        }
    }

    let input: &[u8] = b"abc123xyz";
    let mut stream = TimedStream::with_timeout(input, Still, 0);
    assert_eq!(stream.parse_int(), 123);
    assert_eq!(stream.available(), 3);
    assert_eq!(stream.read(), Some(b'x'));
}
