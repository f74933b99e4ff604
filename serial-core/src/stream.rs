//! Timeout-bounded text parsing over any [`ByteSource`].
//!
//! Every operation is built on a single primitive, the *timed read*: poll the
//! source, and if nothing is there, sleep one millisecond and poll again until
//! the configured timeout has elapsed since the poll started.
//!
//! # Matching behaviour
//!
//! [`find`](TimedStream::find) and [`find_until`](TimedStream::find_until) use
//! a single-cursor streaming matcher. On a mismatch the cursor drops back to
//! the start of the pattern and the mismatching byte is *not* re-tested
//! against the first position, so overlapping occurrences can be missed:
//! searching `"ab"` in `"aab"` fails. Callers depend on this exact behaviour;
//! replacing it with a failure-function search is a behavioural change.
//!
//! # Numeric parsing
//!
//! [`parse_int`](TimedStream::parse_int) and
//! [`parse_float`](TimedStream::parse_float) skip non-digit input until a
//! digit arrives and **do not give up on timeout while skipping**: if the
//! source never produces a digit they block forever. The byte that ends a
//! number is kept in a one-byte look-ahead and returned by the next read.

use core::ffi::CStr;

use heapless::Vec;

use crate::clock::Clock;
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::source::ByteSource;

/// A byte source with timed reads, token search, and numeric parsing.
///
/// # Example
///
/// ```ignore
/// let mut stream = TimedStream::new(&mut serial, clock);
/// if stream.find_until(b"TEMP=", b"\n") {
///     let celsius = stream.parse_float();
/// }
/// ```
pub struct TimedStream<S, C> {
    source: S,
    clock: C,
    timeout_ms: u32,
    /// Clock reading when the current timed read began polling.
    poll_start_ms: u64,
    lookahead: Option<u8>,
}

impl<S: ByteSource, C: Clock> TimedStream<S, C> {
    /// Wrap `source` with the default one-second timeout.
    pub fn new(source: S, clock: C) -> Self {
        Self::with_timeout(source, clock, DEFAULT_TIMEOUT_MS)
    }

    /// Wrap `source` with an explicit timeout in milliseconds.
    pub fn with_timeout(source: S, clock: C, timeout_ms: u32) -> Self {
        Self {
            source,
            clock,
            timeout_ms,
            poll_start_ms: 0,
            lookahead: None,
        }
    }

    /// Maximum time to wait for each byte, in milliseconds.
    ///
    /// A timeout of 0 makes every timed read a single immediate poll.
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> u32 {
        self.timeout_ms
    }

    /// Get a reference to the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the wrapped source.
    ///
    /// Reading from it directly bypasses the look-ahead byte.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Decompose the stream into its source and clock.
    ///
    /// A pending look-ahead byte is discarded.
    pub fn into_parts(self) -> (S, C) {
        (self.source, self.clock)
    }

    /// Return the next byte without consuming it, or `None` if nothing is
    /// available right now. Never waits.
    pub fn peek(&mut self) -> Option<u8> {
        if self.lookahead.is_none() {
            self.lookahead = self.source.read();
        }
        self.lookahead
    }

    /// Read one byte, waiting up to the configured timeout for it to arrive.
    pub fn timed_read(&mut self) -> Option<u8> {
        self.poll_start_ms = self.clock.now_ms();
        loop {
            if let Some(byte) = self.next_byte() {
                return Some(byte);
            }

            let elapsed = self.clock.now_ms().saturating_sub(self.poll_start_ms);
            if elapsed >= u64::from(self.timeout_ms) {
                trace!("timed read expired after {} ms", elapsed);
                return None;
            }

            self.clock.delay_ms(1);
        }
    }

    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        self.lookahead.take().or_else(|| self.source.read())
    }

    /// Read until `target` has been seen.
    ///
    /// Returns `false` if a timed read expires first. An empty target matches
    /// immediately. Embedded zero bytes are matched like any other byte.
    pub fn find(&mut self, target: &[u8]) -> bool {
        let mut index = 0;
        while index < target.len() {
            match self.timed_read() {
                Some(byte) if byte == target[index] => index += 1,
                Some(_) => index = 0,
                None => return false,
            }
        }
        true
    }

    /// Read until the byte `target` has been seen.
    pub fn find_byte(&mut self, target: u8) -> bool {
        self.find(&[target])
    }

    /// Read until the NUL-terminated `target` has been seen.
    pub fn find_cstr(&mut self, target: &CStr) -> bool {
        self.find(target.to_bytes())
    }

    /// Read until `target` has been seen, giving up if `terminator` is seen
    /// first or a timed read expires.
    ///
    /// Both patterns are tracked with their own cursor over the same input.
    /// Each byte is tested against `target` first and only tested against
    /// `terminator` if it does not continue `target`; only a byte that
    /// continues neither resets both cursors. A byte that advances one cursor
    /// leaves the other where it was.
    pub fn find_until(&mut self, target: &[u8], terminator: &[u8]) -> bool {
        let mut target_index = 0;
        let mut term_index = 0;

        while target_index < target.len() && term_index < terminator.len() {
            match self.timed_read() {
                Some(byte) if byte == target[target_index] => target_index += 1,
                Some(byte) if byte == terminator[term_index] => term_index += 1,
                Some(_) => {
                    target_index = 0;
                    term_index = 0;
                }
                None => return false,
            }
        }

        target_index == target.len()
    }

    /// [`find_until`](Self::find_until) for NUL-terminated patterns.
    pub fn find_until_cstr(&mut self, target: &CStr, terminator: &CStr) -> bool {
        self.find_until(target.to_bytes(), terminator.to_bytes())
    }

    /// Parse the next unsigned decimal integer.
    ///
    /// Non-digits before the number are discarded, waiting indefinitely for
    /// a digit. Digits are accumulated until a non-digit arrives or a timed
    /// read expires. There is no sign handling; overflow wraps.
    pub fn parse_int(&mut self) -> i32 {
        self.parse_integer(None)
    }

    /// Like [`parse_int`](Self::parse_int), but `skip` is ignored inside the
    /// number, e.g. `b','` to read `1,234` as 1234.
    pub fn parse_int_skipping(&mut self, skip: u8) -> i32 {
        self.parse_integer(Some(skip))
    }

    /// Parse the next unsigned decimal number with an optional fraction.
    ///
    /// Same skipping and termination rules as [`parse_int`](Self::parse_int).
    /// A `.` directly after the integer digits starts the fraction. There is
    /// no sign or exponent handling.
    pub fn parse_float(&mut self) -> f32 {
        self.parse_decimal(None)
    }

    /// Like [`parse_float`](Self::parse_float), but `skip` is ignored inside
    /// the number.
    pub fn parse_float_skipping(&mut self, skip: u8) -> f32 {
        self.parse_decimal(Some(skip))
    }

    fn parse_integer(&mut self, skip: Option<u8>) -> i32 {
        let mut value = i32::from(self.skip_to_digit() - b'0');
        while let Some(digit) = self.next_digit(skip) {
            value = value.wrapping_mul(10).wrapping_add(i32::from(digit));
        }
        value
    }

    fn parse_decimal(&mut self, skip: Option<u8>) -> f32 {
        let mut whole = f32::from(self.skip_to_digit() - b'0');
        while let Some(digit) = self.next_digit(skip) {
            whole = whole * 10.0 + f32::from(digit);
        }

        if self.lookahead != Some(b'.') {
            return whole;
        }
        self.lookahead = None;

        let mut fraction = 0.0f32;
        let mut place = 1.0f32;
        while let Some(digit) = self.next_digit(skip) {
            place /= 10.0;
            fraction += place * f32::from(digit);
        }
        whole + fraction
    }

    /// Discard input until a digit arrives. Timeouts do not end the wait.
    fn skip_to_digit(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.timed_read() {
                if byte.is_ascii_digit() {
                    return byte;
                }
            }
        }
    }

    /// Value of the next digit of a number in progress.
    ///
    /// A non-digit other than `skip` ends the number and is parked in the
    /// look-ahead slot.
    fn next_digit(&mut self, skip: Option<u8>) -> Option<u8> {
        loop {
            let byte = self.timed_read()?;
            if byte.is_ascii_digit() {
                return Some(byte - b'0');
            }
            if Some(byte) != skip {
                self.lookahead = Some(byte);
                return None;
            }
        }
    }

    /// Fill `buffer` with timed reads.
    ///
    /// Stops when the buffer is full or a timed read expires. Returns the
    /// number of bytes written; 0 means nothing arrived in time.
    pub fn read_bytes(&mut self, buffer: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.timed_read() {
                Some(byte) => *slot = byte,
                None => break,
            }
            count += 1;
        }
        count
    }

    /// Fill `buffer` with timed reads, stopping early at `terminator`.
    ///
    /// The terminator is consumed but not stored. Returns the number of bytes
    /// written.
    pub fn read_bytes_until(&mut self, terminator: u8, buffer: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.timed_read() {
                Some(byte) if byte != terminator => *slot = byte,
                _ => break,
            }
            count += 1;
        }
        count
    }

    /// Collect bytes up to `terminator` into a fixed-capacity vector.
    ///
    /// Same stopping rules as [`read_bytes_until`](Self::read_bytes_until),
    /// with the vector capacity as the length limit.
    pub fn read_until<const N: usize>(&mut self, terminator: u8) -> Vec<u8, N> {
        let mut line = Vec::new();
        while !line.is_full() {
            match self.timed_read() {
                Some(byte) if byte != terminator => {
                    // Capacity was checked above.
                    let _ = line.push(byte);
                }
                _ => break,
            }
        }
        line
    }
}

impl<S: ByteSource, C: Clock> ByteSource for TimedStream<S, C> {
    fn available(&mut self) -> usize {
        usize::from(self.lookahead.is_some()) + self.source.available()
    }

    fn read(&mut self) -> Option<u8> {
        self.next_byte()
    }
}
