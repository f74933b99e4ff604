//! Fixed-capacity receive ring.
//!
//! [`RingBuffer`] is the plain circular queue. [`SharedRing`] wraps it in a
//! critical-section mutex so that an interrupt-context producer (the UART
//! receive interrupt or DMA completion handler) and the foreground consumer
//! can share one `static` instance.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Circular byte queue of capacity `N`.
///
/// Writing into a full ring overwrites the oldest unread byte; the length
/// never exceeds `N`.
pub struct RingBuffer<const N: usize> {
    buffer: [u8; N],
    /// Index of the oldest unread byte.
    start: usize,
    /// Index the next byte will be written to.
    end: usize,
    len: usize,
    overruns: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty ring.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            start: 0,
            end: 0,
            len: 0,
            overruns: 0,
        }
    }

    /// Total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Number of unread bytes lost to overwrites since the last [`clear`](Self::clear).
    #[inline]
    #[must_use]
    pub fn overrun_count(&self) -> usize {
        self.overruns
    }

    /// Append a byte.
    ///
    /// Returns `false` if the ring was full and the oldest unread byte was
    /// overwritten to make room.
    pub fn push(&mut self, byte: u8) -> bool {
        if N == 0 {
            self.overruns = self.overruns.wrapping_add(1);
            return false;
        }

        self.buffer[self.end] = byte;
        self.end = (self.end + 1) % N;

        if self.len == N {
            // The write landed on the oldest byte; drop it.
            self.start = (self.start + 1) % N;
            self.overruns = self.overruns.wrapping_add(1);
            false
        } else {
            self.len += 1;
            true
        }
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }

        let byte = self.buffer[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    /// Return the oldest byte without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        if self.len == 0 {
            None
        } else {
            Some(self.buffer[self.start])
        }
    }

    /// Discard all unread bytes and reset the indices and overrun counter.
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
        self.len = 0;
        self.overruns = 0;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`RingBuffer`] shared between an interrupt-context producer and a
/// foreground consumer.
///
/// Every access runs inside a critical section, so index updates are never
/// observed half-done regardless of the target's atomic width. Intended to
/// live in a `static`:
///
/// ```
/// use serial_core::SharedRing;
///
/// static RX_RING: SharedRing<256> = SharedRing::new();
/// ```
pub struct SharedRing<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RingBuffer<N>>>,
}

impl<const N: usize> SharedRing<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Producer side: append one received byte.
    ///
    /// Returns `false` when an unread byte was overwritten.
    pub fn push(&self, byte: u8) -> bool {
        self.inner.lock(|ring| ring.borrow_mut().push(byte))
    }

    /// Producer side: append a block of received bytes (e.g. one DMA
    /// half-transfer). Returns the number of unread bytes overwritten.
    pub fn push_slice(&self, bytes: &[u8]) -> usize {
        self.inner.lock(|ring| {
            let mut ring = ring.borrow_mut();
            bytes.iter().filter(|&&b| !ring.push(b)).count()
        })
    }

    /// Consumer side: remove the oldest byte.
    pub fn pop(&self) -> Option<u8> {
        self.inner.lock(|ring| ring.borrow_mut().pop())
    }

    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.inner.lock(|ring| ring.borrow().peek())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn overrun_count(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().overrun_count())
    }

    pub fn clear(&self) {
        self.inner.lock(|ring| ring.borrow_mut().clear());
    }
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
