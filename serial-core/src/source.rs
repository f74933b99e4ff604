//! The byte-source capability the parsing engine is written against.

/// A non-blocking source of raw bytes.
///
/// This trait abstracts where bytes come from (UART, ring buffer, file,
/// socket) so that [`TimedStream`](crate::TimedStream) can implement search
/// and parsing once for all of them.
///
/// Implementations must never block for longer than a short hardware-level
/// wait (on the order of a millisecond).
pub trait ByteSource {
    /// Number of bytes that can be read right now without waiting.
    fn available(&mut self) -> usize;

    /// Remove and return the oldest available byte, or `None` if nothing
    /// arrived.
    fn read(&mut self) -> Option<u8>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn available(&mut self) -> usize {
        (**self).available()
    }

    #[inline]
    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }
}

/// A fixed in-memory slice, consumed front to back.
impl<'a> ByteSource for &'a [u8] {
    #[inline]
    fn available(&mut self) -> usize {
        self.len()
    }

    fn read(&mut self) -> Option<u8> {
        let remaining: &'a [u8] = *self;
        let (&first, rest) = remaining.split_first()?;
        *self = rest;
        Some(first)
    }
}

impl<const N: usize> ByteSource for crate::ring::RingBuffer<N> {
    #[inline]
    fn available(&mut self) -> usize {
        self.len()
    }

    #[inline]
    fn read(&mut self) -> Option<u8> {
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source_drains_in_order() {
        let mut src: &[u8] = b"ab";
        assert_eq!(src.available(), 2);
        assert_eq!(src.read(), Some(b'a'));
        assert_eq!(src.available(), 1);
        assert_eq!(src.read(), Some(b'b'));
        assert_eq!(src.read(), None);
        assert_eq!(src.available(), 0);
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut ring = crate::ring::RingBuffer::<4>::new();
        ring.push(7);
        let mut by_ref = &mut ring;
        assert_eq!(ByteSource::available(&mut by_ref), 1);
        assert_eq!(ByteSource::read(&mut by_ref), Some(7));
        assert_eq!(ring.len(), 0);
    }
}
