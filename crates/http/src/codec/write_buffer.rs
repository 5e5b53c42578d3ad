//! Capacity-bounded staging buffer for the writer.
//!
//! The writer only ever appends a piece when the buffer has room for the
//! whole piece; otherwise it suspends and the owner drains the buffer to the
//! transport before resuming. The buffer itself just enforces the bound.

use bytes::{Bytes, BytesMut};

/// A staging buffer that never grows past its capacity.
#[derive(Debug)]
pub struct WriteBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl WriteBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free bytes left before the bound.
    pub fn room(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// True when a piece of `len` bytes fits in one go.
    pub fn has_room(&self, len: usize) -> bool {
        len <= self.room()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends a piece the caller has checked fits.
    pub fn put(&mut self, piece: &[u8]) {
        debug_assert!(self.has_room(piece.len()));
        self.buf.extend_from_slice(piece);
    }

    /// Drains the staged bytes for the transport.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_room_against_the_bound() {
        let mut buffer = WriteBuffer::with_capacity(8);
        assert!(buffer.has_room(8));
        buffer.put(b"hello");
        assert_eq!(buffer.room(), 3);
        assert!(buffer.has_room(3));
        assert!(!buffer.has_room(4));
    }

    #[test]
    fn take_resets_the_room() {
        let mut buffer = WriteBuffer::with_capacity(4);
        buffer.put(b"abcd");
        assert_eq!(buffer.room(), 0);
        assert_eq!(&buffer.take()[..], b"abcd");
        assert_eq!(buffer.room(), 4);
        assert!(buffer.is_empty());
    }
}
