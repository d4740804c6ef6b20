//! Capacity-checked receive buffer
//!
//! Accumulates the bytes of one incoming frame across many socket reads.
//! Bounds checking lives here: [`RecvBuffer::slot`] refuses to hand out a
//! write region that would run past the buffer's capacity or wrap the
//! length arithmetic, so the read loop cannot write out of bounds no matter
//! what byte counts the parser asks for.

use bytes::BytesMut;

use crate::error::RecvError;

/// Fixed-capacity accumulation buffer for a single receive operation
pub(crate) struct RecvBuffer {
    buf: BytesMut,
    len: usize,
}

impl RecvBuffer {
    /// Empty buffer with room for `capacity` bytes
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::zeroed(capacity),
            len: 0,
        }
    }

    /// Bytes accumulated so far
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes accumulated so far
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Writable region for the next `needed` bytes.
    ///
    /// Fails if `len + needed` overflows or exceeds the capacity; nothing is
    /// written in that case.
    pub(crate) fn slot(&mut self, needed: usize) -> Result<&mut [u8], RecvError> {
        let end = self
            .len
            .checked_add(needed)
            .filter(|end| *end <= self.buf.len())
            .ok_or(RecvError::BufferExceeded {
                len: self.len,
                needed,
                capacity: self.buf.len(),
            })?;
        Ok(&mut self.buf[self.len..end])
    }

    /// Mark `n` bytes of the last slot as filled
    pub(crate) fn commit(&mut self, n: usize) -> Result<(), RecvError> {
        self.len = self
            .len
            .checked_add(n)
            .filter(|len| *len <= self.buf.len())
            .ok_or(RecvError::BufferExceeded {
                len: self.len,
                needed: n,
                capacity: self.buf.len(),
            })?;
        Ok(())
    }
}
