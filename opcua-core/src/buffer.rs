//! Byte Buffer (spec §3, §4.1).
//!
//! A bounded, position/length-carrying byte container with a read/write
//! cursor. Grounded on the teacher's `Chunk` (`t51core::networking::chunk`):
//! same start/end-cursor-over-a-fixed-array shape, generalized to the
//! spec's `position`/`length`/`maxSize` vocabulary and its fallible (not
//! panicking) contract for wire-facing operations.

use crate::error::{CoreError, Result};

/// `0 <= position <= length <= max_size` is maintained as an invariant by
/// every method below; see the `#[cfg(test)]` module for the property
/// tests exercising it (spec §8).
pub struct ByteBuffer {
    data: Box<[u8]>,
    max_size: usize,
    length: usize,
    position: usize,
    /// Set when this buffer wraps externally-owned bytes via `attach`;
    /// release semantics are otherwise identical (we always own the
    /// `Box<[u8]>`, so this is purely informational bookkeeping matching
    /// the spec's note that attach "owns the release").
    attached: bool,
}

impl ByteBuffer {
    pub fn create(size: usize) -> Result<ByteBuffer> {
        if size == 0 {
            return Err(CoreError::InvalidParameter);
        }
        Ok(ByteBuffer {
            data: vec![0u8; size].into_boxed_slice(),
            max_size: size,
            length: 0,
            position: 0,
            attached: false,
        })
    }

    /// Equivalent to `create`, kept distinct to mirror the source API
    /// (`initInPlace` reinitializes a buffer that already has a backing
    /// allocation — here that degenerates to a fresh allocation).
    pub fn init_in_place(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(CoreError::InvalidParameter);
        }
        self.data = vec![0u8; size].into_boxed_slice();
        self.max_size = size;
        self.length = 0;
        self.position = 0;
        self.attached = false;
        Ok(())
    }

    /// Take ownership of `existing`, up to `size` bytes used as data.
    pub fn attach(existing: Vec<u8>, size: usize) -> Result<ByteBuffer> {
        if size > existing.len() {
            return Err(CoreError::InvalidParameter);
        }
        let max_size = existing.len();
        Ok(ByteBuffer {
            data: existing.into_boxed_slice(),
            max_size,
            length: size,
            position: 0,
            attached: true,
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Zero the whole buffer and reset length/position to 0.
    pub fn reset(&mut self) {
        for b in self.data.iter_mut() {
            *b = 0;
        }
        self.length = 0;
        self.position = 0;
    }

    /// Zero bytes at and after `p`, and set both cursors to `p`.
    pub fn reset_after_position(&mut self, p: usize) -> Result<()> {
        if p > self.length {
            return Err(CoreError::InvalidParameter);
        }
        for b in self.data[p..self.length].iter_mut() {
            *b = 0;
        }
        self.length = p;
        self.position = p;
        Ok(())
    }

    pub fn set_position(&mut self, p: usize) -> Result<()> {
        if p > self.length {
            return Err(CoreError::InvalidParameter);
        }
        self.position = p;
        Ok(())
    }

    /// Set the valid-data length. Shrinking zeroes the bytes that fall out
    /// of range; growing never writes past what was already there.
    pub fn set_data_length(&mut self, l: usize) -> Result<()> {
        if l < self.position || l > self.max_size {
            return Err(CoreError::InvalidParameter);
        }
        if l < self.length {
            for b in self.data[l..self.length].iter_mut() {
                *b = 0;
            }
        }
        self.length = l;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.length - self.position
    }

    /// Write `src` at the current position, advancing it and raising
    /// `length` if the write extends past it. Fails rather than wrapping
    /// past `max_size`.
    pub fn write(&mut self, src: &[u8]) -> Result<()> {
        let n = src.len();
        if self.position + n > self.max_size {
            return Err(CoreError::InvalidParameter);
        }
        self.data[self.position..self.position + n].copy_from_slice(src);
        self.position += n;
        if self.position > self.length {
            self.length = self.position;
        }
        Ok(())
    }

    /// Read `dst.len()` bytes from the current position, advancing it.
    /// Fails if that would read past `length`.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<()> {
        let n = dst.len();
        if self.position + n > self.length {
            return Err(CoreError::InvalidParameter);
        }
        dst.copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(())
    }

    /// A slice view of the still-unread bytes, without advancing position.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.position..self.length]
    }

    /// A mutable slice view of the writable tail, without advancing
    /// position (used by the chunk manager to append raw socket bytes).
    pub fn writable_tail_mut(&mut self, upto: usize) -> &mut [u8] {
        let end = (self.position + upto).min(self.max_size);
        &mut self.data[self.position..end]
    }

    /// Advance position/length as if `n` bytes were just written directly
    /// into the slice returned by `writable_tail_mut`.
    pub fn commit_write(&mut self, n: usize) -> Result<()> {
        if self.position + n > self.max_size {
            return Err(CoreError::InvalidParameter);
        }
        self.position += n;
        if self.position > self.length {
            self.length = self.position;
        }
        Ok(())
    }

    /// Copy the full valid contents of `src` into `dest`, starting at
    /// `dest`'s current position.
    pub fn copy(dest: &mut ByteBuffer, src: &ByteBuffer) -> Result<()> {
        Self::copy_with_length(dest, src, src.length)
    }

    /// Copy up to `n` bytes of `src`'s data (from offset 0) into `dest`.
    /// Preserves `src.position` if it is `<= n`, matching the source's
    /// partial-copy contract: `dest`'s own position is reset to 0 before
    /// the write and then restored to `src.position`, not left wherever
    /// it happened to be before the call.
    pub fn copy_with_length(dest: &mut ByteBuffer, src: &ByteBuffer, n: usize) -> Result<()> {
        if n > src.length {
            return Err(CoreError::InvalidParameter);
        }
        dest.position = 0;
        dest.write(&src.data[..n])?;
        dest.position = src.position.min(n);
        Ok(())
    }

    /// Drain up to `n` bytes from `src`'s remaining data into `dest`'s
    /// tail. Short reads are allowed; returns the number of bytes moved.
    pub fn read_from(dest: &mut ByteBuffer, src: &mut ByteBuffer, n: usize) -> Result<usize> {
        let available = src.remaining().min(n);
        let room = dest.max_size - dest.position;
        let moved = available.min(room);
        if moved == 0 {
            return Ok(0);
        }
        let slice = src.data[src.position..src.position + moved].to_vec();
        dest.write(&slice)?;
        src.position += moved;
        Ok(moved)
    }

    pub fn read_file(path: &std::path::Path) -> Result<ByteBuffer> {
        let bytes = std::fs::read(path).map_err(CoreError::from)?;
        ByteBuffer::attach(bytes.clone(), bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_holds_after_write_and_read() {
        let mut buf = ByteBuffer::create(16).unwrap();
        buf.write(&[1, 2, 3, 4]).unwrap();
        assert!(buf.position() <= buf.len() && buf.len() <= buf.max_size());
        buf.set_position(0).unwrap();
        let mut out = [0u8; 4];
        buf.read(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert!(buf.position() <= buf.len() && buf.len() <= buf.max_size());
    }

    #[test]
    fn write_filling_exact_capacity_is_legal() {
        let mut buf = ByteBuffer::create(4).unwrap();
        assert!(buf.write(&[1, 2, 3, 4]).is_ok());
        assert!(buf.write(&[5]).is_err());
    }

    #[test]
    fn reset_then_read_fails() {
        let mut buf = ByteBuffer::create(8).unwrap();
        buf.write(&[1, 2, 3]).unwrap();
        buf.reset();
        buf.set_position(0).unwrap();
        let mut out = [0u8; 1];
        assert!(buf.read(&mut out).is_err());
    }

    #[test]
    fn reset_after_position_zeroes_tail_and_clamps_cursors() {
        let mut buf = ByteBuffer::create(8).unwrap();
        buf.write(&[1, 2, 3, 4, 5]).unwrap();
        buf.reset_after_position(2).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.position(), 2);
        buf.set_data_length(5).unwrap();
        assert_eq!(&buf.data[2..5], &[0, 0, 0]);
    }

    #[test]
    fn copy_preserves_order() {
        let mut src = ByteBuffer::create(8).unwrap();
        src.write(&[9, 8, 7]).unwrap();
        let mut dest = ByteBuffer::create(8).unwrap();
        ByteBuffer::copy(&mut dest, &src).unwrap();
        assert_eq!(&dest.data[..3], &[9, 8, 7]);
    }

    #[test]
    fn copy_with_length_restores_dest_position_to_match_src() {
        let mut src = ByteBuffer::create(8).unwrap();
        src.write(&[9, 8, 7]).unwrap();
        src.set_position(2).unwrap();

        // dest starts with an unrelated position/content so the copy's
        // reset-then-restore is what makes the assertions below hold,
        // not a pre-existing coincidence.
        let mut dest = ByteBuffer::create(8).unwrap();
        dest.write(&[1, 1, 1, 1]).unwrap();
        dest.set_position(1).unwrap();

        ByteBuffer::copy(&mut dest, &src).unwrap();

        assert_eq!(dest.position(), 2);
        assert_eq!(&dest.data[..3], &[9, 8, 7]);

        let mut out = [0u8; 1];
        dest.read(&mut out).unwrap();
        assert_eq!(out, [7]);
    }

    #[test]
    fn read_from_drains_remaining_into_tail() {
        let mut src = ByteBuffer::create(8).unwrap();
        src.write(&[1, 2, 3, 4]).unwrap();
        src.set_position(1).unwrap(); // remaining = [2,3,4]
        let mut dest = ByteBuffer::create(8).unwrap();
        let moved = ByteBuffer::read_from(&mut dest, &mut src, 10).unwrap();
        assert_eq!(moved, 3);
        dest.set_position(0).unwrap();
        let mut out = [0u8; 3];
        dest.read(&mut out).unwrap();
        assert_eq!(out, [2, 3, 4]);
    }

    #[test]
    fn never_advances_past_max_size() {
        let mut buf = ByteBuffer::create(4).unwrap();
        assert!(buf.set_position(5).is_err());
        assert!(buf.set_data_length(5).is_err());
    }
}
