//! Backing storage for encoded items.
//!
//! The codec never owns the buffer. It reads through [`Storage`], grows and shrinks it
//! through [`StorageMut`], and only hands out borrowed payload slices when the buffer is
//! [`Contiguous`]. All positions are byte offsets; a mutation at offset `p` invalidates
//! every offset `>= p` held by the caller.

use core::ops::Range;

#[cfg(feature = "alloc")]
use alloc::collections::VecDeque;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use crate::alloc_util::{try_reserve, try_reserve_deque};
use crate::error::{eof, length_overflow};
use crate::CborError;

/// Random-access, read-only view of an encoded byte sequence.
pub trait Storage {
    /// Number of bytes held.
    fn len(&self) -> usize;

    /// Returns `true` if no bytes are held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `out.len()` bytes starting at `pos` into `out`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if the range runs past the end of the storage.
    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError>;

    /// Read the single byte at `pos`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if `pos` is past the end of the storage.
    fn byte_at(&self, pos: usize) -> Result<u8, CborError> {
        let mut b = [0u8; 1];
        self.read_at(pos, &mut b)?;
        Ok(b[0])
    }
}

/// Storage that can be resized in place.
pub trait StorageMut: Storage {
    /// Insert `bytes` before offset `pos` (`pos == len()` appends).
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if `pos > len()`, or `AllocationFailed` if growing fails.
    fn insert_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError>;

    /// Remove the bytes in `range`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if the range is inverted or runs past the end.
    fn erase(&mut self, range: Range<usize>) -> Result<(), CborError>;

    /// Overwrite `bytes.len()` bytes starting at `pos`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if the range runs past the end.
    fn write_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError>;

    /// Remove every byte.
    fn clear(&mut self);
}

/// Storage whose bytes live in one stably addressed slice.
///
/// Zero-copy accessors (`get_bytes`, `get_string`, `as_encoded`) require this capability.
pub trait Contiguous: Storage {
    /// Borrow the whole byte sequence.
    fn as_slice(&self) -> &[u8];
}

fn checked_range(pos: usize, n: usize, len: usize) -> Result<Range<usize>, CborError> {
    let end = pos.checked_add(n).ok_or_else(|| length_overflow(pos))?;
    if end > len {
        return Err(eof(pos));
    }
    Ok(pos..end)
}

impl Storage for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        let r = checked_range(pos, out.len(), <[u8]>::len(self))?;
        out.copy_from_slice(&self[r]);
        Ok(())
    }
}

impl Contiguous for [u8] {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> Storage for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        Storage::read_at(&self[..], pos, out)
    }
}

impl<const N: usize> Contiguous for [u8; N] {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl<T: Storage + ?Sized> Storage for &T {
    fn len(&self) -> usize {
        T::len(self)
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        T::read_at(self, pos, out)
    }
}

impl<T: Contiguous + ?Sized> Contiguous for &T {
    fn as_slice(&self) -> &[u8] {
        T::as_slice(self)
    }
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn len(&self) -> usize {
        T::len(self)
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        T::read_at(self, pos, out)
    }
}

impl<T: Contiguous + ?Sized> Contiguous for &mut T {
    fn as_slice(&self) -> &[u8] {
        T::as_slice(self)
    }
}

impl<T: StorageMut + ?Sized> StorageMut for &mut T {
    fn insert_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        T::insert_at(self, pos, bytes)
    }

    fn erase(&mut self, range: Range<usize>) -> Result<(), CborError> {
        T::erase(self, range)
    }

    fn write_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        T::write_at(self, pos, bytes)
    }

    fn clear(&mut self) {
        T::clear(self);
    }
}

#[cfg(feature = "alloc")]
impl Storage for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        Storage::read_at(&self[..], pos, out)
    }
}

#[cfg(feature = "alloc")]
impl Contiguous for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

#[cfg(feature = "alloc")]
impl StorageMut for Vec<u8> {
    fn insert_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        if pos > Vec::len(self) {
            return Err(eof(pos));
        }
        try_reserve(self, bytes.len(), pos)?;
        self.splice(pos..pos, bytes.iter().copied());
        Ok(())
    }

    fn erase(&mut self, range: Range<usize>) -> Result<(), CborError> {
        if range.start > range.end || range.end > Vec::len(self) {
            return Err(eof(range.start));
        }
        self.drain(range);
        Ok(())
    }

    fn write_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        let r = checked_range(pos, bytes.len(), Vec::len(self))?;
        self[r].copy_from_slice(bytes);
        Ok(())
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

/// A ring buffer is resizable but not contiguous: zero-copy accessors are unavailable.
#[cfg(feature = "alloc")]
impl Storage for VecDeque<u8> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn read_at(&self, pos: usize, out: &mut [u8]) -> Result<(), CborError> {
        let r = checked_range(pos, out.len(), VecDeque::len(self))?;
        for (dst, src) in out.iter_mut().zip(self.range(r)) {
            *dst = *src;
        }
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl StorageMut for VecDeque<u8> {
    fn insert_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        if pos > VecDeque::len(self) {
            return Err(eof(pos));
        }
        try_reserve_deque(self, bytes.len(), pos)?;
        for (i, &b) in bytes.iter().enumerate() {
            self.insert(pos + i, b);
        }
        Ok(())
    }

    fn erase(&mut self, range: Range<usize>) -> Result<(), CborError> {
        if range.start > range.end || range.end > VecDeque::len(self) {
            return Err(eof(range.start));
        }
        self.drain(range);
        Ok(())
    }

    fn write_at(&mut self, pos: usize, bytes: &[u8]) -> Result<(), CborError> {
        let r = checked_range(pos, bytes.len(), VecDeque::len(self))?;
        for (dst, src) in self.range_mut(r).zip(bytes) {
            *dst = *src;
        }
        Ok(())
    }

    fn clear(&mut self) {
        VecDeque::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_insert_erase_write() {
        let mut v = vec![1u8, 2, 3];
        v.insert_at(1, &[9, 9]).unwrap();
        assert_eq!(v, [1, 9, 9, 2, 3]);
        StorageMut::erase(&mut v, 0..2).unwrap();
        assert_eq!(v, [9, 2, 3]);
        v.write_at(1, &[7, 7]).unwrap();
        assert_eq!(v, [9, 7, 7]);
        assert!(v.write_at(2, &[0, 0]).is_err());
        assert!(v.insert_at(4, &[0]).is_err());
    }

    #[test]
    fn deque_matches_vec() {
        let mut d: VecDeque<u8> = VecDeque::from(vec![1u8, 2, 3]);
        d.insert_at(3, &[4, 5]).unwrap();
        d.insert_at(0, &[0]).unwrap();
        let mut out = [0u8; 6];
        d.read_at(0, &mut out).unwrap();
        assert_eq!(out, [0, 1, 2, 3, 4, 5]);
        StorageMut::erase(&mut d, 1..3).unwrap();
        assert_eq!(d.byte_at(1).unwrap(), 3);
    }

    #[test]
    fn slice_read_past_end_is_eof() {
        let s: &[u8] = &[1, 2];
        let mut out = [0u8; 2];
        let err = s.read_at(1, &mut out).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::UnexpectedEof);
        assert_eq!(err.offset, 1);
    }
}
