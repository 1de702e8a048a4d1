//! Whole-buffer well-formedness check.
//!
//! The navigation primitives decode lazily and only report problems in the items they
//! touch. [`validate`] walks every item once up front, with the same error codes the
//! accessors would raise, so a buffer from an untrusted source (or one left behind by a
//! failed mutation) can be checked before use.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::error::{eof, length_overflow, unsupported};
use crate::float::HalfSpecial;
use crate::head::{decode_head, special, Major};
use crate::scalar::{classify, ItemType};
use crate::storage::Storage;
use crate::wire;
use crate::{CborError, DecodeLimits, ErrorCode};

const INLINE_STACK: usize = 32;

/// Children still expected by each open container, innermost last.
///
/// Nesting up to `INLINE_STACK` stays on the stack; deeper nesting spills into a vector
/// with `alloc`, or fails with `DepthLimitExceeded` without it.
struct FrameStack<const N: usize> {
    inline: [u64; N],
    len: usize,
    #[cfg(feature = "alloc")]
    overflow: Vec<u64>,
}

impl<const N: usize> FrameStack<N> {
    const fn new() -> Self {
        Self {
            inline: [0; N],
            len: 0,
            #[cfg(feature = "alloc")]
            overflow: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        #[cfg(feature = "alloc")]
        {
            self.len + self.overflow.len()
        }
        #[cfg(not(feature = "alloc"))]
        {
            self.len
        }
    }

    #[cfg(feature = "alloc")]
    fn push(&mut self, remaining: u64, off: usize) -> Result<(), CborError> {
        if self.len < N {
            self.inline[self.len] = remaining;
            self.len += 1;
            return Ok(());
        }
        crate::alloc_util::try_reserve(&mut self.overflow, 1, off)?;
        self.overflow.push(remaining);
        Ok(())
    }

    #[cfg(not(feature = "alloc"))]
    fn push(&mut self, remaining: u64, off: usize) -> Result<(), CborError> {
        if self.len < N {
            self.inline[self.len] = remaining;
            self.len += 1;
            Ok(())
        } else {
            Err(CborError::new(ErrorCode::DepthLimitExceeded, off))
        }
    }

    fn pop(&mut self) {
        #[cfg(feature = "alloc")]
        {
            if self.overflow.pop().is_some() {
                return;
            }
        }
        self.len = self.len.saturating_sub(1);
    }

    fn peek_mut(&mut self) -> Option<&mut u64> {
        #[cfg(feature = "alloc")]
        {
            if let Some(top) = self.overflow.last_mut() {
                return Some(top);
            }
        }
        if self.len == 0 {
            return None;
        }
        Some(&mut self.inline[self.len - 1])
    }
}

struct Validator<'a, S: Storage + ?Sized> {
    s: &'a S,
    len: usize,
    limits: DecodeLimits,
    items_seen: usize,
    stack: FrameStack<INLINE_STACK>,
}

impl<'a, S: Storage + ?Sized> Validator<'a, S> {
    fn new(s: &'a S, limits: DecodeLimits) -> Self {
        Self {
            s,
            len: s.len(),
            limits,
            items_seen: 0,
            stack: FrameStack::new(),
        }
    }

    /// Check one complete top-level item; returns the offset just past it.
    fn item(&mut self, start: usize) -> Result<usize, CborError> {
        let mut pos = start;
        loop {
            let (next, children) = self.head(pos)?;
            if children > 0 {
                self.open(pos, next, children)?;
                pos = next;
                continue;
            }
            pos = next;
            loop {
                let Some(remaining) = self.stack.peek_mut() else {
                    return Ok(pos);
                };
                *remaining -= 1;
                if *remaining > 0 {
                    break;
                }
                self.stack.pop();
            }
        }
    }

    /// Validate the head (and any payload) at `pos`; returns the offset of the next head
    /// and the number of children that follow.
    fn head(&self, pos: usize) -> Result<(usize, u64), CborError> {
        let head = decode_head(self.s, pos)?;
        let mut children = 0;
        match head.major() {
            Major::PosInt | Major::NegInt => {
                head.argument()?;
            }
            Major::Bytes | Major::Utf8 => {}
            Major::Array | Major::Map | Major::Tag => {
                children = wire::child_count(self.s, pos)?;
            }
            Major::Special => match classify(head)? {
                ItemType::IndefiniteBreak => return Err(unsupported(pos)),
                ItemType::Fp32 if head.additional_info() == special::FP16 => {
                    let payload =
                        u16::try_from(head.argument()?).map_err(|_| unsupported(pos))?;
                    if HalfSpecial::from_payload(payload).is_none() {
                        return Err(unsupported(pos));
                    }
                }
                _ => {}
            },
        }
        let next = pos
            .checked_add(head.item_size()?)
            .ok_or_else(|| length_overflow(pos))?;
        if next > self.len {
            return Err(eof(pos));
        }
        Ok((next, children))
    }

    fn open(&mut self, pos: usize, first_child: usize, children: u64) -> Result<(), CborError> {
        if children > (self.len - first_child) as u64 {
            return Err(eof(pos));
        }
        if self.stack.depth() + 1 > self.limits.max_depth {
            return Err(CborError::new(ErrorCode::DepthLimitExceeded, pos));
        }
        let add = usize::try_from(children).map_err(|_| length_overflow(pos))?;
        self.items_seen = self
            .items_seen
            .checked_add(add)
            .ok_or_else(|| length_overflow(pos))?;
        if self.items_seen > self.limits.max_total_items {
            return Err(CborError::new(ErrorCode::TotalItemsLimitExceeded, pos));
        }
        self.stack.push(children, pos)
    }
}

/// Check that the buffer holds zero or more complete, well-formed top-level items that
/// every accessor of this crate can decode. Returns the number of top-level items.
///
/// # Errors
///
/// Returns `MalformedHead` for reserved additional information, `UnsupportedFeature` for
/// indefinite lengths, extended or unassigned simple values, stray break codes and
/// half-floats other than NaN/±Infinity, `UnexpectedEof` for truncated items, and the
/// limit codes of [`DecodeLimits`].
pub fn validate<S: Storage + ?Sized>(s: &S, limits: DecodeLimits) -> Result<usize, CborError> {
    if s.len() > limits.max_input_bytes {
        return Err(CborError::new(ErrorCode::InputLenLimitExceeded, 0));
    }
    let mut v = Validator::new(s, limits);
    let mut pos = 0;
    let mut count = 0usize;
    while pos < v.len {
        pos = v.item(pos)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(b: &[u8]) -> Result<usize, CborError> {
        validate(b, DecodeLimits::unlimited())
    }

    #[test]
    fn counts_top_level_items() {
        assert_eq!(check(&[]).unwrap(), 0);
        // 1, [2, {"a": 3}], 6(null)
        let b = [0x01, 0x82, 0x02, 0xa1, 0x61, b'a', 0x03, 0xc6, 0xf6];
        assert_eq!(check(&b).unwrap(), 3);
    }

    #[test]
    fn rejects_what_accessors_reject() {
        assert_eq!(check(&[0x1c]).unwrap_err().code, ErrorCode::MalformedHead);
        assert_eq!(
            check(&[0x9f, 0x01, 0xff]).unwrap_err().code,
            ErrorCode::UnsupportedFeature
        );
        assert_eq!(
            check(&[0xf9, 0x3c, 0x00]).unwrap_err().code,
            ErrorCode::UnsupportedFeature
        );
        assert_eq!(
            check(&[0xf8, 0x20]).unwrap_err().code,
            ErrorCode::UnsupportedFeature
        );
        assert_eq!(check(&[0xff]).unwrap_err().code, ErrorCode::UnsupportedFeature);
        let err = check(&[0x82, 0x01]).unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::UnexpectedEof, 0));
        let err = check(&[0x00, 0x63, b'a']).unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::UnexpectedEof, 1));
    }

    #[test]
    fn deep_nesting_spills_and_respects_limit() {
        let mut b = [0x81u8; 64];
        b[63] = 0x00;
        assert_eq!(check(&b).unwrap(), 1);
        let limits = DecodeLimits::for_bytes(64);
        assert_eq!(validate(&b[..], limits).unwrap(), 1);
        let shallow = DecodeLimits {
            max_depth: 8,
            ..limits
        };
        let err = validate(&b[..], shallow).unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::DepthLimitExceeded, 8));
    }

    #[test]
    fn item_and_input_limits() {
        let b = [0x83, 0x01, 0x02, 0x03];
        let limits = DecodeLimits {
            max_total_items: 2,
            ..DecodeLimits::for_bytes(4)
        };
        assert_eq!(
            validate(&b[..], limits).unwrap_err().code,
            ErrorCode::TotalItemsLimitExceeded
        );
        assert_eq!(
            validate(&b[..], DecodeLimits::for_bytes(3)).unwrap_err().code,
            ErrorCode::InputLenLimitExceeded
        );
    }
}
