use crate::error::{eof, length_overflow};
use crate::head::{decode_head, Major};
use crate::storage::Storage;
use crate::CborError;

pub fn read_be_u16<S: Storage + ?Sized>(s: &S, pos: usize) -> Result<u16, CborError> {
    let mut b = [0u8; 2];
    s.read_at(pos, &mut b)?;
    Ok(u16::from_be_bytes(b))
}

pub fn read_be_u32<S: Storage + ?Sized>(s: &S, pos: usize) -> Result<u32, CborError> {
    let mut b = [0u8; 4];
    s.read_at(pos, &mut b)?;
    Ok(u32::from_be_bytes(b))
}

pub fn read_be_u64<S: Storage + ?Sized>(s: &S, pos: usize) -> Result<u64, CborError> {
    let mut b = [0u8; 8];
    s.read_at(pos, &mut b)?;
    Ok(u64::from_be_bytes(b))
}

/// Children an item contributes to the walk: array items, map keys and values, or the
/// single item a tag encloses.
pub fn child_count<S: Storage + ?Sized>(s: &S, pos: usize) -> Result<u64, CborError> {
    let head = decode_head(s, pos)?;
    match head.major() {
        Major::Array => head.argument(),
        Major::Map => head
            .argument()?
            .checked_mul(2)
            .ok_or_else(|| length_overflow(pos)),
        Major::Tag => {
            head.argument()?;
            Ok(1)
        }
        _ => Ok(0),
    }
}

/// Returns the offset just past the complete item (including every nested child)
/// starting at `start`.
///
/// Pending items always sit back to back, so a single counter replaces an explicit
/// stack: each container adds its children to the count of items still to skip.
pub fn skip_item<S: Storage + ?Sized>(s: &S, start: usize) -> Result<usize, CborError> {
    skip_items(s, start, 1)
}

/// Skip `count` consecutive complete items starting at `start`.
pub fn skip_items<S: Storage + ?Sized>(
    s: &S,
    start: usize,
    count: u64,
) -> Result<usize, CborError> {
    let len = s.len();
    let mut pos = start;
    let mut remaining = count;

    while remaining > 0 {
        // Every item occupies at least one byte.
        let left = len.checked_sub(pos).ok_or_else(|| eof(pos))?;
        if remaining > left as u64 {
            return Err(eof(pos));
        }
        remaining -= 1;

        let head = decode_head(s, pos)?;
        match head.major() {
            Major::PosInt | Major::NegInt => {
                head.argument()?;
            }
            Major::Array | Major::Map | Major::Tag => {
                remaining = remaining
                    .checked_add(child_count(s, pos)?)
                    .ok_or_else(|| length_overflow(pos))?;
            }
            Major::Bytes | Major::Utf8 | Major::Special => {}
        }

        let next = pos
            .checked_add(head.item_size()?)
            .ok_or_else(|| length_overflow(pos))?;
        if next > len {
            return Err(eof(pos));
        }
        pos = next;
    }

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn skips_nested_containers() {
        // [1, {"a": [2]}, 6(h'00')] followed by 0
        let b: &[u8] = &[
            0x83, 0x01, 0xa1, 0x61, b'a', 0x81, 0x02, 0xc6, 0x41, 0x00, 0x00,
        ];
        assert_eq!(skip_item(b, 0).unwrap(), 10);
        assert_eq!(skip_item(b, 2).unwrap(), 7);
        assert_eq!(skip_items(b, 0, 2).unwrap(), 11);
    }

    #[test]
    fn bogus_count_is_eof_not_a_long_loop() {
        let b: &[u8] = &[0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(skip_item(b, 0).unwrap_err().code, ErrorCode::UnexpectedEof);
    }

    #[test]
    fn indefinite_array_is_unsupported() {
        let b: &[u8] = &[0x9f, 0x01, 0xff];
        assert_eq!(
            skip_item(b, 0).unwrap_err().code,
            ErrorCode::UnsupportedFeature
        );
    }
}
