//! The item head: the leading 1-9 bytes of every data item.
//!
//! The initial byte carries a 3-bit major type and 5 bits of additional information.
//! Additional information 0..=23 is the argument itself, 24..=27 select a 1/2/4/8 byte
//! big-endian argument, 28..=30 are reserved and 31 marks an indefinite length.

use crate::error::{eof, invalid_argument, unsupported};
use crate::storage::Storage;
use crate::wire;
use crate::{CborError, ErrorCode};

/// Item head major type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Major {
    /// Unsigned integer.
    PosInt = 0,
    /// Negative integer `-1 - argument`.
    NegInt = 1,
    /// Byte string.
    Bytes = 2,
    /// UTF-8 text string.
    Utf8 = 3,
    /// Array of `argument` items.
    Array = 4,
    /// Map of `argument` key/value pairs.
    Map = 5,
    /// Tag `argument` applied to the following item.
    Tag = 6,
    /// Simple values and floats.
    Special = 7,
}

impl Major {
    /// Extract the major type from an initial byte.
    #[inline]
    #[must_use]
    pub const fn from_initial_byte(ib: u8) -> Self {
        match ib >> 5 {
            0 => Self::PosInt,
            1 => Self::NegInt,
            2 => Self::Bytes,
            3 => Self::Utf8,
            4 => Self::Array,
            5 => Self::Map,
            6 => Self::Tag,
            _ => Self::Special,
        }
    }
}

impl TryFrom<u8> for Major {
    type Error = CborError;

    fn try_from(v: u8) -> Result<Self, CborError> {
        if v > 7 {
            return Err(invalid_argument(0));
        }
        Ok(Self::from_initial_byte(v << 5))
    }
}

/// Additional-information values with a fixed meaning.
pub mod ai {
    /// One trailing argument byte.
    pub const BYTE: u8 = 24;
    /// Two trailing argument bytes.
    pub const WORD: u8 = 25;
    /// Four trailing argument bytes.
    pub const DWORD: u8 = 26;
    /// Eight trailing argument bytes.
    pub const QWORD: u8 = 27;
    /// Indefinite length (or the break stop code for major type 7).
    pub const INDEFINITE: u8 = 31;
}

/// Additional-information values of major type 7.
pub mod special {
    /// `false`.
    pub const FALSE: u8 = 20;
    /// `true`.
    pub const TRUE: u8 = 21;
    /// `null`.
    pub const NULL: u8 = 22;
    /// `undefined`.
    pub const UNDEFINED: u8 = 23;
    /// Extended simple value in the following byte.
    pub const EXTENDED: u8 = 24;
    /// IEEE 754 half precision float.
    pub const FP16: u8 = 25;
    /// IEEE 754 single precision float.
    pub const FP32: u8 = 26;
    /// IEEE 754 double precision float.
    pub const FP64: u8 = 27;
    /// Break stop code for indefinite-length items.
    pub const BREAK: u8 = 31;
}

/// Build an initial byte from a major type and additional information.
#[inline]
#[must_use]
pub const fn initial_byte(major: Major, ai: u8) -> u8 {
    ((major as u8) << 5) | (ai & 0x1f)
}

pub(crate) const IB_FALSE: u8 = initial_byte(Major::Special, special::FALSE);
pub(crate) const IB_TRUE: u8 = initial_byte(Major::Special, special::TRUE);
pub(crate) const IB_NULL: u8 = initial_byte(Major::Special, special::NULL);
pub(crate) const IB_UNDEFINED: u8 = initial_byte(Major::Special, special::UNDEFINED);
pub(crate) const IB_FP16: u8 = initial_byte(Major::Special, special::FP16);
pub(crate) const IB_FP32: u8 = initial_byte(Major::Special, special::FP32);
pub(crate) const IB_FP64: u8 = initial_byte(Major::Special, special::FP64);

/// A decoded item head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    offset: usize,
    major: Major,
    ai: u8,
    arg: u64,
    size: u8,
}

impl Head {
    /// Byte offset of the head within the storage it was decoded from.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Major type.
    #[inline]
    #[must_use]
    pub const fn major(self) -> Major {
        self.major
    }

    /// Raw additional information (0..=27 or 31).
    #[inline]
    #[must_use]
    pub const fn additional_info(self) -> u8 {
        self.ai
    }

    /// Size of the head in bytes (1, 2, 3, 5 or 9).
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        self.size as usize
    }

    /// Number of trailing argument bytes (0, 1, 2, 4 or 8).
    #[inline]
    #[must_use]
    pub const fn argument_size(self) -> usize {
        self.size as usize - 1
    }

    /// Returns `true` if the head carries the indefinite-length marker.
    #[inline]
    #[must_use]
    pub const fn is_indefinite(self) -> bool {
        self.ai == ai::INDEFINITE
    }

    /// The definite argument.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFeature` for an indefinite-length head.
    #[inline]
    pub const fn argument(self) -> Result<u64, CborError> {
        if self.is_indefinite() {
            return Err(unsupported(self.offset));
        }
        Ok(self.arg)
    }

    /// Length of the raw payload following the head: the argument for byte and text
    /// strings, zero for every other major type.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFeature` for an indefinite-length string, or `LengthOverflow`
    /// if the length does not fit in `usize`.
    pub fn payload_len(self) -> Result<usize, CborError> {
        match self.major {
            Major::Bytes | Major::Utf8 => {
                let n = self.argument()?;
                usize::try_from(n)
                    .map_err(|_| CborError::new(ErrorCode::LengthOverflow, self.offset))
            }
            _ => Ok(0),
        }
    }

    /// Head size plus payload size.
    ///
    /// For arrays, maps and tags this is the head alone: the span of their children is
    /// only known by walking them.
    ///
    /// # Errors
    ///
    /// See [`Head::payload_len`].
    pub fn item_size(self) -> Result<usize, CborError> {
        self.size()
            .checked_add(self.payload_len()?)
            .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, self.offset))
    }
}

/// Number of trailing argument bytes selected by additional information `ai`.
///
/// # Errors
///
/// Returns `MalformedHead` for the reserved values 28..=30.
pub const fn argument_size(ai: u8, offset: usize) -> Result<usize, CborError> {
    match ai {
        0..=23 | ai::INDEFINITE => Ok(0),
        ai::BYTE => Ok(1),
        ai::WORD => Ok(2),
        ai::DWORD => Ok(4),
        ai::QWORD => Ok(8),
        _ => Err(CborError::new(ErrorCode::MalformedHead, offset)),
    }
}

/// Decode the item head starting at `offset`.
///
/// # Errors
///
/// Returns `MalformedHead` for reserved additional information and `UnexpectedEof` if
/// the head is truncated.
pub fn decode_head<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Head, CborError> {
    let ib = s.byte_at(offset)?;
    let major = Major::from_initial_byte(ib);
    let ai = ib & 0x1f;
    let arg_size = argument_size(ai, offset)?;
    if s.len() - offset <= arg_size {
        return Err(eof(offset));
    }
    let arg_pos = offset + 1;
    let arg = match arg_size {
        0 => u64::from(ai),
        1 => u64::from(s.byte_at(arg_pos)?),
        2 => u64::from(wire::read_be_u16(s, arg_pos)?),
        4 => u64::from(wire::read_be_u32(s, arg_pos)?),
        _ => wire::read_be_u64(s, arg_pos)?,
    };
    #[allow(clippy::cast_possible_truncation)]
    let size = arg_size as u8 + 1;
    Ok(Head {
        offset,
        major,
        ai,
        arg,
        size,
    })
}

/// Size of the item at `offset` as defined by [`Head::item_size`].
///
/// # Errors
///
/// See [`decode_head`] and [`Head::item_size`].
pub fn item_size<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<usize, CborError> {
    decode_head(s, offset)?.item_size()
}

/// Length of the shortest head that can carry `arg`.
#[inline]
#[must_use]
pub const fn head_len(arg: u64) -> usize {
    if arg <= 23 {
        1
    } else if arg <= 0xff {
        2
    } else if arg <= 0xffff {
        3
    } else if arg <= 0xffff_ffff {
        5
    } else {
        9
    }
}

/// A head in its shortest encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedHead {
    buf: [u8; 9],
    len: u8,
}

impl EncodedHead {
    /// Encode `arg` under `major` using the shortest legal form.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(major: Major, arg: u64) -> Self {
        let mut buf = [0u8; 9];
        let len = head_len(arg);
        match len {
            1 => buf[0] = initial_byte(major, arg as u8),
            2 => {
                buf[0] = initial_byte(major, ai::BYTE);
                buf[1] = arg as u8;
            }
            3 => {
                buf[0] = initial_byte(major, ai::WORD);
                let b = (arg as u16).to_be_bytes();
                buf[1] = b[0];
                buf[2] = b[1];
            }
            5 => {
                buf[0] = initial_byte(major, ai::DWORD);
                let b = (arg as u32).to_be_bytes();
                let mut i = 0;
                while i < 4 {
                    buf[1 + i] = b[i];
                    i += 1;
                }
            }
            _ => {
                buf[0] = initial_byte(major, ai::QWORD);
                let b = arg.to_be_bytes();
                let mut i = 0;
                while i < 8 {
                    buf[1 + i] = b[i];
                    i += 1;
                }
            }
        }
        Self {
            buf,
            len: len as u8,
        }
    }

    /// The encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Encoded length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`: a head is at least one byte.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl AsRef<[u8]> for EncodedHead {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Encode a head from a raw major type number.
///
/// # Errors
///
/// Returns `InvalidArgument` if `major > 7`.
pub fn encode_head(major: u8, arg: u64) -> Result<EncodedHead, CborError> {
    let major = Major::try_from(major)?;
    Ok(EncodedHead::new(major, arg))
}
