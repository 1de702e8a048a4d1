use crate::error::{unsupported, wrong_kind};
use crate::float::HalfSpecial;
use crate::head::{decode_head, special, Head, Major, IB_FALSE, IB_TRUE};
use crate::storage::Storage;
use crate::wire;
use crate::{CborError, ErrorCode};

/// A tag number (major type 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u64);

impl Tag {
    /// Standard date/time string.
    pub const DATE_TIME_STRING: Self = Self(0);
    /// Epoch-based date/time.
    pub const DATE_TIME_EPOCH: Self = Self(1);
    /// Unsigned bignum; encloses a byte string magnitude.
    pub const POS_BIGNUM: Self = Self(2);
    /// Negative bignum; encloses a byte string magnitude.
    pub const NEG_BIGNUM: Self = Self(3);

    /// Returns `true` for the tag numbers that can never be encoded:
    /// `0xffff`, `0xffff_ffff` and `0xffff_ffff_ffff_ffff`.
    #[inline]
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self.0, 0xffff | 0xffff_ffff | u64::MAX)
    }

    /// The raw tag number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Tag {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// The kind of an item, with integers classified by the narrowest type that holds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Integer in `i32` range.
    Int32,
    /// Negative integer below `i32::MIN`, or an integer encoded with an 8-byte argument
    /// that fits `i64`.
    Int64,
    /// Byte string.
    Bytes,
    /// Text string.
    String,
    /// Array.
    Array,
    /// Map.
    Map,
    /// Tag.
    Tag,
    /// Unsigned integer above `i32::MAX` encoded with a 4-byte argument.
    Uint32,
    /// Unsigned integer above `i64::MAX`.
    Uint64,
    /// Half or single precision float.
    Fp32,
    /// Double precision float.
    Fp64,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// The break stop code.
    IndefiniteBreak,
}

impl ItemType {
    /// Returns `true` for the integer classifications.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64)
    }

    /// Returns `true` for the float classifications.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Fp32 | Self::Fp64)
    }
}

/// Classify a decoded head.
///
/// # Errors
///
/// Returns `UnsupportedFeature` for extended simple values and the unassigned simple
/// values 0..=19 of major type 7.
pub fn classify(head: Head) -> Result<ItemType, CborError> {
    const I32_MAX: u64 = i32::MAX as u64;
    const I64_MAX: u64 = i64::MAX as u64;
    let off = head.offset();
    Ok(match head.major() {
        Major::PosInt => {
            let arg = head.argument()?;
            match head.argument_size() {
                0..=2 => ItemType::Int32,
                4 if arg > I32_MAX => ItemType::Uint32,
                4 => ItemType::Int32,
                _ if arg > I64_MAX => ItemType::Uint64,
                _ => ItemType::Int64,
            }
        }
        Major::NegInt => {
            let arg = head.argument()?;
            if head.argument_size() < 4 || arg <= I32_MAX {
                ItemType::Int32
            } else {
                ItemType::Int64
            }
        }
        Major::Bytes => ItemType::Bytes,
        Major::Utf8 => ItemType::String,
        Major::Array => ItemType::Array,
        Major::Map => ItemType::Map,
        Major::Tag => ItemType::Tag,
        Major::Special => match head.additional_info() {
            special::FALSE | special::TRUE => ItemType::Boolean,
            special::NULL => ItemType::Null,
            special::UNDEFINED => ItemType::Undefined,
            special::FP16 | special::FP32 => ItemType::Fp32,
            special::FP64 => ItemType::Fp64,
            special::BREAK => ItemType::IndefiniteBreak,
            _ => return Err(unsupported(off)),
        },
    })
}

/// Types that can be decoded from the item at a given offset.
pub trait FromItem: Sized {
    /// Decode `Self` from the item whose head starts at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item has a different major type, and the
    /// type-specific range errors (`Overflow`, `LossyConversion`, `UnsupportedFeature`).
    fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError>;
}

impl FromItem for bool {
    fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError> {
        match s.byte_at(offset)? {
            IB_FALSE => Ok(false),
            IB_TRUE => Ok(true),
            _ => Err(wrong_kind(offset)),
        }
    }
}

/// Integer value of the item at `offset`, in a domain wide enough for every head.
fn read_int<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<i128, CborError> {
    let head = decode_head(s, offset)?;
    match head.major() {
        Major::PosInt => Ok(i128::from(head.argument()?)),
        Major::NegInt => Ok(-1 - i128::from(head.argument()?)),
        _ => Err(wrong_kind(offset)),
    }
}

macro_rules! from_item_int {
    ($($t:ty),* $(,)?) => {$(
        impl FromItem for $t {
            fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError> {
                let v = read_int(s, offset)?;
                <$t>::try_from(v).map_err(|_| CborError::new(ErrorCode::Overflow, offset))
            }
        }
    )*};
}

from_item_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Float value of the item at `offset`, keeping the encoded width.
enum Wire {
    Single(f32),
    Double(f64),
}

fn read_float<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Wire, CborError> {
    let head = decode_head(s, offset)?;
    if head.major() != Major::Special {
        return Err(wrong_kind(offset));
    }
    let pos = offset + 1;
    match head.additional_info() {
        special::FP16 => {
            let payload = wire::read_be_u16(s, pos)?;
            let half = HalfSpecial::from_payload(payload).ok_or_else(|| unsupported(offset))?;
            Ok(Wire::Double(half.to_f64()))
        }
        special::FP32 => Ok(Wire::Single(f32::from_bits(wire::read_be_u32(s, pos)?))),
        special::FP64 => Ok(Wire::Double(f64::from_bits(wire::read_be_u64(s, pos)?))),
        _ => Err(wrong_kind(offset)),
    }
}

impl FromItem for f64 {
    fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError> {
        Ok(match read_float(s, offset)? {
            Wire::Single(v) => Self::from(v),
            Wire::Double(v) => v,
        })
    }
}

impl FromItem for f32 {
    fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError> {
        match read_float(s, offset)? {
            Wire::Single(v) => Ok(v),
            Wire::Double(v) if v.is_nan() => Ok(Self::NAN),
            Wire::Double(v) => {
                #[allow(clippy::cast_possible_truncation)]
                let narrowed = v as Self;
                if f64::from(narrowed) == v {
                    Ok(narrowed)
                } else {
                    Err(CborError::new(ErrorCode::LossyConversion, offset))
                }
            }
        }
    }
}

impl FromItem for Tag {
    fn from_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Self, CborError> {
        let head = decode_head(s, offset)?;
        if head.major() != Major::Tag {
            return Err(wrong_kind(offset));
        }
        Ok(Self(head.argument()?))
    }
}
