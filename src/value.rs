use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::scalar::Tag;

/// A value to encode.
///
/// `Value` only describes input to the encoder; there is no decode-side tree. Read items
/// through [`Item`](crate::Item) accessors instead. Strings and byte strings are borrowed,
/// so building a `Value` never copies payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Byte string.
    Bytes(&'a [u8]),
    /// Text string.
    Text(&'a str),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// `null`.
    Null,
    /// Array of nested values.
    Array(Vec<Value<'a>>),
    /// Map entries in insertion order. Keys are neither sorted nor deduplicated.
    Map(Vec<(Value<'a>, Value<'a>)>),
    /// A tag applied to one nested value.
    Tagged(Tag, Box<Value<'a>>),
    /// Float, encoded in the narrowest exact width.
    Float(f64),
    /// `true` or `false`.
    Bool(bool),
    /// `undefined`.
    Undefined,
}

impl<'a> Value<'a> {
    /// Build an array from any sequence of values.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a map from `(key, value)` pairs, kept in the given order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Self>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wrap `inner` in `tag`.
    ///
    /// Reserved tag numbers are accepted here and rejected when encoding.
    pub fn tagged(tag: impl Into<Tag>, inner: impl Into<Self>) -> Self {
        Self::Tagged(tag.into(), Box::new(inner.into()))
    }

    /// Unsigned bignum (tag 2) over a big-endian magnitude.
    #[must_use]
    pub fn pos_bignum(magnitude: &'a [u8]) -> Self {
        Self::tagged(Tag::POS_BIGNUM, Self::Bytes(magnitude))
    }

    /// Negative bignum (tag 3): the value is `-1 - magnitude`.
    #[must_use]
    pub fn neg_bignum(magnitude: &'a [u8]) -> Self {
        Self::tagged(Tag::NEG_BIGNUM, Self::Bytes(magnitude))
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! value_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value<'_> {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! value_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value<'_> {
            fn from(v: $t) -> Self {
                Self::Uint(u64::from(v))
            }
        }
    )*};
}

value_from_signed!(i8, i16, i32, i64);
value_from_unsigned!(u8, u16, u32, u64);

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Self::Text(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Bytes(v)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Self::Array(v)
    }
}
