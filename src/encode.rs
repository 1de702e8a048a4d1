//! Item encoding.
//!
//! Every encoding is deterministic: integers, lengths and tag numbers use the shortest
//! head, floats the narrowest exact width. There is no way to emit indefinite-length
//! items.

#[cfg(feature = "alloc")]
use alloc::string::String;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use crate::alloc_util::try_reserve;
use crate::error::{eof, length_overflow};
use crate::float::FloatRepr;
use crate::head::{EncodedHead, Major, IB_FALSE, IB_NULL, IB_TRUE, IB_UNDEFINED};
use crate::scalar::Tag;
#[cfg(feature = "alloc")]
use crate::value::Value;
use crate::{CborError, ErrorCode};

/// Byte sink the encoder writes into.
pub trait Sink {
    /// Append `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot hold the bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<(), CborError>;

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// See [`Sink::write`].
    fn write_u8(&mut self, byte: u8) -> Result<(), CborError> {
        self.write(&[byte])
    }

    /// Number of bytes written so far.
    fn position(&self) -> usize;
}

/// Growable sink backed by a `Vec<u8>`.
#[cfg(feature = "alloc")]
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
}

#[cfg(feature = "alloc")]
impl VecSink {
    /// An empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Consume the sink and return the bytes written.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn buf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

#[cfg(feature = "alloc")]
impl Sink for VecSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CborError> {
        let offset = self.buf.len();
        try_reserve(&mut self.buf, bytes.len(), offset)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_u8(&mut self, byte: u8) -> Result<(), CborError> {
        if self.buf.len() == self.buf.capacity() {
            let offset = self.buf.len();
            try_reserve(&mut self.buf, 1, offset)?;
        }
        self.buf.push(byte);
        Ok(())
    }

    fn position(&self) -> usize {
        self.buf.len()
    }
}

/// Fixed-capacity sink over a caller-provided slice; usable without `alloc`.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    /// Write from the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The bytes written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl Sink for SliceSink<'_> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), CborError> {
        let end = self
            .pos
            .checked_add(bytes.len())
            .ok_or_else(|| length_overflow(self.pos))?;
        let dst = self.buf.get_mut(self.pos..end).ok_or_else(|| eof(self.pos))?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }
}

/// Types with a CBOR encoding.
pub trait Encode {
    /// Write the complete encoded item into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTagValue` for reserved tag numbers and any error raised by the
    /// sink.
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError>;
}

/// Encode `value` into a fresh vector.
///
/// # Errors
///
/// See [`Encode::encode`].
#[cfg(feature = "alloc")]
pub fn encode_to_vec<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, CborError> {
    let mut sink = VecSink::new();
    value.encode(&mut sink)?;
    Ok(sink.into_vec())
}

pub(crate) fn write_head<W: Sink + ?Sized>(
    sink: &mut W,
    major: Major,
    arg: u64,
) -> Result<(), CborError> {
    sink.write(EncodedHead::new(major, arg).as_bytes())
}

fn write_len<W: Sink + ?Sized>(sink: &mut W, major: Major, len: usize) -> Result<(), CborError> {
    let n = u64::try_from(len).map_err(|_| CborError::encode(ErrorCode::LengthOverflow))?;
    write_head(sink, major, n)
}

#[allow(clippy::cast_sign_loss)]
pub(crate) fn write_int<W: Sink + ?Sized>(sink: &mut W, v: i64) -> Result<(), CborError> {
    match u64::try_from(v) {
        Ok(u) => write_head(sink, Major::PosInt, u),
        // -1 - v, computed without overflow for i64::MIN.
        Err(_) => write_head(sink, Major::NegInt, !(v as u64)),
    }
}

pub(crate) fn write_tag<W: Sink + ?Sized>(sink: &mut W, tag: Tag) -> Result<(), CborError> {
    if tag.is_reserved() {
        return Err(CborError::encode(ErrorCode::InvalidTagValue));
    }
    write_head(sink, Major::Tag, tag.0)
}

pub(crate) fn write_bytes<W: Sink + ?Sized>(sink: &mut W, b: &[u8]) -> Result<(), CborError> {
    write_len(sink, Major::Bytes, b.len())?;
    sink.write(b)
}

pub(crate) fn write_text<W: Sink + ?Sized>(sink: &mut W, s: &str) -> Result<(), CborError> {
    write_len(sink, Major::Utf8, s.len())?;
    sink.write(s.as_bytes())
}

pub(crate) fn write_array_head<W: Sink + ?Sized>(
    sink: &mut W,
    len: usize,
) -> Result<(), CborError> {
    write_len(sink, Major::Array, len)
}

pub(crate) fn write_map_head<W: Sink + ?Sized>(sink: &mut W, len: usize) -> Result<(), CborError> {
    write_len(sink, Major::Map, len)
}

/// Encodes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// Encodes as `undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Undefined;

/// Encodes `T` under a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tagged<T>(pub Tag, pub T);

impl Encode for Null {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write_u8(IB_NULL)
    }
}

impl Encode for () {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write_u8(IB_NULL)
    }
}

impl Encode for Undefined {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write_u8(IB_UNDEFINED)
    }
}

impl Encode for bool {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write_u8(if *self { IB_TRUE } else { IB_FALSE })
    }
}

macro_rules! encode_signed {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
                write_int(sink, i64::from(*self))
            }
        }
    )*};
}

macro_rules! encode_unsigned {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
                write_head(sink, Major::PosInt, u64::from(*self))
            }
        }
    )*};
}

encode_signed!(i8, i16, i32, i64);
encode_unsigned!(u8, u16, u32, u64);

impl Encode for isize {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        let v = i64::try_from(*self).map_err(|_| CborError::encode(ErrorCode::LengthOverflow))?;
        write_int(sink, v)
    }
}

impl Encode for usize {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        let v = u64::try_from(*self).map_err(|_| CborError::encode(ErrorCode::LengthOverflow))?;
        write_head(sink, Major::PosInt, v)
    }
}

impl Encode for f64 {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write(FloatRepr::from_f64(*self).as_bytes())
    }
}

impl Encode for f32 {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        sink.write(FloatRepr::from_f32(*self).as_bytes())
    }
}

impl Encode for str {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_text(sink, self)
    }
}

impl Encode for [u8] {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_bytes(sink, self)
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_bytes(sink, self)
    }
}

#[cfg(feature = "alloc")]
impl Encode for String {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_text(sink, self)
    }
}

#[cfg(feature = "alloc")]
impl Encode for Vec<u8> {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_bytes(sink, self)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        (**self).encode(sink)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        match self {
            Some(v) => v.encode(sink),
            None => sink.write_u8(IB_NULL),
        }
    }
}

impl Encode for Tag {
    /// A bare tag has no content; encode it through [`Tagged`] instead.
    fn encode<W: Sink + ?Sized>(&self, _sink: &mut W) -> Result<(), CborError> {
        Err(CborError::encode(ErrorCode::InvalidArgument))
    }
}

impl<T: Encode> Encode for Tagged<T> {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        write_tag(sink, self.0)?;
        self.1.encode(sink)
    }
}

#[cfg(feature = "alloc")]
impl Encode for Value<'_> {
    fn encode<W: Sink + ?Sized>(&self, sink: &mut W) -> Result<(), CborError> {
        match self {
            Self::Bytes(b) => write_bytes(sink, b),
            Self::Text(s) => write_text(sink, s),
            Self::Int(v) => write_int(sink, *v),
            Self::Uint(v) => write_head(sink, Major::PosInt, *v),
            Self::Null => sink.write_u8(IB_NULL),
            Self::Undefined => sink.write_u8(IB_UNDEFINED),
            Self::Bool(v) => v.encode(sink),
            Self::Float(v) => v.encode(sink),
            Self::Array(items) => {
                write_array_head(sink, items.len())?;
                for item in items {
                    item.encode(sink)?;
                }
                Ok(())
            }
            Self::Map(entries) => {
                write_map_head(sink, entries.len())?;
                for (k, v) in entries {
                    k.encode(sink)?;
                    v.encode(sink)?;
                }
                Ok(())
            }
            Self::Tagged(tag, inner) => {
                write_tag(sink, *tag)?;
                inner.encode(sink)
            }
        }
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn integers_use_shortest_head() {
        assert_eq!(encode_to_vec(&0u8).unwrap(), [0x00]);
        assert_eq!(encode_to_vec(&-1i8).unwrap(), [0x20]);
        assert_eq!(encode_to_vec(&500u16).unwrap(), [0x19, 0x01, 0xf4]);
        assert_eq!(
            encode_to_vec(&i64::MIN).unwrap(),
            [0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn reserved_tags_are_rejected() {
        for t in [0xffff, 0xffff_ffff, u64::MAX] {
            let err = encode_to_vec(&Tagged(Tag(t), 0u8)).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidTagValue);
        }
        assert_eq!(
            encode_to_vec(&Tag(1)).unwrap_err().code,
            ErrorCode::InvalidArgument
        );
    }

    #[test]
    fn encode_errors_carry_no_offset() {
        let v = Value::array([
            Value::from("some leading text"),
            Value::tagged(Tag(0xffff), 0u8),
        ]);
        let err = encode_to_vec(&v).unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::InvalidTagValue, 0));

        let mut sink = VecSink::new();
        sink.write(&[0x00; 5]).unwrap();
        let err = Tag(1).encode(&mut sink).unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::InvalidArgument, 0));
    }

    #[test]
    fn value_tree() {
        let v = Value::map([("a", Value::array([1i64, -2])), ("b", Value::Null)]);
        assert_eq!(
            encode_to_vec(&v).unwrap(),
            [0xa2, 0x61, b'a', 0x82, 0x01, 0x21, 0x61, b'b', 0xf6]
        );
    }

    #[test]
    fn slice_sink_reports_eof_when_full() {
        let mut buf = [0u8; 2];
        let mut sink = SliceSink::new(&mut buf);
        "abc".encode(&mut sink).unwrap_err();
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        "abc".encode(&mut sink).unwrap();
        assert_eq!(sink.written(), [0x63, b'a', b'b', b'c']);
    }
}
