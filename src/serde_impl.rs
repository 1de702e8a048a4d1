//! serde integration.
//!
//! Serialization writes items straight into a byte buffer with the shortest heads the
//! encoder uses everywhere else. Sequences and maps whose length serde does not know up
//! front get a placeholder count that is patched in place when they end.
//!
//! Deserialization reads from an [`Item`] view and borrows strings and byte strings from
//! the buffer. Tags are transparent: a tagged item deserializes as its content.
//!
//! | Rust / serde          | CBOR                                  |
//! |-----------------------|---------------------------------------|
//! | `()`, unit struct     | `null`                                |
//! | `None` / `Some(v)`    | `null` / `v`                          |
//! | unit variant          | text string with the variant name     |
//! | other enum variants   | one-entry map `{variant: content}`    |
//! | struct                | map with text keys                    |

use alloc::vec::Vec;
use core::fmt;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeSeed, Visitor};
use serde::ser::{self, Serialize};
use serde::Deserialize;

use crate::edit::set_header_argument;
use crate::encode::{
    write_bytes, write_head, write_int, write_map_head, write_text, Encode, Sink, VecSink,
};
use crate::error::{unsupported, wrong_kind};
use crate::head::Major;
use crate::limits::{DecodeLimits, DEFAULT_MAX_DEPTH};
use crate::query::{ArrayIter, Item, MapIter};
use crate::scalar::{classify, ItemType};
use crate::storage::Contiguous;
use crate::{CborError, ErrorCode};

/// Serialize `value` into a fresh buffer holding exactly one item.
///
/// # Errors
///
/// Returns `Overflow` for 128-bit integers outside the CBOR integer range, `SerdeError`
/// when the `Serialize` impl fails, and allocation failures.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CborError> {
    let mut ser = ItemSerializer {
        sink: VecSink::new(),
    };
    value.serialize(&mut ser).map_err(CborError::from)?;
    Ok(ser.sink.into_vec())
}

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'a, S: Contiguous + ?Sized> Item<'a, S> {
    /// Deserialize a `T` from this item. Strings and byte strings may borrow from the
    /// buffer. Nesting below this item is limited to [`DEFAULT_MAX_DEPTH`] containers
    /// and tags.
    ///
    /// # Errors
    ///
    /// Returns the decode error of the first item that does not match what `T` expects,
    /// `DepthLimitExceeded` when the item nests deeper than the limit, or `SerdeError`
    /// when the `Deserialize` impl rejects the data.
    pub fn deserialize<T: Deserialize<'a>>(self) -> Result<T, CborError> {
        T::deserialize(ItemDeserializer::new(self, DEFAULT_MAX_DEPTH)).map_err(CborError::from)
    }

    /// Like [`deserialize`](Self::deserialize) with the nesting bound taken from
    /// `limits.max_depth`. Every array, map or tag entered on the way down counts as one
    /// level, the same way [`validate`](crate::validate) counts them.
    ///
    /// # Errors
    ///
    /// See [`deserialize`](Self::deserialize).
    pub fn deserialize_with_limits<T: Deserialize<'a>>(
        self,
        limits: DecodeLimits,
    ) -> Result<T, CborError> {
        T::deserialize(ItemDeserializer::new(self, limits.max_depth)).map_err(CborError::from)
    }
}

#[derive(Debug, Clone, Copy)]
struct SerdeError {
    code: ErrorCode,
    offset: usize,
}

impl SerdeError {
    const fn with_code(code: ErrorCode) -> Self {
        Self { code, offset: 0 }
    }
}

impl From<CborError> for SerdeError {
    fn from(err: CborError) -> Self {
        Self {
            code: err.code,
            offset: err.offset,
        }
    }
}

impl From<SerdeError> for CborError {
    fn from(err: SerdeError) -> Self {
        Self::new(err.code, err.offset)
    }
}

impl fmt::Display for SerdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&CborError::from(*self), f)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SerdeError {}

impl ser::Error for SerdeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::with_code(ErrorCode::SerdeError)
    }
}

impl de::Error for SerdeError {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::with_code(ErrorCode::SerdeError)
    }
}

struct ItemSerializer {
    sink: VecSink,
}

impl ItemSerializer {
    fn begin(&mut self, major: Major, len: Option<usize>) -> Result<Compound<'_>, SerdeError> {
        let head = self.sink.position();
        let declared = len
            .map_or(Ok(0), u64::try_from)
            .map_err(|_| SerdeError::from(CborError::encode(ErrorCode::LengthOverflow)))?;
        write_head(&mut self.sink, major, declared)?;
        Ok(Compound {
            ser: self,
            head,
            declared,
            count: 0,
        })
    }

    fn variant(&mut self, variant: &str) -> Result<(), SerdeError> {
        write_map_head(&mut self.sink, 1)?;
        write_text(&mut self.sink, variant)?;
        Ok(())
    }
}

/// An open array or map. The head was written with the length serde announced (zero
/// when unknown) and is rewritten on `end` if the element count differs.
struct Compound<'a> {
    ser: &'a mut ItemSerializer,
    head: usize,
    declared: u64,
    count: u64,
}

impl Compound<'_> {
    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        self.count += 1;
        value.serialize(&mut *self.ser)
    }

    fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), SerdeError> {
        write_text(&mut self.ser.sink, key)?;
        self.element(value)
    }

    fn finish(self) -> Result<(), SerdeError> {
        if self.count != self.declared {
            set_header_argument(self.ser.sink.buf_mut(), self.head, self.count)?;
        }
        Ok(())
    }
}

macro_rules! serialize_int {
    ($($method:ident: $t:ty),* $(,)?) => {
        $(
            fn $method(self, v: $t) -> Result<(), SerdeError> {
                write_int(&mut self.sink, i64::from(v))?;
                Ok(())
            }
        )*
    };
}

macro_rules! serialize_uint {
    ($($method:ident: $t:ty),* $(,)?) => {
        $(
            fn $method(self, v: $t) -> Result<(), SerdeError> {
                write_head(&mut self.sink, Major::PosInt, u64::from(v))?;
                Ok(())
            }
        )*
    };
}

impl<'a> ser::Serializer for &'a mut ItemSerializer {
    type Ok = ();
    type Error = SerdeError;

    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<(), SerdeError> {
        Ok(v.encode(&mut self.sink)?)
    }

    serialize_int!(serialize_i8: i8, serialize_i16: i16, serialize_i32: i32, serialize_i64: i64);
    serialize_uint!(serialize_u8: u8, serialize_u16: u16, serialize_u32: u32, serialize_u64: u64);

    fn serialize_i128(self, v: i128) -> Result<(), SerdeError> {
        if let Ok(n) = u64::try_from(v) {
            return self.serialize_u64(n);
        }
        let arg = u64::try_from(-1 - v).map_err(|_| SerdeError::with_code(ErrorCode::Overflow))?;
        write_head(&mut self.sink, Major::NegInt, arg)?;
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), SerdeError> {
        let n = u64::try_from(v).map_err(|_| SerdeError::with_code(ErrorCode::Overflow))?;
        self.serialize_u64(n)
    }

    fn serialize_f32(self, v: f32) -> Result<(), SerdeError> {
        Ok(v.encode(&mut self.sink)?)
    }

    fn serialize_f64(self, v: f64) -> Result<(), SerdeError> {
        Ok(v.encode(&mut self.sink)?)
    }

    fn serialize_char(self, v: char) -> Result<(), SerdeError> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<(), SerdeError> {
        Ok(write_text(&mut self.sink, v)?)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), SerdeError> {
        Ok(write_bytes(&mut self.sink, v)?)
    }

    fn serialize_none(self) -> Result<(), SerdeError> {
        self.serialize_unit()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), SerdeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), SerdeError> {
        Ok(crate::encode::Null.encode(&mut self.sink)?)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), SerdeError> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), SerdeError> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), SerdeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), SerdeError> {
        self.variant(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound<'a>, SerdeError> {
        self.begin(Major::Array, len)
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'a>, SerdeError> {
        self.begin(Major::Array, Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Compound<'a>, SerdeError> {
        self.begin(Major::Array, Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Compound<'a>, SerdeError> {
        self.variant(variant)?;
        self.begin(Major::Array, Some(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Compound<'a>, SerdeError> {
        self.begin(Major::Map, len)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Compound<'a>, SerdeError> {
        self.begin(Major::Map, Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Compound<'a>, SerdeError> {
        self.variant(variant)?;
        self.begin(Major::Map, Some(len))
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), SerdeError> {
        self.element(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerdeError> {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SerdeError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = SerdeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SerdeError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), SerdeError> {
        self.finish()
    }
}

/// `depth` is how many more containers or tags may be entered below `item`.
struct ItemDeserializer<'de, S: ?Sized> {
    item: Item<'de, S>,
    depth: usize,
}

impl<'de, S: Contiguous + ?Sized> ItemDeserializer<'de, S> {
    const fn new(item: Item<'de, S>, depth: usize) -> Self {
        Self { item, depth }
    }

    /// Depth left for the children of `self.item`.
    fn descend(&self) -> Result<usize, SerdeError> {
        self.depth.checked_sub(1).ok_or_else(|| {
            SerdeError::from(CborError::new(
                ErrorCode::DepthLimitExceeded,
                self.item.offset(),
            ))
        })
    }

    fn is_unit(&self) -> bool {
        self.item.is_null() || self.item.is_undefined()
    }
}

impl<'de, S: Contiguous + ?Sized> de::Deserializer<'de> for ItemDeserializer<'de, S> {
    type Error = SerdeError;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerdeError> {
        let item = self.item;
        let head = item.head()?;
        match head.major() {
            Major::PosInt => visitor.visit_u64(head.argument()?),
            Major::NegInt => {
                let n = head.argument()?;
                match i64::try_from(n) {
                    Ok(n) => visitor.visit_i64(-1 - n),
                    Err(_) => visitor.visit_i128(-1 - i128::from(n)),
                }
            }
            Major::Bytes => visitor.visit_borrowed_bytes(item.get_bytes()?),
            Major::Utf8 => visitor.visit_borrowed_str(item.get_str()?),
            Major::Array => {
                let depth = self.descend()?;
                let array = item.as_array()?;
                visitor.visit_seq(SeqAccess {
                    iter: array.iter(),
                    depth,
                })
            }
            Major::Map => {
                let depth = self.descend()?;
                let map = item.as_map()?;
                visitor.visit_map(MapAccess {
                    iter: map.iter(),
                    value: None,
                    depth,
                })
            }
            Major::Tag => Self::new(item.untag()?, self.descend()?).deserialize_any(visitor),
            Major::Special => match classify(head)? {
                ItemType::Boolean => visitor.visit_bool(item.get::<bool>()?),
                ItemType::Null | ItemType::Undefined => visitor.visit_unit(),
                ItemType::Fp32 | ItemType::Fp64 => visitor.visit_f64(item.get::<f64>()?),
                _ => Err(unsupported(item.offset()).into()),
            },
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerdeError> {
        if self.is_unit() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SerdeError> {
        if self.is_unit() {
            visitor.visit_unit()
        } else {
            Err(wrong_kind(self.item.offset()).into())
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        let item = self.item;
        match item.head()?.major() {
            Major::Utf8 => visitor.visit_enum(BorrowedStrDeserializer::new(item.get_str()?)),
            Major::Map => {
                let depth = self.descend()?;
                let map = item.as_map()?;
                if map.len() != 1 {
                    return Err(wrong_kind(item.offset()).into());
                }
                let Some(entry) = map.iter().next() else {
                    return Err(wrong_kind(item.offset()).into());
                };
                let (key, value) = entry?;
                visitor.visit_enum(EnumAccess { key, value, depth })
            }
            Major::Tag => {
                Self::new(item.untag()?, self.descend()?).deserialize_enum(name, variants, visitor)
            }
            _ => Err(wrong_kind(item.offset()).into()),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf seq tuple tuple_struct map struct identifier
    }
}

struct SeqAccess<'de, S: ?Sized> {
    iter: ArrayIter<'de, S>,
    depth: usize,
}

impl<'de, S: Contiguous + ?Sized> de::SeqAccess<'de> for SeqAccess<'de, S> {
    type Error = SerdeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, SerdeError> {
        match self.iter.next() {
            None => Ok(None),
            Some(item) => seed
                .deserialize(ItemDeserializer::new(item?, self.depth))
                .map(Some),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.iter.size_hint().1
    }
}

struct MapAccess<'de, S: ?Sized> {
    iter: MapIter<'de, S>,
    value: Option<Item<'de, S>>,
    depth: usize,
}

impl<'de, S: Contiguous + ?Sized> de::MapAccess<'de> for MapAccess<'de, S> {
    type Error = SerdeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, SerdeError> {
        let Some(entry) = self.iter.next() else {
            return Ok(None);
        };
        let (key, value) = entry?;
        self.value = Some(value);
        seed.deserialize(ItemDeserializer::new(key, self.depth)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, SerdeError> {
        let value = self
            .value
            .take()
            .ok_or_else(|| SerdeError::with_code(ErrorCode::SerdeError))?;
        seed.deserialize(ItemDeserializer::new(value, self.depth))
    }

    fn size_hint(&self) -> Option<usize> {
        self.iter.size_hint().1
    }
}

struct EnumAccess<'de, S: ?Sized> {
    key: Item<'de, S>,
    value: Item<'de, S>,
    depth: usize,
}

impl<'de, S: Contiguous + ?Sized> de::EnumAccess<'de> for EnumAccess<'de, S> {
    type Error = SerdeError;
    type Variant = VariantAccess<'de, S>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), SerdeError> {
        let variant = seed.deserialize(ItemDeserializer::new(self.key, self.depth))?;
        let value = ItemDeserializer::new(self.value, self.depth);
        Ok((variant, VariantAccess { value }))
    }
}

struct VariantAccess<'de, S: ?Sized> {
    value: ItemDeserializer<'de, S>,
}

impl<'de, S: Contiguous + ?Sized> de::VariantAccess<'de> for VariantAccess<'de, S> {
    type Error = SerdeError;

    fn unit_variant(self) -> Result<(), SerdeError> {
        de::Deserializer::deserialize_unit(self.value, de::IgnoredAny)
            .map(|_| ())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, SerdeError> {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        de::Deserializer::deserialize_seq(self.value, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, SerdeError> {
        de::Deserializer::deserialize_map(self.value, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    enum Shape {
        Empty,
        Circle(u32),
        Rect { w: u8, h: u8 },
    }

    fn root(bytes: &[u8]) -> Item<'_, [u8]> {
        Item::new(bytes, crate::cursor::Cursor::root())
    }

    #[test]
    fn unknown_length_sequences_are_patched() {
        let v: Vec<u32> = (0..30).collect();
        let iter = v.iter().filter(|_| true);
        let bytes = to_vec(&SerializeIter(iter)).unwrap();
        assert_eq!(&bytes[..2], &[0x98, 30]);
        assert_eq!(root(&bytes).as_array().unwrap().len(), 30);
    }

    struct SerializeIter<I>(I);

    impl<I> Serialize for SerializeIter<I>
    where
        I: Iterator + Clone,
        I::Item: Serialize,
    {
        fn serialize<Z: ser::Serializer>(&self, s: Z) -> Result<Z::Ok, Z::Error> {
            s.collect_seq(self.0.clone())
        }
    }

    #[test]
    fn enums_use_names() {
        assert_eq!(to_vec(&Shape::Empty).unwrap(), b"\x65Empty");
        assert_eq!(
            to_vec(&Shape::Circle(2)).unwrap(),
            [0xa1, 0x66, b'C', b'i', b'r', b'c', b'l', b'e', 0x02]
        );
        for shape in [Shape::Empty, Shape::Circle(70_000), Shape::Rect { w: 1, h: 2 }] {
            let bytes = to_vec(&shape).unwrap();
            assert_eq!(root(&bytes).deserialize::<Shape>().unwrap(), shape);
        }
    }

    #[test]
    fn borrows_from_buffer() {
        let bytes = to_vec(&("key", 1i8, -300i64)).unwrap();
        let (s, a, b): (&str, i8, i64) = root(&bytes).deserialize().unwrap();
        assert_eq!((s, a, b), ("key", 1, -300));
        assert_eq!(s.as_ptr(), bytes[2..].as_ptr());
    }

    #[test]
    fn maps_and_options() {
        let mut m = BTreeMap::new();
        m.insert(String::from("a"), Some(1u8));
        m.insert(String::from("b"), None);
        let bytes = to_vec(&m).unwrap();
        assert_eq!(bytes, [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0xf6]);
        assert_eq!(root(&bytes).deserialize::<BTreeMap<String, Option<u8>>>().unwrap(), m);
    }

    #[test]
    fn errors_carry_codes() {
        let bytes = to_vec(&vec![300u16]).unwrap();
        let err = root(&bytes).deserialize::<Vec<u8>>().unwrap_err();
        assert_eq!(err.code, ErrorCode::SerdeError);
        let err = root(&[0x61, 0xff]).deserialize::<&str>().unwrap_err();
        assert_eq!((err.code, err.offset), (ErrorCode::Utf8Invalid, 0));
        assert_eq!(to_vec(&u128::MAX).unwrap_err().code, ErrorCode::Overflow);
        assert_eq!(
            to_vec(&-(1i128 << 64)).unwrap(),
            [0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }
}
