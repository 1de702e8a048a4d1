//! Borrowed views over items in a buffer.
//!
//! An [`Item`] is a storage reference plus a [`Cursor`]. Views decode lazily: nothing is
//! parsed until an accessor asks for it, and every accessor re-reads the head from the
//! storage. Payload slices (`get_bytes`, `get_str`, `as_encoded`) borrow from the buffer
//! and are only available over [`Contiguous`] storage.

use core::fmt;

use crate::cursor::Cursor;
use crate::error::{eof, length_overflow, out_of_bounds, wrong_kind};
use crate::head::{decode_head, Head, Major, IB_NULL, IB_UNDEFINED};
use crate::scalar::{classify, FromItem, ItemType, Tag};
use crate::storage::{Contiguous, Storage};
use crate::{utf8, wire, CborError};

/// A read-only view of one item.
pub struct Item<'a, S: ?Sized> {
    storage: &'a S,
    cursor: Cursor,
}

impl<S: ?Sized> Clone for Item<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for Item<'_, S> {}

impl<S: ?Sized> fmt::Debug for Item<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item").field("cursor", &self.cursor).finish()
    }
}

impl<'a, S: Storage + ?Sized> Item<'a, S> {
    /// View the item under `cursor`.
    #[must_use]
    pub const fn new(storage: &'a S, cursor: Cursor) -> Self {
        Self { storage, cursor }
    }

    /// The cursor this view wraps.
    #[inline]
    #[must_use]
    pub const fn cursor(self) -> Cursor {
        self.cursor
    }

    /// Byte offset of the item head.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.cursor.offset()
    }

    /// The underlying storage.
    #[inline]
    #[must_use]
    pub const fn storage(self) -> &'a S {
        self.storage
    }

    /// Decode the item head.
    ///
    /// # Errors
    ///
    /// Returns `MalformedHead` or `UnexpectedEof` for a bad head.
    pub fn head(self) -> Result<Head, CborError> {
        self.cursor.head(self.storage)
    }

    /// Decode the item as `T`.
    ///
    /// # Errors
    ///
    /// See [`FromItem::from_item`].
    pub fn get<T: FromItem>(self) -> Result<T, CborError> {
        T::from_item(self.storage, self.offset())
    }

    /// The tag number of a tag item.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a tag.
    pub fn get_tag(self) -> Result<Tag, CborError> {
        self.get()
    }

    /// Classify the item.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFeature` for extended simple values.
    pub fn kind(self) -> Result<ItemType, CborError> {
        classify(self.head()?)
    }

    /// Returns `true` if the item is `null`.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.storage.byte_at(self.offset()).ok() == Some(IB_NULL)
    }

    /// Returns `true` if the item is `undefined`.
    #[must_use]
    pub fn is_undefined(self) -> bool {
        self.storage.byte_at(self.offset()).ok() == Some(IB_UNDEFINED)
    }

    /// The view of the next item in the same scope.
    ///
    /// # Errors
    ///
    /// See [`Cursor::next_sibling`].
    pub fn next(self) -> Result<Self, CborError> {
        Ok(Self::new(self.storage, self.cursor.next_sibling(self.storage)?))
    }

    /// The item enclosed by a tag.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a tag.
    pub fn untag(self) -> Result<Self, CborError> {
        if self.head()?.major() != Major::Tag {
            return Err(wrong_kind(self.offset()));
        }
        self.enter()
    }

    /// The first child of an array, map or tag.
    ///
    /// # Errors
    ///
    /// See [`Cursor::enter`].
    pub fn enter(self) -> Result<Self, CborError> {
        Ok(Self::new(self.storage, self.cursor.enter(self.storage)?))
    }

    /// Full encoded size in bytes, including every nested child.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    pub fn encoded_len(self) -> Result<usize, CborError> {
        let end = wire::skip_item(self.storage, self.offset())?;
        Ok(end - self.offset())
    }

    /// View the item as an array.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn as_array(self) -> Result<ArrayRef<'a, S>, CborError> {
        ArrayRef::new(self.storage, self.cursor)
    }

    /// View the item as a map.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn as_map(self) -> Result<MapRef<'a, S>, CborError> {
        MapRef::new(self.storage, self.cursor)
    }

    /// SHA-256 of the item's full encoded span.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    pub fn sha256(self) -> Result<[u8; 32], CborError> {
        let end = wire::skip_item(self.storage, self.offset())?;
        crate::digest::sha256_range(self.storage, self.offset()..end)
    }

    /// Returns `true` if the text item's payload equals `key`. Reads through the storage,
    /// so this works for non-contiguous buffers too.
    fn text_eq(self, key: &str) -> Result<bool, CborError> {
        let head = self.head()?;
        if head.major() != Major::Utf8 || head.payload_len()? != key.len() {
            return Ok(false);
        }
        let mut buf = [0u8; 64];
        let mut pos = self.offset() + head.size();
        for chunk in key.as_bytes().chunks(buf.len()) {
            let got = &mut buf[..chunk.len()];
            self.storage.read_at(pos, got)?;
            if got != chunk {
                return Ok(false);
            }
            pos += chunk.len();
        }
        Ok(true)
    }
}

impl<'a, S: Contiguous + ?Sized> Item<'a, S> {
    fn payload(self, major: Major) -> Result<&'a [u8], CborError> {
        let off = self.offset();
        let head = self.head()?;
        if head.major() != major {
            return Err(wrong_kind(off));
        }
        let start = off + head.size();
        let end = start
            .checked_add(head.payload_len()?)
            .ok_or_else(|| length_overflow(off))?;
        self.storage.as_slice().get(start..end).ok_or_else(|| eof(off))
    }

    /// Zero-copy payload of a byte string.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for other items and `UnsupportedFeature` for indefinite-length
    /// byte strings.
    pub fn get_bytes(self) -> Result<&'a [u8], CborError> {
        self.payload(Major::Bytes)
    }

    /// Zero-copy payload of a text string, without UTF-8 validation.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for other items and `UnsupportedFeature` for indefinite-length
    /// text strings.
    pub fn get_string(self) -> Result<&'a [u8], CborError> {
        self.payload(Major::Utf8)
    }

    /// Zero-copy payload of a text string, validated as UTF-8.
    ///
    /// # Errors
    ///
    /// As [`Item::get_string`], plus `Utf8Invalid`.
    pub fn get_str(self) -> Result<&'a str, CborError> {
        utf8::validate(self.get_string()?, self.offset())
    }

    /// The item's complete encoding, including every nested child.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    pub fn as_encoded(self) -> Result<&'a [u8], CborError> {
        let end = wire::skip_item(self.storage, self.offset())?;
        self.storage
            .as_slice()
            .get(self.offset()..end)
            .ok_or_else(|| eof(self.offset()))
    }
}

/// Read-only view of an array.
pub struct ArrayRef<'a, S: ?Sized> {
    storage: &'a S,
    at: Cursor,
    first: Cursor,
    len: usize,
}

impl<S: ?Sized> Clone for ArrayRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for ArrayRef<'_, S> {}

impl<S: ?Sized> fmt::Debug for ArrayRef<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("offset", &self.at.offset())
            .field("len", &self.len)
            .finish()
    }
}

fn scope_len(n: u64, off: usize) -> Result<usize, CborError> {
    usize::try_from(n).map_err(|_| length_overflow(off))
}

impl<'a, S: Storage + ?Sized> ArrayRef<'a, S> {
    /// View the array under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn new(storage: &'a S, at: Cursor) -> Result<Self, CborError> {
        if at.head(storage)?.major() != Major::Array {
            return Err(wrong_kind(at.offset()));
        }
        let first = at.enter(storage)?;
        let len = scope_len(first.scope().len().unwrap_or(0), at.offset())?;
        Ok(Self {
            storage,
            at,
            first,
            len,
        })
    }

    /// Byte offset of the array head.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.at.offset()
    }

    /// The cursor at the array head.
    #[must_use]
    pub const fn cursor(self) -> Cursor {
        self.at
    }

    /// Number of elements declared by the head.
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Cursor at the first element (equal to [`ArrayRef::end`] when empty).
    #[must_use]
    pub const fn begin(self) -> Cursor {
        self.first
    }

    /// Cursor one past the last element. Walks every element.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    pub fn end(self) -> Result<Cursor, CborError> {
        self.first.seek(self.storage, self.len)
    }

    /// The element at `index`. Walks `index` elements.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`.
    pub fn get(self, index: usize) -> Result<Item<'a, S>, CborError> {
        if index >= self.len {
            return Err(out_of_bounds(self.offset()));
        }
        Ok(Item::new(self.storage, self.first.seek(self.storage, index)?))
    }

    /// Iterate over the elements in order.
    #[must_use]
    pub const fn iter(self) -> ArrayIter<'a, S> {
        ArrayIter {
            storage: self.storage,
            cursor: self.first,
            remaining: self.len,
        }
    }
}

impl<'a, S: Storage + ?Sized> IntoIterator for ArrayRef<'a, S> {
    type Item = Result<Item<'a, S>, CborError>;
    type IntoIter = ArrayIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over consecutive items of one scope.
///
/// Yields `Result` so a malformed element ends the iteration with an error instead of a
/// panic.
pub struct ArrayIter<'a, S: ?Sized> {
    storage: &'a S,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, S: ?Sized> ArrayIter<'a, S> {
    pub(crate) const fn new(storage: &'a S, cursor: Cursor, remaining: usize) -> Self {
        Self {
            storage,
            cursor,
            remaining,
        }
    }
}

impl<'a, S: Storage + ?Sized> Iterator for ArrayIter<'a, S> {
    type Item = Result<Item<'a, S>, CborError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.cursor.is_end(self.storage) {
            return None;
        }
        let item = Item::new(self.storage, self.cursor);
        match self.cursor.next_sibling(self.storage) {
            Ok(next) => {
                self.cursor = next;
                self.remaining -= 1;
                Some(Ok(item))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Read-only view of a map. Entries keep their encoded (insertion) order.
pub struct MapRef<'a, S: ?Sized> {
    storage: &'a S,
    at: Cursor,
    first: Cursor,
    pairs: usize,
}

impl<S: ?Sized> Clone for MapRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for MapRef<'_, S> {}

impl<S: ?Sized> fmt::Debug for MapRef<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRef")
            .field("offset", &self.at.offset())
            .field("pairs", &self.pairs)
            .finish()
    }
}

impl<'a, S: Storage + ?Sized> MapRef<'a, S> {
    /// View the map under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn new(storage: &'a S, at: Cursor) -> Result<Self, CborError> {
        let head = at.head(storage)?;
        if head.major() != Major::Map {
            return Err(wrong_kind(at.offset()));
        }
        let pairs = scope_len(head.argument()?, at.offset())?;
        Ok(Self {
            storage,
            at,
            first: at.enter(storage)?,
            pairs,
        })
    }

    /// Byte offset of the map head.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.at.offset()
    }

    /// The cursor at the map head.
    #[must_use]
    pub const fn cursor(self) -> Cursor {
        self.at
    }

    /// Number of key/value pairs.
    #[must_use]
    pub const fn len(self) -> usize {
        self.pairs
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.pairs == 0
    }

    /// Iterate over `(key, value)` pairs in encoded order.
    #[must_use]
    pub const fn iter(self) -> MapIter<'a, S> {
        MapIter {
            storage: self.storage,
            cursor: self.first,
            remaining: self.pairs,
        }
    }

    /// The value of the first entry whose key is a text string equal to `key`.
    /// Non-text keys are skipped.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the scan.
    pub fn get(self, key: &str) -> Result<Option<Item<'a, S>>, CborError> {
        Ok(self.entry(key)?.map(|(_, v)| v))
    }

    /// Like [`MapRef::get`] but returns the key view as well.
    pub(crate) fn entry(self, key: &str) -> Result<Option<(Item<'a, S>, Item<'a, S>)>, CborError> {
        for pair in self.iter() {
            let (k, v) = pair?;
            if k.text_eq(key)? {
                return Ok(Some((k, v)));
            }
        }
        Ok(None)
    }
}

impl<'a, S: Storage + ?Sized> IntoIterator for MapRef<'a, S> {
    type Item = Result<(Item<'a, S>, Item<'a, S>), CborError>;
    type IntoIter = MapIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a map.
pub struct MapIter<'a, S: ?Sized> {
    storage: &'a S,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, S: Storage + ?Sized> MapIter<'a, S> {
    fn step(&mut self) -> Result<(Item<'a, S>, Item<'a, S>), CborError> {
        let key = Item::new(self.storage, self.cursor);
        let value_at = self.cursor.next_sibling(self.storage)?;
        self.cursor = value_at.next_sibling(self.storage)?;
        Ok((key, Item::new(self.storage, value_at)))
    }
}

impl<'a, S: Storage + ?Sized> Iterator for MapIter<'a, S> {
    type Item = Result<(Item<'a, S>, Item<'a, S>), CborError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.step() {
            Ok(pair) => {
                self.remaining -= 1;
                Some(Ok(pair))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Decode the head at `offset` and check its major type.
pub(crate) fn expect_major<S: Storage + ?Sized>(
    s: &S,
    offset: usize,
    major: Major,
) -> Result<Head, CborError> {
    let head = decode_head(s, offset)?;
    if head.major() != major {
        return Err(wrong_kind(offset));
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    // {"a": 1, 2: "b", "c": [true, h'0102']}
    const MAP: &[u8] = &[
        0xa3, 0x61, b'a', 0x01, 0x02, 0x61, b'b', 0x61, b'c', 0x82, 0xf5, 0x42, 0x01, 0x02,
    ];

    #[test]
    fn map_lookup_skips_non_text_keys() {
        let m = Item::new(MAP, Cursor::root()).as_map().unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("a").unwrap().unwrap().get::<u8>().unwrap(), 1);
        assert!(m.get("b").unwrap().is_none());
        let arr = m.get("c").unwrap().unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert!(arr.get(0).unwrap().get::<bool>().unwrap());
        assert_eq!(arr.get(1).unwrap().get_bytes().unwrap(), &[1, 2]);
        assert_eq!(
            arr.get(2).unwrap_err().code,
            ErrorCode::IndexOutOfBounds
        );
        assert_eq!(arr.end().unwrap().offset(), MAP.len());
    }

    #[test]
    fn iterators_yield_every_entry() {
        let m = Item::new(MAP, Cursor::root()).as_map().unwrap();
        let mut keys = m.iter().map(|p| p.unwrap().0.kind().unwrap());
        assert_eq!(keys.next(), Some(ItemType::String));
        assert_eq!(keys.next(), Some(ItemType::Int32));
        assert_eq!(keys.next(), Some(ItemType::String));
        assert_eq!(keys.next(), None);
        let root = Item::new(MAP, Cursor::root());
        assert_eq!(root.encoded_len().unwrap(), MAP.len());
        assert_eq!(root.as_encoded().unwrap(), MAP);
        assert_eq!(root.as_array().unwrap_err().code, ErrorCode::WrongKind);
    }

    #[test]
    fn truncated_array_iteration_stops_with_error() {
        let b: &[u8] = &[0x83, 0x01, 0x62, b'a'];
        let mut it = Item::new(b, Cursor::root()).as_array().unwrap().iter();
        assert!(it.next().unwrap().is_ok());
        assert_eq!(
            it.next().unwrap().unwrap_err().code,
            ErrorCode::UnexpectedEof
        );
        assert!(it.next().is_none());
    }

    #[test]
    fn untag_and_text() {
        // 32("a\u{e9}")
        let b: &[u8] = &[0xd8, 0x20, 0x63, b'a', 0xc3, 0xa9];
        let item = Item::new(b, Cursor::root());
        assert_eq!(item.get_tag().unwrap(), Tag(32));
        let inner = item.untag().unwrap();
        assert_eq!(inner.get_str().unwrap(), "a\u{e9}");
        assert_eq!(inner.untag().unwrap_err().code, ErrorCode::WrongKind);
        let bad: &[u8] = &[0x61, 0xff];
        assert_eq!(
            Item::new(bad, Cursor::root()).get_str().unwrap_err().code,
            ErrorCode::Utf8Invalid
        );
    }
}
