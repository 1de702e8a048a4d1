//! In-place mutation.
//!
//! Every edit is an erase and/or insert on the backing storage followed, when a
//! container's child count changes, by a rewrite of that container's head. A head
//! rewrite may change the head length (for example an array growing from 23 to 24
//! elements moves from a 1-byte to a 2-byte head), so every offset after the rewritten
//! head shifts by the returned delta.

use alloc::vec::Vec;

use crate::alloc_util::try_vec_with_capacity;
use crate::cursor::Cursor;
use crate::encode::{encode_to_vec, Encode};
use crate::error::{invalid_argument, length_overflow, out_of_bounds, wrong_kind};
use crate::head::{decode_head, EncodedHead, Major};
use crate::limits::DecodeLimits;
use crate::parse::validate;
use crate::query::{expect_major, ArrayRef, Item, MapRef};
use crate::storage::{Storage, StorageMut};
use crate::{wire, CborError};

/// Insert `bytes` at `pos`. Returns the position just past the inserted bytes and the
/// new storage length, ready for the next append at the same logical write position.
///
/// # Errors
///
/// Returns `UnexpectedEof` if `pos` is past the end and `AllocationFailed` if the
/// storage cannot grow.
pub fn append<S: StorageMut + ?Sized>(
    s: &mut S,
    pos: usize,
    bytes: &[u8],
) -> Result<(usize, usize), CborError> {
    s.insert_at(pos, bytes)?;
    let next = pos
        .checked_add(bytes.len())
        .ok_or_else(|| length_overflow(pos))?;
    Ok((next, s.len()))
}

/// Rewrite the argument of the head at `offset` in its shortest form, growing or
/// shrinking the storage when the head length changes. Returns the change in length.
///
/// # Errors
///
/// Returns `UnsupportedFeature` for indefinite-length heads and the head decoding errors.
#[allow(clippy::cast_possible_wrap)]
pub fn set_header_argument<S: StorageMut + ?Sized>(
    s: &mut S,
    offset: usize,
    arg: u64,
) -> Result<isize, CborError> {
    let old = decode_head(&*s, offset)?;
    old.argument()?;
    let new = EncodedHead::new(old.major(), arg);
    let (old_len, new_len) = (old.size(), new.len());
    if new_len > old_len {
        let filler = [0u8; 8];
        s.insert_at(offset + old_len, &filler[..new_len - old_len])?;
    } else if new_len < old_len {
        s.erase(offset + new_len..offset + old_len)?;
    }
    s.write_at(offset, new.as_bytes())?;
    Ok(new_len as isize - old_len as isize)
}

/// Replace the complete item at `offset` with `bytes`. Returns the offset just past the
/// new item.
///
/// # Errors
///
/// Returns the decode errors of the item being replaced and the storage errors.
pub fn replace<S: StorageMut + ?Sized>(
    s: &mut S,
    offset: usize,
    bytes: &[u8],
) -> Result<usize, CborError> {
    let end = wire::skip_item(&*s, offset)?;
    s.erase(offset..end)?;
    Ok(append(s, offset, bytes)?.0)
}

/// Append `values` to the array whose head is at `offset`. Returns the offset just past
/// the array.
///
/// # Errors
///
/// Returns `WrongKind` if the item is not an array, plus encoding and storage errors.
pub fn push_back<S, I>(s: &mut S, offset: usize, values: I) -> Result<usize, CborError>
where
    S: StorageMut + ?Sized,
    I: IntoIterator,
    I::Item: Encode,
{
    let head = expect_major(&*s, offset, Major::Array)?;
    let mut bytes = Vec::new();
    let mut added = 0u64;
    for v in values {
        bytes.extend_from_slice(&encode_to_vec(&v)?);
        added += 1;
    }
    let count = head
        .argument()?
        .checked_add(added)
        .ok_or_else(|| length_overflow(offset))?;
    let end = wire::skip_item(&*s, offset)?;
    let delta = set_header_argument(s, offset, count)?;
    let end = end.saturating_add_signed(delta);
    Ok(append(s, end, &bytes)?.0)
}

/// Copy the complete encoding of the item at `offset` out of the storage.
///
/// # Errors
///
/// Returns the decode errors of the walk and `AllocationFailed`.
pub fn copy_item<S: Storage + ?Sized>(s: &S, offset: usize) -> Result<Vec<u8>, CborError> {
    let end = wire::skip_item(s, offset)?;
    let mut out = try_vec_with_capacity(end - offset, offset)?;
    out.resize(end - offset, 0);
    s.read_at(offset, &mut out)?;
    Ok(out)
}

fn adjust_count<S: StorageMut + ?Sized>(
    s: &mut S,
    offset: usize,
    grow: bool,
    n: u64,
) -> Result<isize, CborError> {
    let count = decode_head(&*s, offset)?.argument()?;
    let count = if grow {
        count.checked_add(n).ok_or_else(|| length_overflow(offset))?
    } else {
        count.checked_sub(n).ok_or_else(|| invalid_argument(offset))?
    };
    set_header_argument(s, offset, count)
}

/// Mutable view of one item.
#[derive(Debug)]
pub struct ItemMut<'a, S: ?Sized> {
    storage: &'a mut S,
    at: Cursor,
}

impl<'a, S: StorageMut + ?Sized> ItemMut<'a, S> {
    /// View the item under `at`.
    pub fn new(storage: &'a mut S, at: Cursor) -> Self {
        Self { storage, at }
    }

    /// Read-only view of the item.
    #[must_use]
    pub fn item(&self) -> Item<'_, S> {
        Item::new(&*self.storage, self.at)
    }

    /// Replace the item with the encoding of `value`.
    ///
    /// # Errors
    ///
    /// Returns encoding, decode and storage errors.
    pub fn set<T: Encode>(&mut self, value: T) -> Result<(), CborError> {
        let bytes = encode_to_vec(&value)?;
        self.set_raw(&bytes)
    }

    /// Replace the item with `bytes`, which must hold exactly one complete item that
    /// [`validate`](crate::validate) accepts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bytes` is not exactly one well-formed item.
    pub fn set_raw(&mut self, bytes: &[u8]) -> Result<(), CborError> {
        if validate(bytes, DecodeLimits::unlimited()).ok() != Some(1) {
            return Err(invalid_argument(self.at.offset()));
        }
        replace(self.storage, self.at.offset(), bytes)?;
        Ok(())
    }

    /// Treat the item as an array.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn into_array(self) -> Result<ArrayMut<'a, S>, CborError> {
        ArrayMut::new(self.storage, self.at)
    }

    /// Treat the item as a map.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn into_map(self) -> Result<MapMut<'a, S>, CborError> {
        MapMut::new(self.storage, self.at)
    }
}

/// Mutable view of an array. Child count changes rewrite the array head.
#[derive(Debug)]
pub struct ArrayMut<'a, S: ?Sized> {
    storage: &'a mut S,
    at: Cursor,
}

impl<'a, S: StorageMut + ?Sized> ArrayMut<'a, S> {
    /// View the array under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn new(storage: &'a mut S, at: Cursor) -> Result<Self, CborError> {
        expect_major(&*storage, at.offset(), Major::Array)?;
        Ok(Self { storage, at })
    }

    /// Read-only view of the array.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn view(&self) -> Result<ArrayRef<'_, S>, CborError> {
        ArrayRef::new(&*self.storage, self.at)
    }

    /// Number of elements.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn len(&self) -> Result<usize, CborError> {
        Ok(self.view()?.len())
    }

    /// Returns `true` if the array has no elements.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn is_empty(&self) -> Result<bool, CborError> {
        Ok(self.len()? == 0)
    }

    /// The element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<Item<'_, S>, CborError> {
        ArrayRef::new(&*self.storage, self.at)?.get(index)
    }

    fn child(&self, index: usize) -> Result<Cursor, CborError> {
        Ok(self.get(index)?.cursor())
    }

    /// Append one element.
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn push<T: Encode>(&mut self, value: T) -> Result<(), CborError> {
        push_back(self.storage, self.at.offset(), [value])?;
        Ok(())
    }

    /// Append every element of `values` with a single head rewrite.
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn extend<I>(&mut self, values: I) -> Result<(), CborError>
    where
        I: IntoIterator,
        I::Item: Encode,
    {
        push_back(self.storage, self.at.offset(), values)?;
        Ok(())
    }

    /// Insert `value` before the element at `index` (`index == len()` appends).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index > len()`.
    pub fn insert<T: Encode>(&mut self, index: usize, value: T) -> Result<(), CborError> {
        let array = self.view()?;
        if index > array.len() {
            return Err(out_of_bounds(self.at.offset()));
        }
        let pos = array.begin().seek(&*self.storage, index)?.offset();
        let bytes = encode_to_vec(&value)?;
        self.storage.insert_at(pos, &bytes)?;
        adjust_count(self.storage, self.at.offset(), true, 1)?;
        Ok(())
    }

    /// Remove the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<(), CborError> {
        let start = self.child(index)?.offset();
        let end = wire::skip_item(&*self.storage, start)?;
        self.storage.erase(start..end)?;
        adjust_count(self.storage, self.at.offset(), false, 1)?;
        Ok(())
    }

    /// Replace the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`.
    pub fn set<T: Encode>(&mut self, index: usize, value: T) -> Result<(), CborError> {
        let at = self.child(index)?;
        ItemMut::new(&mut *self.storage, at).set(value)
    }

    /// Mutable view of the nested array at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` or `WrongKind`.
    pub fn array_mut(&mut self, index: usize) -> Result<ArrayMut<'_, S>, CborError> {
        let at = self.child(index)?;
        ArrayMut::new(&mut *self.storage, at)
    }

    /// Mutable view of the nested map at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` or `WrongKind`.
    pub fn map_mut(&mut self, index: usize) -> Result<MapMut<'_, S>, CborError> {
        let at = self.child(index)?;
        MapMut::new(&mut *self.storage, at)
    }
}

/// Mutable view of a map. Entries are appended in insertion order; keys are not
/// deduplicated.
#[derive(Debug)]
pub struct MapMut<'a, S: ?Sized> {
    storage: &'a mut S,
    at: Cursor,
}

impl<'a, S: StorageMut + ?Sized> MapMut<'a, S> {
    /// View the map under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn new(storage: &'a mut S, at: Cursor) -> Result<Self, CborError> {
        expect_major(&*storage, at.offset(), Major::Map)?;
        Ok(Self { storage, at })
    }

    /// Read-only view of the map.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn view(&self) -> Result<MapRef<'_, S>, CborError> {
        MapRef::new(&*self.storage, self.at)
    }

    /// Number of entries.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn len(&self) -> Result<usize, CborError> {
        Ok(self.view()?.len())
    }

    /// Returns `true` if the map has no entries.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors.
    pub fn is_empty(&self) -> Result<bool, CborError> {
        Ok(self.len()? == 0)
    }

    /// Append the entry `key: value`.
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn insert<K: Encode, V: Encode>(&mut self, key: K, value: V) -> Result<(), CborError> {
        let mut bytes = encode_to_vec(&key)?;
        bytes.extend_from_slice(&encode_to_vec(&value)?);
        let end = wire::skip_item(&*self.storage, self.at.offset())?;
        let delta = adjust_count(self.storage, self.at.offset(), true, 1)?;
        append(self.storage, end.saturating_add_signed(delta), &bytes)?;
        Ok(())
    }

    /// Remove the first entry whose key is the text string `key`. Returns `false` if no
    /// such entry exists.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the scan.
    pub fn remove(&mut self, key: &str) -> Result<bool, CborError> {
        let Some((k, v)) = self.view()?.entry(key)? else {
            return Ok(false);
        };
        let (start, value_at) = (k.offset(), v.offset());
        let end = wire::skip_item(&*self.storage, value_at)?;
        self.storage.erase(start..end)?;
        adjust_count(self.storage, self.at.offset(), false, 1)?;
        Ok(true)
    }

    /// Mutable view of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the scan.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<ItemMut<'_, S>>, CborError> {
        let found = self.view()?.get(key)?.map(Item::cursor);
        Ok(found.map(|at| ItemMut::new(&mut *self.storage, at)))
    }
}

/// Returns `WrongKind` unless the item at `offset` is a container.
pub(crate) fn expect_container<S: Storage + ?Sized>(
    s: &S,
    offset: usize,
) -> Result<Major, CborError> {
    let major = decode_head(s, offset)?.major();
    match major {
        Major::Array | Major::Map | Major::Tag => Ok(major),
        _ => Err(wrong_kind(offset)),
    }
}
