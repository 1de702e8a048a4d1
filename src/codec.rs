//! The buffer facade: the top-level item sequence as a collection.

use crate::cursor::Cursor;
use crate::error::out_of_bounds;
use crate::query::{ArrayIter, ArrayRef, Item, MapRef};
use crate::storage::Storage;
use crate::{parse, CborError, DecodeLimits};

#[cfg(feature = "alloc")]
use crate::edit::{self, expect_container, ArrayMut, ItemMut, MapMut};
#[cfg(feature = "alloc")]
use crate::error::{invalid_argument, length_overflow};
#[cfg(feature = "alloc")]
use crate::encode::{encode_to_vec, Encode};
#[cfg(feature = "alloc")]
use crate::head::{decode_head, Major};
#[cfg(feature = "alloc")]
use crate::storage::StorageMut;
#[cfg(feature = "alloc")]
use crate::wire;

/// A sequence of back-to-back items in caller-supplied storage.
///
/// `Codec` never copies the buffer: it reads, inserts and erases through the
/// [`Storage`] traits. Positions are [`Cursor`]s; every mutation invalidates cursors at or
/// after the first changed byte, so re-derive them (or use the cursor a mutator returns)
/// after each edit.
///
/// ```
/// use inplace_cbor::Codec;
///
/// let mut codec = Codec::new(Vec::new());
/// codec.push(0u8)?;
/// codec.push("foo")?;
/// assert_eq!(codec.size()?, 2);
/// assert_eq!(codec.get(1)?.get_str()?, "foo");
/// assert_eq!(codec.storage(), &[0x00, 0x63, b'f', b'o', b'o']);
/// # Ok::<(), inplace_cbor::CborError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codec<S> {
    storage: S,
}

impl<S> Codec<S> {
    /// Wrap existing storage. The contents are not validated; see [`Codec::validate`].
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The backing storage.
    #[inline]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Unwrap the backing storage.
    #[inline]
    pub fn into_inner(self) -> S {
        self.storage
    }
}

impl<S: Storage> Codec<S> {
    /// Returns `true` if the buffer holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of top-level items. Walks the whole buffer on every call.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    pub fn size(&self) -> Result<usize, CborError> {
        Ok(self.end()?.index())
    }

    /// Cursor at the first item.
    #[must_use]
    pub const fn begin(&self) -> Cursor {
        Cursor::root()
    }

    /// Cursor one past the last item.
    ///
    /// # Errors
    ///
    /// Returns the decode errors of the walk.
    pub fn end(&self) -> Result<Cursor, CborError> {
        let mut c = Cursor::root();
        while !c.is_end(&self.storage) {
            c = c.next_sibling(&self.storage)?;
        }
        Ok(c)
    }

    /// Cursor at `index` (`index == size()` gives the end cursor).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index > size()`.
    pub fn cursor(&self, index: usize) -> Result<Cursor, CborError> {
        Cursor::root().seek(&self.storage, index)
    }

    /// View of the item under `at`.
    #[must_use]
    pub const fn item(&self, at: Cursor) -> Item<'_, S> {
        Item::new(&self.storage, at)
    }

    /// The item at `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= size()`.
    pub fn get(&self, index: usize) -> Result<Item<'_, S>, CborError> {
        let c = self.cursor(index)?;
        if c.is_end(&self.storage) {
            return Err(out_of_bounds(c.offset()));
        }
        Ok(self.item(c))
    }

    /// The first item.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the buffer is empty.
    pub fn front(&self) -> Result<Item<'_, S>, CborError> {
        self.get(0)
    }

    /// The last item.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the buffer is empty.
    pub fn back(&self) -> Result<Item<'_, S>, CborError> {
        let end = self.end()?;
        Ok(self.item(end.prev_sibling(&self.storage)?))
    }

    /// Iterate over the top-level items.
    #[must_use]
    pub const fn iter(&self) -> ArrayIter<'_, S> {
        ArrayIter::new(&self.storage, Cursor::root(), usize::MAX)
    }

    /// View of the array under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn array(&self, at: Cursor) -> Result<ArrayRef<'_, S>, CborError> {
        ArrayRef::new(&self.storage, at)
    }

    /// View of the map under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn map(&self, at: Cursor) -> Result<MapRef<'_, S>, CborError> {
        MapRef::new(&self.storage, at)
    }

    /// Check the whole buffer; returns the number of top-level items.
    ///
    /// # Errors
    ///
    /// See [`validate`](crate::validate).
    pub fn validate(&self, limits: DecodeLimits) -> Result<usize, CborError> {
        parse::validate(&self.storage, limits)
    }

    /// SHA-256 of the whole buffer.
    ///
    /// # Errors
    ///
    /// Returns storage read errors.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    pub fn sha256(&self) -> Result<[u8; 32], CborError> {
        crate::digest::sha256_range(&self.storage, 0..self.storage.len())
    }
}

impl<'a, S: Storage> IntoIterator for &'a Codec<S> {
    type Item = Result<Item<'a, S>, CborError>;
    type IntoIter = ArrayIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "alloc")]
#[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
impl<S: StorageMut> Codec<S> {
    /// Append `value` after the last item.
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn push<T: Encode>(&mut self, value: T) -> Result<(), CborError> {
        let bytes = encode_to_vec(&value)?;
        let end = self.storage.len();
        edit::append(&mut self.storage, end, &bytes)?;
        Ok(())
    }

    /// Serialize `value` with serde and append it as one item.
    ///
    /// # Errors
    ///
    /// See [`crate::to_vec`].
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn push_serialize<T: serde::Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), CborError> {
        let bytes = crate::serde_impl::to_vec(value)?;
        let end = self.storage.len();
        edit::append(&mut self.storage, end, &bytes)?;
        Ok(())
    }

    /// Same as [`Codec::push`].
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn push_back<T: Encode>(&mut self, value: T) -> Result<(), CborError> {
        self.push(value)
    }

    /// Insert `value` before the first item.
    ///
    /// # Errors
    ///
    /// Returns encoding and storage errors.
    pub fn push_front<T: Encode>(&mut self, value: T) -> Result<(), CborError> {
        self.insert(Cursor::root(), value).map(|_| ())
    }

    /// Remove the first item.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the buffer is empty.
    pub fn pop_front(&mut self) -> Result<(), CborError> {
        self.remove(Cursor::root()).map(|_| ())
    }

    /// Remove the last item.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if the buffer is empty.
    pub fn pop_back(&mut self) -> Result<(), CborError> {
        let last = self.end()?.prev_sibling(&self.storage)?;
        self.remove(last).map(|_| ())
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Insert `value` before the item under `at`, in any scope. Inside an array the
    /// array's count grows by one. Returns the cursor of the inserted item.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `at` is inside a map (entries come in pairs; use
    /// [`MapMut::insert`]) or a tag (which holds exactly one item).
    pub fn insert<T: Encode>(&mut self, at: Cursor, value: T) -> Result<Cursor, CborError> {
        let bytes = encode_to_vec(&value)?;
        let container = self.container_of(at, 1)?;
        self.storage.insert_at(at.offset(), &bytes)?;
        self.resize_scope(at, container, 1, true)
    }

    /// Remove the items in `[from, to)`. Both cursors must belong to the same scope.
    /// Returns the cursor now at `from`'s position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `to` precedes `from`, if the range would split a map
    /// entry, or if it would empty a tag.
    pub fn erase(&mut self, from: Cursor, to: Cursor) -> Result<Cursor, CborError> {
        debug_assert_eq!(
            from.scope(),
            to.scope(),
            "erasing between cursors from different scopes"
        );
        if from.scope() != to.scope() || to.index() < from.index() {
            return Err(invalid_argument(from.offset()));
        }
        let n = to.index() - from.index();
        if n == 0 {
            return Ok(from);
        }
        let container = self.container_of(from, n)?;
        self.storage.erase(from.offset()..to.offset())?;
        self.resize_scope(from, container, n, false)
    }

    /// Remove the item under `at`. Returns the cursor of the item that followed it.
    ///
    /// # Errors
    ///
    /// See [`Codec::erase`]; `IndexOutOfBounds` if `at` is an end cursor.
    pub fn remove(&mut self, at: Cursor) -> Result<Cursor, CborError> {
        let next = at.next_sibling(&self.storage)?;
        self.erase(at, next)
    }

    /// Replace the item under `at` with the encoding of `value`.
    ///
    /// # Errors
    ///
    /// Returns encoding, decode and storage errors.
    pub fn replace<T: Encode>(&mut self, at: Cursor, value: T) -> Result<(), CborError> {
        ItemMut::new(&mut self.storage, at).set(value)
    }

    /// Replace the item under `at` with a copy of the item under `src`. The source bytes
    /// are copied out first, so `src` may be `at` itself or any item after it.
    ///
    /// # Errors
    ///
    /// Returns decode and storage errors.
    pub fn replace_with_item(&mut self, at: Cursor, src: Cursor) -> Result<(), CborError> {
        let bytes = edit::copy_item(&self.storage, src.offset())?;
        edit::replace(&mut self.storage, at.offset(), &bytes)?;
        Ok(())
    }

    /// Mutable view of the item under `at`.
    pub fn item_mut(&mut self, at: Cursor) -> ItemMut<'_, S> {
        ItemMut::new(&mut self.storage, at)
    }

    /// Mutable view of the array under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not an array.
    pub fn array_mut(&mut self, at: Cursor) -> Result<ArrayMut<'_, S>, CborError> {
        ArrayMut::new(&mut self.storage, at)
    }

    /// Mutable view of the map under `at`.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the item is not a map.
    pub fn map_mut(&mut self, at: Cursor) -> Result<MapMut<'_, S>, CborError> {
        MapMut::new(&mut self.storage, at)
    }

    /// Head offset of the array enclosing `at` when `n` children may be added or removed
    /// there; `None` at the top level.
    fn container_of(&self, at: Cursor, n: usize) -> Result<Option<(usize, Major)>, CborError> {
        let Some(off) = at.scope().container() else {
            return Ok(None);
        };
        match expect_container(&self.storage, off)? {
            Major::Array => Ok(Some((off, Major::Array))),
            Major::Map if n % 2 == 0 && at.index() % 2 == 0 => Ok(Some((off, Major::Map))),
            _ => Err(invalid_argument(at.offset())),
        }
    }

    /// Rewrite the enclosing container's count after `n` children were inserted or
    /// erased at `at`, and return `at` rebased past the head rewrite.
    fn resize_scope(
        &mut self,
        at: Cursor,
        container: Option<(usize, Major)>,
        n: usize,
        grow: bool,
    ) -> Result<Cursor, CborError> {
        let Some((off, major)) = container else {
            return Ok(at);
        };
        let units = if major == Major::Map { n / 2 } else { n };
        let units = u64::try_from(units).map_err(|_| length_overflow(off))?;
        let count = decode_head(&self.storage, off)?.argument()?;
        let count = if grow {
            count.checked_add(units)
        } else {
            count.checked_sub(units)
        }
        .ok_or_else(|| invalid_argument(off))?;
        let delta = edit::set_header_argument(&mut self.storage, off, count)?;
        let children = wire::child_count(&self.storage, off)?;
        let at = at.rebase(off + 1, delta);
        Ok(at.with_scope(at.scope().with_len(children)))
    }
}
