//! Scope-tagged positions over a flat buffer of items.
//!
//! A [`Cursor`] is a plain value: a byte offset, the [`Scope`] it walks, and its index in
//! that scope. Stepping forward skips one complete item; there are no back-links, so
//! stepping backwards re-walks the scope from its first child.

use core::cmp::Ordering;
use core::ops::Sub;

use crate::error::{length_overflow, out_of_bounds, wrong_kind};
use crate::head::{decode_head, Head, Major};
use crate::storage::Storage;
use crate::wire;
use crate::CborError;

/// The sequence of siblings a cursor walks: the top level of the buffer, or the
/// immediate children of one array, map or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    container: Option<usize>,
    start: usize,
    depth: u32,
    len: Option<u64>,
}

impl Scope {
    /// The top-level sequence of the buffer.
    pub const TOP: Self = Self {
        container: None,
        start: 0,
        depth: 0,
        len: None,
    };

    /// Head offset of the enclosing container, `None` at the top level.
    #[inline]
    #[must_use]
    pub const fn container(self) -> Option<usize> {
        self.container
    }

    /// Offset of the first child.
    #[inline]
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Nesting depth (0 at the top level).
    #[inline]
    #[must_use]
    pub const fn depth(self) -> u32 {
        self.depth
    }

    /// Number of children declared by the container (maps count keys and values),
    /// `None` at the top level where the sequence ends with the buffer.
    #[inline]
    #[must_use]
    pub const fn len(self) -> Option<u64> {
        self.len
    }

    /// Returns `true` if the container declares no children.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self.len, Some(0))
    }

    /// Shift offsets at or after `at` by `delta` after a resize of the storage.
    pub(crate) fn rebase(self, at: usize, delta: isize) -> Self {
        let shift = |p: usize| if p >= at { p.saturating_add_signed(delta) } else { p };
        Self {
            container: self.container.map(shift),
            start: shift(self.start),
            ..self
        }
    }

    pub(crate) const fn with_len(self, len: u64) -> Self {
        Self {
            len: Some(len),
            ..self
        }
    }
}

/// A position within one scope of the buffer.
///
/// Cursors are only comparable (ordering, subtraction) when they share a scope; mixing
/// scopes is a caller bug caught by a debug assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    offset: usize,
    scope: Scope,
    index: usize,
}

impl Cursor {
    /// The first item of the buffer.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            offset: 0,
            scope: Scope::TOP,
            index: 0,
        }
    }

    /// Byte offset of the item head.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Index within the scope.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// The scope this cursor walks.
    #[inline]
    #[must_use]
    pub const fn scope(self) -> Scope {
        self.scope
    }

    /// Returns `true` if the cursor sits one past the last item of its scope.
    #[must_use]
    pub fn is_end<S: Storage + ?Sized>(self, s: &S) -> bool {
        match self.scope.len {
            Some(n) => self.index as u64 >= n,
            None => self.offset >= s.len(),
        }
    }

    /// Decode the head of the item under the cursor.
    ///
    /// # Errors
    ///
    /// Returns the head decoding errors of [`decode_head`].
    pub fn head<S: Storage + ?Sized>(self, s: &S) -> Result<Head, CborError> {
        decode_head(s, self.offset)
    }

    /// Step over the current item, including all of its children.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` when already at the end of the scope, or the decode
    /// errors of the item being skipped.
    pub fn next_sibling<S: Storage + ?Sized>(self, s: &S) -> Result<Self, CborError> {
        if self.is_end(s) {
            return Err(out_of_bounds(self.offset));
        }
        Ok(Self {
            offset: wire::skip_item(s, self.offset)?,
            index: self.index + 1,
            ..self
        })
    }

    /// Descend into the children of the array, map or tag under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for any other item and `UnsupportedFeature` for
    /// indefinite-length containers.
    pub fn enter<S: Storage + ?Sized>(self, s: &S) -> Result<Self, CborError> {
        let head = self.head(s)?;
        if !matches!(head.major(), Major::Array | Major::Map | Major::Tag) {
            return Err(wrong_kind(self.offset));
        }
        let len = wire::child_count(s, self.offset)?;
        let start = self
            .offset
            .checked_add(head.size())
            .ok_or_else(|| length_overflow(self.offset))?;
        Ok(Self {
            offset: start,
            scope: Scope {
                container: Some(self.offset),
                start,
                depth: self.scope.depth + 1,
                len: Some(len),
            },
            index: 0,
        })
    }

    /// Position on `index` within the same scope by walking from its first child.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` past the end of the scope (the end position itself is
    /// allowed) and the decode errors of the items walked over.
    pub fn seek<S: Storage + ?Sized>(self, s: &S, index: usize) -> Result<Self, CborError> {
        let mut c = Self {
            offset: self.scope.start,
            index: 0,
            ..self
        };
        while c.index < index {
            c = c.next_sibling(s)?;
        }
        Ok(c)
    }

    /// Step back one item. Costs a walk of `index` items from the start of the scope.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` at index 0.
    pub fn prev_sibling<S: Storage + ?Sized>(self, s: &S) -> Result<Self, CborError> {
        if self.index == 0 {
            return Err(out_of_bounds(self.offset));
        }
        self.seek(s, self.index - 1)
    }

    /// Move by `n` items in either direction. Costs O(|n|) forward, O(index) backward.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` when the target lies outside the scope.
    pub fn advance<S: Storage + ?Sized>(self, s: &S, n: isize) -> Result<Self, CborError> {
        if n >= 0 {
            let mut c = self;
            for _ in 0..n {
                c = c.next_sibling(s)?;
            }
            return Ok(c);
        }
        let back = n.unsigned_abs();
        let target = self
            .index
            .checked_sub(back)
            .ok_or_else(|| out_of_bounds(self.offset))?;
        self.seek(s, target)
    }

    pub(crate) fn rebase(self, at: usize, delta: isize) -> Self {
        let offset = if self.offset >= at {
            self.offset.saturating_add_signed(delta)
        } else {
            self.offset
        };
        Self {
            offset,
            scope: self.scope.rebase(at, delta),
            index: self.index,
        }
    }

    pub(crate) const fn with_scope(self, scope: Scope) -> Self {
        Self { scope, ..self }
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        debug_assert_eq!(
            self.scope, other.scope,
            "comparing cursors from different scopes"
        );
        if self.scope != other.scope {
            return None;
        }
        Some(self.index.cmp(&other.index))
    }
}

impl Sub for Cursor {
    type Output = isize;

    /// Number of items between two cursors of the same scope.
    #[allow(clippy::cast_possible_wrap)]
    fn sub(self, rhs: Self) -> isize {
        debug_assert_eq!(
            self.scope, rhs.scope,
            "subtracting cursors from different scopes"
        );
        self.index as isize - rhs.index as isize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    // 0, null, NaN, "foo", 0.1
    const SEQ: &[u8] = &[
        0x00, 0xf6, 0xf9, 0x7e, 0x00, 0x63, b'f', b'o', b'o', 0xfb, 0x3f, 0xb9, 0x99, 0x99,
        0x99, 0x99, 0x99, 0x9a,
    ];

    #[test]
    fn walks_forward_and_back() {
        let c = Cursor::root();
        let c1 = c.next_sibling(SEQ).unwrap();
        assert_eq!((c1.offset(), c1.index()), (1, 1));
        let c3 = c1.advance(SEQ, 2).unwrap();
        assert_eq!((c3.offset(), c3.index()), (5, 3));
        let c2 = c3.prev_sibling(SEQ).unwrap();
        assert_eq!((c2.offset(), c2.index()), (2, 2));
        let end = c.advance(SEQ, 5).unwrap();
        assert!(end.is_end(SEQ));
        assert_eq!(end.offset(), SEQ.len());
        assert_eq!(end - c, 5);
        assert!(c < end);
        assert_eq!(
            end.next_sibling(SEQ).unwrap_err().code,
            ErrorCode::IndexOutOfBounds
        );
        assert_eq!(
            c.prev_sibling(SEQ).unwrap_err().code,
            ErrorCode::IndexOutOfBounds
        );
        assert_eq!(end.advance(SEQ, -5).unwrap(), c);
    }

    #[test]
    fn enter_scopes_children() {
        // [[1], 2]
        let b: &[u8] = &[0x82, 0x81, 0x01, 0x02];
        let outer = Cursor::root().enter(b).unwrap();
        assert_eq!(outer.scope().len(), Some(2));
        assert_eq!(outer.scope().container(), Some(0));
        let inner = outer.enter(b).unwrap();
        assert_eq!(inner.scope().depth(), 2);
        assert_eq!(inner.offset(), 2);
        let inner_end = inner.next_sibling(b).unwrap();
        assert!(inner_end.is_end(b));
        let second = outer.next_sibling(b).unwrap();
        assert_eq!(second.offset(), 3);
        assert_ne!(second.scope(), inner_end.scope());
        assert_eq!(
            Cursor::root()
                .enter(b)
                .unwrap()
                .next_sibling(b)
                .unwrap()
                .enter(b)
                .unwrap_err()
                .code,
            ErrorCode::WrongKind
        );
    }

    #[test]
    fn map_scope_counts_keys_and_values() {
        // {"a": [1, 2]} then 7
        let b: &[u8] = &[0xa1, 0x61, b'a', 0x82, 0x01, 0x02, 0x07];
        let root = Cursor::root();
        assert_eq!(root.next_sibling(b).unwrap().offset(), 6);
        let key = root.enter(b).unwrap();
        assert_eq!(key.scope().len(), Some(2));
        let value = key.next_sibling(b).unwrap();
        assert_eq!(value.offset(), 3);
        assert!(value.next_sibling(b).unwrap().is_end(b));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "different scopes")]
    fn comparing_across_scopes_asserts() {
        let b: &[u8] = &[0x81, 0x01];
        let top = Cursor::root();
        let child = top.enter(b).unwrap();
        let _ = top.partial_cmp(&child);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "different scopes")]
    fn subtracting_across_scopes_asserts() {
        let b: &[u8] = &[0x81, 0x01];
        let top = Cursor::root();
        let child = top.enter(b).unwrap();
        let _ = child - top;
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn cross_scope_cursors_are_unordered() {
        let b: &[u8] = &[0x81, 0x01];
        let top = Cursor::root();
        let child = top.enter(b).unwrap();
        assert_eq!(top.partial_cmp(&child), None);
        assert!(!(top < child) && !(top > child));
    }
}
