//! # inplace-cbor
//!
//! CBOR (RFC 8949) items read, written and edited directly inside a flat byte buffer.
//!
//! ## Design principles
//!
//! - **The buffer is the document.**
//!   There is no intermediate tree. A buffer holds zero or more back-to-back top-level
//!   items; [`Cursor`]s point at item heads and views ([`Item`], [`ArrayRef`], [`MapRef`])
//!   decode lazily from the bytes underneath.
//! - **Edits happen in place.**
//!   Inserting or erasing children rewrites the enclosing container's head in its shortest
//!   form, growing or shrinking the buffer as the head length changes. See
//!   [`set_header_argument`].
//! - **Encoding is deterministic.**
//!   Integers, lengths and tag numbers use the shortest head; floats the narrowest exact
//!   width, with NaN and ±Infinity as half-precision. Indefinite lengths are never
//!   emitted.
//! - **Storage is pluggable.**
//!   Reading goes through [`Storage`], mutation through [`StorageMut`]. Slices, arrays,
//!   `Vec<u8>` and `VecDeque<u8>` are supported out of the box.
//!
//! ## Decoding rules
//!
//! - Additional information 28..=30 is rejected as [`ErrorCode::MalformedHead`].
//! - Indefinite lengths, extended simple values and half-floats other than NaN/±Infinity
//!   are rejected as [`ErrorCode::UnsupportedFeature`].
//! - A tag is one item: its head plus the single item it encloses.
//! - Navigation trusts the buffer and only checks what it touches. Call [`validate`] on
//!   untrusted input, or after a failed mutation, before navigating.
//!
//! ```
//! use inplace_cbor::{Codec, Value};
//!
//! let mut codec = Codec::new(Vec::new());
//! codec.push(Value::array([Value::from(0u8), Value::from("foo")]))?;
//! let array = codec.array(codec.begin())?;
//! assert_eq!(array.get(1)?.get_str()?, "foo");
//!
//! codec.array_mut(codec.begin())?.set(0, 1u8)?;
//! assert_eq!(codec.storage(), &[0x82, 0x01, 0x63, b'f', b'o', b'o']);
//! # Ok::<(), inplace_cbor::CborError>(())
//! ```
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`CborError`].
//! - `alloc` *(default)*: growable storage, the value builder, encoding to vectors and every
//!   mutating API.
//! - `sha2` *(default)*: SHA-256 of a whole buffer or a single item.
//! - `simdutf8`: SIMD-accelerated UTF-8 validation where supported.
//! - `serde`: serialize into and deserialize out of a buffer.
//!
//! ## `no_std`
//!
//! The crate is `no_std` compatible.
//! - Navigation, decoding, validation and encoding into a [`SliceSink`] work without `alloc`.
//! - Growable storage and mutation require `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod alloc_util;
mod codec;
mod cursor;
#[cfg(feature = "sha2")]
mod digest;
mod encode;
mod error;
mod float;
mod head;
mod limits;
mod parse;
mod query;
mod scalar;
#[cfg(feature = "serde")]
mod serde_impl;
mod storage;
pub(crate) mod utf8;
mod wire;

#[cfg(feature = "alloc")]
mod edit;
#[cfg(feature = "alloc")]
mod value;

pub use crate::codec::Codec;
pub use crate::cursor::{Cursor, Scope};
pub use crate::encode::{Encode, Null, SliceSink, Sink, Tagged, Undefined};
pub use crate::error::{CborError, ErrorCode};
pub use crate::float::{HALF_NAN, HALF_NEG_INFINITY, HALF_POS_INFINITY};
pub use crate::head::{
    ai, argument_size, decode_head, encode_head, head_len, initial_byte, item_size, special,
    EncodedHead, Head, Major,
};
pub use crate::limits::{DecodeLimits, DEFAULT_MAX_DEPTH};
pub use crate::parse::validate;
pub use crate::query::{ArrayIter, ArrayRef, Item, MapIter, MapRef};
pub use crate::scalar::{classify, FromItem, ItemType, Tag};
pub use crate::storage::{Contiguous, Storage, StorageMut};

#[cfg(feature = "alloc")]
pub use crate::edit::{
    append, copy_item, push_back, replace, set_header_argument, ArrayMut, ItemMut, MapMut,
};
#[cfg(feature = "alloc")]
pub use crate::encode::{encode_to_vec, VecSink};
#[cfg(feature = "alloc")]
pub use crate::value::Value;

#[cfg(feature = "serde")]
pub use crate::serde_impl::to_vec;
