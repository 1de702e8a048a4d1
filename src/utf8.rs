#[cfg(feature = "simdutf8")]
use simdutf8::basic as simd_utf8;

use crate::{CborError, ErrorCode};

/// Validates a text payload and returns it as `&str`.
///
/// `offset` is the head offset reported on failure.
#[inline]
pub fn validate(bytes: &[u8], offset: usize) -> Result<&str, CborError> {
    #[cfg(feature = "simdutf8")]
    let res = simd_utf8::from_utf8(bytes).map_err(|_| ());

    #[cfg(not(feature = "simdutf8"))]
    let res = core::str::from_utf8(bytes).map_err(|_| ());

    res.map_err(|()| CborError::new(ErrorCode::Utf8Invalid, offset))
}
