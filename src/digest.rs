use core::ops::Range;

use sha2::{Digest, Sha256};

use crate::storage::Storage;
use crate::CborError;

const CHUNK: usize = 256;

/// SHA-256 over `range` of the storage, read in fixed-size chunks so ring buffers hash
/// without a contiguous copy.
pub fn sha256_range<S: Storage + ?Sized>(
    s: &S,
    range: Range<usize>,
) -> Result<[u8; 32], CborError> {
    let mut h = Sha256::new();
    let mut buf = [0u8; CHUNK];
    let mut pos = range.start;
    while pos < range.end {
        let n = (range.end - pos).min(CHUNK);
        s.read_at(pos, &mut buf[..n])?;
        h.update(&buf[..n]);
        pos += n;
    }
    let out = h.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(out.as_slice());
    Ok(digest)
}
