/// Default maximum nesting depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Resource limits for [`validate`](crate::validate).
///
/// Limits are enforced deterministically while walking the buffer once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum buffer length in bytes.
    pub max_input_bytes: usize,
    /// Maximum nesting depth. Top-level items sit at depth 0; the children of a
    /// top-level container at depth 1.
    pub max_depth: usize,
    /// Maximum total count of nested children across the whole buffer:
    /// `sum(array_len) + sum(2 * map_pairs) + tag_count` (maps count both keys and values).
    pub max_total_items: usize,
}

impl DecodeLimits {
    /// Construct conservative limits derived from a maximum buffer size.
    ///
    /// The defaults are:
    /// - `max_input_bytes = max_bytes`
    /// - `max_depth = DEFAULT_MAX_DEPTH`
    /// - `max_total_items = max_bytes` (every child occupies at least one byte)
    #[must_use]
    pub const fn for_bytes(max_bytes: usize) -> Self {
        Self {
            max_input_bytes: max_bytes,
            max_depth: DEFAULT_MAX_DEPTH,
            max_total_items: max_bytes,
        }
    }

    /// No limits beyond the buffer itself.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_input_bytes: usize::MAX,
            max_depth: usize::MAX,
            max_total_items: usize::MAX,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}
