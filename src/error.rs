use core::fmt;

/// A structured error code identifying why an operation was rejected.
///
/// This enum is string-free so it stays usable in `no_std` builds and cheap to return
/// from hot decode paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Reserved additional-info value (28..=30) in an item head.
    MalformedHead,
    /// The item uses a CBOR feature this codec does not decode (indefinite lengths,
    /// extended simple values, half-floats other than NaN/±Infinity).
    UnsupportedFeature,
    /// A typed accessor was used on an item of a different major type.
    WrongKind,
    /// The decoded integer does not fit the requested type.
    Overflow,
    /// A float64 item cannot be narrowed to the requested type without losing precision.
    LossyConversion,
    /// Attempt to encode one of the reserved tag values (`0xffff`, `0xffff_ffff`, `u64::MAX`).
    InvalidTagValue,

    /// Invalid argument to an encoding or mutation primitive.
    InvalidArgument,
    /// An item head or payload extends past the end of the buffer.
    UnexpectedEof,
    /// Arithmetic overflow while computing a length or offset.
    LengthOverflow,
    /// Growing the backing storage failed.
    AllocationFailed,
    /// Index past the end of a scope, or a backwards step from the first item.
    IndexOutOfBounds,
    /// Text payload is not valid UTF-8.
    Utf8Invalid,

    /// Nesting depth limit exceeded during validation.
    DepthLimitExceeded,
    /// Total items limit exceeded during validation.
    TotalItemsLimitExceeded,
    /// Buffer exceeds the configured input size limit.
    InputLenLimitExceeded,

    /// A serde `Serialize` or `Deserialize` impl reported an error.
    SerdeError,
}

impl ErrorCode {
    const fn message(self) -> &'static str {
        match self {
            Self::MalformedHead => "reserved additional info value in item head",
            Self::UnsupportedFeature => "unsupported CBOR feature",
            Self::WrongKind => "item has the wrong major type",
            Self::Overflow => "integer does not fit the requested type",
            Self::LossyConversion => "lossy floating point conversion",
            Self::InvalidTagValue => "tag value is invalid",

            Self::InvalidArgument => "invalid argument",
            Self::UnexpectedEof => "unexpected end of buffer",
            Self::LengthOverflow => "length overflow",
            Self::AllocationFailed => "allocation failed",
            Self::IndexOutOfBounds => "index out of bounds",
            Self::Utf8Invalid => "text must be valid UTF-8",

            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::TotalItemsLimitExceeded => "total items limit exceeded",
            Self::InputLenLimitExceeded => "buffer exceeds input size limit",

            Self::SerdeError => "serde conversion failed",
        }
    }
}

/// An error with a stable code and the byte offset at which it was detected.
///
/// For decode and navigation errors `offset` is the position of the offending item head.
/// Encode-time failures that have no buffer position use offset `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CborError {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset into the buffer where the error was detected.
    pub offset: usize,
}

impl CborError {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }

    /// Construct an encode-time error with no buffer position.
    #[inline]
    #[must_use]
    pub const fn encode(code: ErrorCode) -> Self {
        Self { code, offset: 0 }
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cbor error at {}: {}", self.offset, self.code.message())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CborError {}

#[cold]
#[inline(never)]
pub(crate) const fn wrong_kind(offset: usize) -> CborError {
    CborError::new(ErrorCode::WrongKind, offset)
}

#[cold]
#[inline(never)]
pub(crate) const fn unsupported(offset: usize) -> CborError {
    CborError::new(ErrorCode::UnsupportedFeature, offset)
}

#[cold]
#[inline(never)]
pub(crate) const fn eof(offset: usize) -> CborError {
    CborError::new(ErrorCode::UnexpectedEof, offset)
}

#[cold]
#[inline(never)]
pub(crate) const fn length_overflow(offset: usize) -> CborError {
    CborError::new(ErrorCode::LengthOverflow, offset)
}

#[cold]
#[inline(never)]
pub(crate) const fn out_of_bounds(offset: usize) -> CborError {
    CborError::new(ErrorCode::IndexOutOfBounds, offset)
}

#[cold]
#[inline(never)]
pub(crate) const fn invalid_argument(offset: usize) -> CborError {
    CborError::new(ErrorCode::InvalidArgument, offset)
}
