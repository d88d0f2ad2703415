//! Error types for the baseline-jpeg library.

use thiserror::Error;

/// Result type alias for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category of an [`Error`].
///
/// Every error maps onto exactly one kind. Callers that only need to know
/// whether to retry, fix their input or discard output can match on this
/// instead of the full variant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Parameters rejected at init, before any byte reached the sink.
    ParameterValidation,
    /// A buffer could not be allocated.
    Allocation,
    /// The output sink rejected or failed a write.
    SinkWrite,
    /// Calls arrived in an order (or shape) the encoder does not accept.
    SequenceViolation,
}

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Quality outside 1-100.
    #[error("Invalid quality {0}: must be 1-100")]
    InvalidQuality(u8),
    /// Raw subsampling value outside the known modes.
    #[error("Invalid subsampling mode {0}: must be 0-3")]
    InvalidSubsampling(u8),
    /// Invalid image dimensions (zero width or height).
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
    /// Image dimensions exceed what SOF0 can express.
    #[error("Image {width}x{height} exceeds maximum dimension {max}")]
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Maximum supported dimension.
        max: u32,
    },
    /// Source channel count other than 1 (gray) or 3 (RGB).
    #[error("Unsupported source channel count {0}: must be 1 or 3")]
    UnsupportedChannels(usize),
    /// Scanline (or whole image) length doesn't match the declared geometry.
    #[error("Invalid scanline length: expected {expected} bytes, got {actual}")]
    InvalidScanlineLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        actual: usize,
    },
    /// A bounded output region is too small for the encoded image.
    #[error("Output buffer too small: need at least {required} bytes, have {actual}")]
    BufferTooSmall {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        actual: usize,
    },
    /// Memory allocation failed.
    #[error("Memory allocation failed")]
    AllocationFailed,
    /// The output sink failed a write.
    #[error("Sink write failed: {0}")]
    SinkWrite(String),
    /// Operation not valid in the encoder's current state.
    #[error("Sequence violation: {0}")]
    SequenceViolation(&'static str),
}

impl Error {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidQuality(_)
            | Error::InvalidSubsampling(_)
            | Error::InvalidDimensions { .. }
            | Error::ImageTooLarge { .. }
            | Error::UnsupportedChannels(_) => ErrorKind::ParameterValidation,
            Error::AllocationFailed => ErrorKind::Allocation,
            Error::SinkWrite(_) | Error::BufferTooSmall { .. } => ErrorKind::SinkWrite,
            Error::InvalidScanlineLength { .. } | Error::SequenceViolation(_) => {
                ErrorKind::SequenceViolation
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::SinkWrite(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}
