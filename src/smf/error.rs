use thiserror::Error;

/// Reasons a byte buffer could not be decoded into a score
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a field or a declared skip was complete
    #[error("unexpected end of data at offset {offset}: wanted {wanted} byte(s), buffer is {len} bytes")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        len: usize,
    },

    /// A chunk tag did not match the expected container or track tag
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;
