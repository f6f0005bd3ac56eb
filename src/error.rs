//! Error types for the buzzer frequency channel

use std::io;
use thiserror::Error;

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, BuzzerError>;

/// Coarse classification of a [`BuzzerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The shared-memory object or its mapping could not be established
    ResourceUnavailable,
    /// A write or flush failed after the channel was open, or it is closed
    IoFailure,
    /// The caller handed in something the channel cannot hold
    InvalidInput,
}

/// Errors that can occur while publishing or reading a frequency
#[derive(Debug, Error)]
pub enum BuzzerError {
    /// Shared memory name does not follow the `/name` convention
    #[error("Invalid shared memory name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Failed to create or open shared memory
    #[error("Failed to open shared memory '{name}': {source}")]
    ShmOpen {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Failed to query or set the size of the shared memory object
    #[error("Failed to size shared memory '{name}': {source}")]
    Truncate {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Existing object is smaller than the requested channel size
    #[error("Shared memory '{name}' has size {actual}, expected at least {expected}")]
    IncompatibleSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Failed to map memory
    #[error("Failed to map memory: {0}")]
    Mmap(#[source] io::Error),

    /// Channel size of zero was requested
    #[error("Channel size must be positive")]
    ZeroSize,

    /// Publish attempted after the channel was closed
    #[error("Channel '{name}' is closed")]
    Closed { name: String },

    /// Flushing the mapping failed
    #[error("Failed to flush shared memory: {0}")]
    Flush(#[source] io::Error),

    /// Encoded value plus terminator does not fit in the channel
    #[error("Value too large: max {max} bytes including terminator, got {got} bytes")]
    PayloadTooLarge { max: usize, got: usize },

    /// Channel is mapped read-only
    #[error("Shared memory '{name}' is mapped read-only")]
    ReadOnly { name: String },
}

impl BuzzerError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuzzerError::InvalidName { .. }
            | BuzzerError::ShmOpen { .. }
            | BuzzerError::Truncate { .. }
            | BuzzerError::IncompatibleSize { .. }
            | BuzzerError::Mmap(_)
            | BuzzerError::ZeroSize => ErrorKind::ResourceUnavailable,
            BuzzerError::Closed { .. } | BuzzerError::Flush(_) | BuzzerError::ReadOnly { .. } => {
                ErrorKind::IoFailure
            }
            BuzzerError::PayloadTooLarge { .. } => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = BuzzerError::Mmap(io::Error::from(io::ErrorKind::OutOfMemory));
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);

        let err = BuzzerError::Closed { name: "/GUI".into() };
        assert_eq!(err.kind(), ErrorKind::IoFailure);

        let err = BuzzerError::PayloadTooLarge { max: 4096, got: 5000 };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("4096"));
    }
}
