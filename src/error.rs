//! Error types for the AVI writer.

use thiserror::Error;

/// Result type for AVI writing operations.
pub type Result<T> = std::result::Result<T, AviError>;

/// Errors that can occur while writing an AVI file.
#[derive(Error, Debug)]
pub enum AviError {
    /// Sink read/write/seek failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attempt to change stream metadata after writing has started.
    #[error("Stream {index} is frozen: {field} can no longer be changed")]
    StreamFrozen { index: usize, field: &'static str },

    /// Invalid configuration or usage before/around the write path.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two-digit chunk ids allow a limited number of streams.
    #[error("Stream limit exceeded: at most {max} streams are supported")]
    TooManyStreams { max: usize },

    /// A stream has used every reserved super-index slot.
    #[error("Stream {index} has no free super-index entries; cannot write more data")]
    SuperIndexFull { index: usize },

    /// Chunk data does not fit in a 32-bit RIFF size field.
    #[error("Chunk size {size} exceeds the RIFF limit")]
    ChunkTooLarge { size: u64 },

    /// Declared chunk size did not match the bytes actually written.
    #[error("Declared chunk size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: u32, actual: u64 },

    /// The close-time header rewrite produced a different header length.
    #[error("Header rewrite changed its length: expected end {expected}, got {actual}")]
    HeaderLengthChanged { expected: u64, actual: u64 },

    /// Propagated from an encoder implementation.
    #[error("Encoder error: {0}")]
    Encoder(String),
}

impl AviError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        AviError::Config(msg.into())
    }

    /// Create an encoder error.
    pub fn encoder(msg: impl Into<String>) -> Self {
        AviError::Encoder(msg.into())
    }
}
