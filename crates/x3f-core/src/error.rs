//! Error types for X3F operations

use thiserror::Error;

/// Result type for X3F operations
pub type X3fResult<T> = Result<T, X3fError>;

/// Errors that can occur while parsing or decoding an X3F file
#[derive(Error, Debug)]
pub enum X3fError {
    #[error("Bad magic at offset {offset:#x}: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { offset: u64, expected: u32, found: u32 },

    #[error("Unsupported version: {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("Truncated stream at bit {position}: needed {needed} bits, {available} available")]
    TruncatedStream {
        position: usize,
        needed: usize,
        available: usize,
    },

    #[error("Corrupt Huffman table: {0}")]
    CorruptTable(String),

    #[error("Corrupt stream at bit {position}: {reason}")]
    CorruptStream { position: usize, reason: String },

    #[error("Offset out of range: {offset} + {size} exceeds {limit}")]
    OffsetOutOfRange { offset: u64, size: u64, limit: u64 },

    #[error("Unsupported image format: type {image_type} format {format}")]
    UnsupportedFormat { image_type: u32, format: u32 },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Directory entry {index} is a {found} section, not {expected}")]
    WrongSectionKind {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("No directory entry {0}")]
    NoSuchEntry(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),
}

impl X3fError {
    /// Shorthand for a range violation of `offset + size` against `limit`
    pub fn out_of_range(offset: usize, size: usize, limit: usize) -> Self {
        X3fError::OffsetOutOfRange {
            offset: offset as u64,
            size: size as u64,
            limit: limit as u64,
        }
    }
}
