//! X3F header and directory parsing
//!
//! Structural parse only: the fixed file header, the directory at the end of the file
//! and the fixed-size header at the start of every section. Section bodies are left
//! untouched for the decoders.

pub mod directory;
pub mod header;

pub use directory::{
    CamfHeader, CamfVariant, Directory, DirectoryEntry, Extent, ImageHeader, PropertyListHeader,
    SectionHeader, SectionKind,
};
pub use header::{ExtendedHeader, Header};

use x3f_core::{X3fError, X3fResult};

/// Little-endian u32 at `offset`, or `TruncatedStream` if the buffer is too short
pub fn read_u32_at(data: &[u8], offset: usize) -> X3fResult<u32> {
    let bytes = offset
        .checked_add(4)
        .and_then(|end| data.get(offset..end))
        .ok_or(X3fError::TruncatedStream {
            position: offset.saturating_mul(8),
            needed: 32,
            available: data.len().saturating_sub(offset) * 8,
        })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Ensure `data` holds at least `len` bytes from `offset`
pub(crate) fn require(data: &[u8], offset: usize, len: usize) -> X3fResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(X3fError::TruncatedStream {
            position: offset.saturating_mul(8),
            needed: len * 8,
            available: data.len().saturating_sub(offset) * 8,
        }),
    }
}
