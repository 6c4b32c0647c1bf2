//! Core types and utilities for X3F decoding
//!
//! This crate provides the fundamental data structures shared by every layer of the
//! X3F implementation: format constants, the error taxonomy, header value types and
//! the decoded image buffer.

pub mod consts;
pub mod error;
pub mod image;
pub mod types;

pub use error::{X3fError, X3fResult};
pub use image::*;
pub use types::*;

/// Build a packed X3F version word from its major and minor parts
pub const fn x3f_version(major: u16, minor: u16) -> u32 {
    ((major as u32) << 16) | minor as u32
}

/// Oldest container version this implementation accepts
pub const X3F_VERSION_MIN: Version = Version::V2_0;
