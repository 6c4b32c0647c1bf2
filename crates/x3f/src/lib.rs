//! # X3F - Sigma/Foveon RAW container decoder
//!
//! This crate provides a high-level API for reading X3F files: header and
//! directory parsing, property lists, CAMF metadata, thumbnails and the RAW
//! sensor planes in both the legacy Huffman and TRUE codings.
//!
//! ## Quick Start
//!
//! ```no_run
//! use x3f::{ScaleOptions, X3fFile};
//!
//! let file = X3fFile::open_path("image.x3f").unwrap();
//! println!("X3F {} {}x{}", file.header().version, file.header().columns, file.header().rows);
//!
//! if let Some(index) = file.find_raw() {
//!     let raw = file.image(index).unwrap();
//!     if let Some(image) = raw.image() {
//!         let tiff = x3f::tiff_bytes(image, &ScaleOptions::new().gamma(2.2)).unwrap();
//!         std::fs::write("image.tif", tiff).unwrap();
//!     }
//! }
//! ```
//!
//! ## Decoding model
//!
//! Opening a file parses only the header and directory. Each section is decoded
//! the first time it is requested and cached afterwards; a section that fails to
//! decode reports its error without affecting the others.

// Re-export core types
pub use x3f_core::{
    DecodedImage, ExtendedType, ImageBuffer, ImageCoding, Rotation, Sample, SampleType,
    TypeFormat, Version, X3fError, X3fResult,
};

// Re-export structural types
pub use x3f_headers::{
    CamfHeader, CamfVariant, Directory, DirectoryEntry, ExtendedHeader, Header, ImageHeader,
    PropertyListHeader, SectionHeader, SectionKind,
};

// Re-export decoder
pub use x3f_decoder::{
    write_info, xor_keystream, Camf, CamfCipher, CamfEntry, CamfEntryKind, CamfRecord,
    DecoderOptions, HuffmanImage, ImageContent, ImageData, Payload, Property, PropertyList,
    SigmaCipher, TrueImage, X3fFile,
};

// Re-export output helpers
pub use x3f_dump::{
    extrema, ppm_bytes, raw_samples, rescale, tiff_bytes, write_jpeg, Histogram,
    HistogramOptions, PpmEncoding, Rescaler, ScaleOptions,
};

pub use x3f_bitstream as bitstream;
pub use x3f_core::consts;
pub use x3f_core::X3F_VERSION_MIN;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Newest container version this implementation has been checked against
pub const X3F_VERSION_MAX: Version = Version::new(2, 3);
