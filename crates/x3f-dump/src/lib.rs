//! Output side of the X3F tools
//!
//! Pure functions from decoded images to bytes: gamma/min/max rescaling,
//! histograms and the TIFF, PPM and raw sample writers. Embedded JPEG thumbnails
//! are copied through unchanged.

pub mod histogram;
pub mod scale;
pub mod writer;

pub use histogram::{Histogram, HistogramOptions};
pub use scale::{extrema, rescale, Rescaler, ScaleOptions};
pub use writer::{ppm_bytes, raw_samples, tiff_bytes, to_dynamic, write_jpeg, PpmEncoding};
