//! Byte-level output of decoded images

use std::io::{Cursor, Write};

use byteorder::{ByteOrder, LittleEndian};
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{DynamicImage, ImageError, ImageFormat, RgbImage};
use tracing::{debug, warn};
use x3f_core::{DecodedImage, ImageBuffer, X3fError, X3fResult};

use crate::scale::{rescale, ScaleOptions};

/// PPM sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpmEncoding {
    /// P3
    Ascii,
    /// P6
    Binary,
}

fn encoding_error(err: ImageError) -> X3fError {
    match err {
        ImageError::IoError(io) => X3fError::IoError(io),
        other => X3fError::ImageEncoding(other.to_string()),
    }
}

/// Samples as stored, little-endian for 16-bit data
pub fn raw_samples(image: &DecodedImage) -> Vec<u8> {
    match &image.buffer {
        ImageBuffer::Rgb8(samples) => samples.clone(),
        ImageBuffer::X3Rgb16(samples) => {
            let mut bytes = vec![0u8; samples.len() * 2];
            LittleEndian::write_u16_into(samples, &mut bytes);
            bytes
        }
    }
}

/// Convert to an encodable image, scaling to 16 bits when a gamma is set.
/// Unscaled 8-bit data stays 8-bit.
pub fn to_dynamic(image: &DecodedImage, options: &ScaleOptions) -> X3fResult<DynamicImage> {
    let (width, height) = (image.columns, image.rows);
    let shape_error = || {
        X3fError::InvalidParameter(format!("buffer does not hold a {}x{} image", width, height))
    };

    if let (ImageBuffer::Rgb8(samples), false) = (&image.buffer, options.is_scaled()) {
        return RgbImage::from_raw(width, height, samples.clone())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(shape_error);
    }

    let samples = rescale(&image.to_u16_samples(), options)?;
    image::ImageBuffer::from_raw(width, height, samples)
        .map(DynamicImage::ImageRgb16)
        .ok_or_else(shape_error)
}

pub fn tiff_bytes(image: &DecodedImage, options: &ScaleOptions) -> X3fResult<Vec<u8>> {
    let dynamic = to_dynamic(image, options)?;
    let mut out = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut out, ImageFormat::Tiff)
        .map_err(encoding_error)?;
    debug!(bytes = out.get_ref().len(), "encoded TIFF");
    Ok(out.into_inner())
}

pub fn ppm_bytes(
    image: &DecodedImage,
    options: &ScaleOptions,
    encoding: PpmEncoding,
) -> X3fResult<Vec<u8>> {
    let dynamic = to_dynamic(image, options)?;
    let sample_encoding = match encoding {
        PpmEncoding::Ascii => SampleEncoding::Ascii,
        PpmEncoding::Binary => SampleEncoding::Binary,
    };
    let mut out = Vec::new();
    let encoder = PnmEncoder::new(&mut out).with_subtype(PnmSubtype::Pixmap(sample_encoding));
    dynamic.write_with_encoder(encoder).map_err(encoding_error)?;
    debug!(bytes = out.len(), ?encoding, "encoded PPM");
    Ok(out)
}

/// Copy an embedded JPEG unchanged
pub fn write_jpeg<W: Write>(jpeg: &[u8], mut writer: W) -> X3fResult<()> {
    if !jpeg.starts_with(&[0xff, 0xd8]) {
        warn!(bytes = jpeg.len(), "embedded JPEG lacks a start-of-image marker");
    }
    writer.write_all(jpeg)?;
    writer.flush()?;
    Ok(())
}
