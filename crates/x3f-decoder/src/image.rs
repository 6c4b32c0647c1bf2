//! Image section payloads, dispatched on the section's type and format

use tracing::debug;
use x3f_core::consts::{CHANNELS, RAW_HUFFMAN_BITS, THUMB_HUFFMAN_BITS};
use x3f_core::{DecodedImage, ImageBuffer, ImageCoding, SampleType, TypeFormat, X3fError, X3fResult};
use x3f_headers::ImageHeader;

use crate::legacy::HuffmanImage;
use crate::true_raw::TrueImage;
use crate::DecoderOptions;

/// Decoded contents of an image section
#[derive(Debug, Clone)]
pub enum ImageContent {
    Huffman {
        coding: HuffmanImage,
        image: DecodedImage,
    },
    True {
        coding: TrueImage,
        image: DecodedImage,
    },
    Pixmap(DecodedImage),
    Jpeg(Vec<u8>),
}

/// An image section with its decoded payload
#[derive(Debug, Clone)]
pub struct ImageData {
    pub header: ImageHeader,
    pub content: ImageContent,
}

impl ImageData {
    pub fn decode(header: &ImageHeader, body: &[u8], options: &DecoderOptions) -> X3fResult<Self> {
        let coding = header.type_format.coding()?;
        debug!(type_format = %header.type_format, ?coding, "decoding image section");

        let content = match coding {
            ImageCoding::RawHuffman => {
                let coding =
                    HuffmanImage::load(header, body, RAW_HUFFMAN_BITS, true, SampleType::U16)?;
                let image = coding.decode(body, options.parallel_rows)?;
                ImageContent::Huffman { coding, image }
            }
            ImageCoding::ThumbHuffman => {
                let coding =
                    HuffmanImage::load(header, body, THUMB_HUFFMAN_BITS, false, SampleType::U8)?;
                let image = coding.decode(body, options.parallel_rows)?;
                ImageContent::Huffman { coding, image }
            }
            ImageCoding::RawTrue => {
                let coding = TrueImage::load(header, body)?;
                let image = coding.decode(body)?;
                ImageContent::True { coding, image }
            }
            ImageCoding::ThumbPlain => ImageContent::Pixmap(decode_pixmap(header, body)?),
            ImageCoding::ThumbJpeg => ImageContent::Jpeg(body.to_vec()),
        };

        Ok(Self {
            header: *header,
            content,
        })
    }

    pub fn type_format(&self) -> TypeFormat {
        self.header.type_format
    }

    /// Decoded samples; `None` for JPEG
    pub fn image(&self) -> Option<&DecodedImage> {
        match &self.content {
            ImageContent::Huffman { image, .. } | ImageContent::True { image, .. } => Some(image),
            ImageContent::Pixmap(image) => Some(image),
            ImageContent::Jpeg(_) => None,
        }
    }

    pub fn jpeg(&self) -> Option<&[u8]> {
        match &self.content {
            ImageContent::Jpeg(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn huffman(&self) -> Option<&HuffmanImage> {
        match &self.content {
            ImageContent::Huffman { coding, .. } => Some(coding),
            _ => None,
        }
    }
}

fn decode_pixmap(header: &ImageHeader, body: &[u8]) -> X3fResult<DecodedImage> {
    let row_bytes = header.columns as usize * CHANNELS;
    let stride = header.row_stride as usize;
    if stride < row_bytes {
        return Err(X3fError::InvalidHeader(format!(
            "row stride {} shorter than {} pixel bytes",
            stride, row_bytes
        )));
    }
    let needed = stride
        .checked_mul(header.rows as usize)
        .filter(|&needed| needed <= body.len())
        .ok_or_else(|| {
            X3fError::out_of_range(0, stride.saturating_mul(header.rows as usize), body.len())
        })?;

    let mut samples = Vec::with_capacity(row_bytes * header.rows as usize);
    if row_bytes > 0 {
        for row in body[..needed].chunks_exact(stride) {
            samples.extend_from_slice(&row[..row_bytes]);
        }
    }
    DecodedImage::new(header.columns, header.rows, ImageBuffer::Rgb8(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(type_format: TypeFormat, columns: u32, rows: u32, row_stride: u32) -> ImageHeader {
        ImageHeader {
            type_format,
            columns,
            rows,
            row_stride,
        }
    }

    #[test]
    fn test_pixmap_drops_row_padding() {
        let body = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        let data = ImageData::decode(
            &header(TypeFormat::THUMB_PLAIN, 2, 2, 8),
            &body,
            &DecoderOptions::default(),
        )
        .unwrap();
        let image = data.image().unwrap();
        assert_eq!(image.sample(1, 0, 0), Some(7));
        assert_eq!(image.sample(1, 1, 2), Some(12));
        assert_eq!(image.sample_type(), SampleType::U8);
    }

    #[test]
    fn test_pixmap_short_body() {
        let result = ImageData::decode(
            &header(TypeFormat::THUMB_PLAIN, 2, 2, 8),
            &[0; 12],
            &DecoderOptions::default(),
        );
        assert!(matches!(result, Err(X3fError::OffsetOutOfRange { .. })));
    }

    #[test]
    fn test_jpeg_passthrough() {
        let body = [0xff, 0xd8, 0xff, 0xe0, 1, 2, 3];
        let data = ImageData::decode(
            &header(TypeFormat::THUMB_JPEG, 0, 0, 0),
            &body,
            &DecoderOptions::default(),
        )
        .unwrap();
        assert_eq!(data.jpeg(), Some(&body[..]));
        assert!(data.image().is_none());
    }

    #[test]
    fn test_unknown_type_format() {
        let result = ImageData::decode(
            &header(TypeFormat::new(9, 9), 1, 1, 0),
            &[0; 64],
            &DecoderOptions::default(),
        );
        assert!(matches!(
            result,
            Err(X3fError::UnsupportedFormat {
                image_type: 9,
                format: 9
            })
        ));
    }
}
