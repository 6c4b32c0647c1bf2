//! Decoded image data structures

use crate::consts::CHANNELS;
use crate::{SampleType, X3fError, X3fResult};

/// Interleaved three-channel sample storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBuffer {
    /// 3x8 bit RGB (thumbnails)
    Rgb8(Vec<u8>),
    /// 3x16 bit X3 RGB (sensor planes)
    X3Rgb16(Vec<u16>),
}

impl ImageBuffer {
    pub fn len(&self) -> usize {
        match self {
            ImageBuffer::Rgb8(v) => v.len(),
            ImageBuffer::X3Rgb16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            ImageBuffer::Rgb8(_) => SampleType::U8,
            ImageBuffer::X3Rgb16(_) => SampleType::U16,
        }
    }

    /// Sample `index` as stored, widened losslessly to u16
    pub fn get(&self, index: usize) -> Option<u16> {
        match self {
            ImageBuffer::Rgb8(v) => v.get(index).map(|&s| s as u16),
            ImageBuffer::X3Rgb16(v) => v.get(index).copied(),
        }
    }
}

/// A decoded image: `rows` rows of `columns` interleaved sample triplets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub columns: u32,
    pub rows: u32,
    pub buffer: ImageBuffer,
}

impl DecodedImage {
    /// Wrap a buffer, checking that it holds exactly `columns * rows` triplets
    pub fn new(columns: u32, rows: u32, buffer: ImageBuffer) -> X3fResult<Self> {
        let expected = Self::sample_count_for(columns, rows)?;
        if buffer.len() != expected {
            return Err(X3fError::InvalidParameter(format!(
                "{}x{} image needs {} samples, buffer has {}",
                columns,
                rows,
                expected,
                buffer.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            buffer,
        })
    }

    /// Number of samples in a `columns x rows` image, or `InvalidHeader` when that
    /// does not fit in memory
    pub fn sample_count_for(columns: u32, rows: u32) -> X3fResult<usize> {
        (columns as usize)
            .checked_mul(rows as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or_else(|| {
                X3fError::InvalidHeader(format!("{}x{} image is too large", columns, rows))
            })
    }

    pub fn sample_type(&self) -> SampleType {
        self.buffer.sample_type()
    }

    pub fn pixel_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Bytes per row of the in-memory buffer
    pub fn row_stride(&self) -> usize {
        self.columns as usize * CHANNELS * self.sample_type().bytes_per_sample()
    }

    /// Sample at (row, column, channel)
    pub fn sample(&self, row: u32, col: u32, channel: usize) -> Option<u16> {
        if row >= self.rows || col >= self.columns || channel >= CHANNELS {
            return None;
        }
        let index = (row as usize * self.columns as usize + col as usize) * CHANNELS + channel;
        self.buffer.get(index)
    }

    /// All samples as 16-bit values; 8-bit data is stretched to the full 16-bit range
    pub fn to_u16_samples(&self) -> Vec<u16> {
        use crate::Sample;
        match &self.buffer {
            ImageBuffer::Rgb8(v) => v.iter().map(|s| s.to_u16_range()).collect(),
            ImageBuffer::X3Rgb16(v) => v.clone(),
        }
    }
}

/// `count` zeroed samples. Allocation failure is reported instead of aborting.
pub fn zeroed_samples<T: Clone + Default>(count: usize) -> X3fResult<Vec<T>> {
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(count)
        .map_err(|e| X3fError::InvalidHeader(format!("cannot hold {} samples: {}", count, e)))?;
    samples.resize(count, T::default());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_image_indexing() {
        let samples: Vec<u16> = (0..12).collect();
        let image = DecodedImage::new(2, 2, ImageBuffer::X3Rgb16(samples)).unwrap();
        assert_eq!(image.sample(0, 0, 0), Some(0));
        assert_eq!(image.sample(1, 0, 2), Some(8));
        assert_eq!(image.sample(1, 1, 1), Some(10));
        assert_eq!(image.sample(2, 0, 0), None);
        assert_eq!(image.row_stride(), 12);
    }

    #[test]
    fn test_decoded_image_size_mismatch() {
        let result = DecodedImage::new(2, 2, ImageBuffer::Rgb8(vec![0; 11]));
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_count_overflow() {
        assert_eq!(DecodedImage::sample_count_for(4, 2).unwrap(), 24);
        assert!(matches!(
            DecodedImage::sample_count_for(u32::MAX, u32::MAX),
            Err(X3fError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_zeroed_samples_reports_failure() {
        assert_eq!(zeroed_samples::<u16>(3).unwrap(), vec![0, 0, 0]);
        assert!(zeroed_samples::<u16>(usize::MAX / 2).is_err());
    }

    #[test]
    fn test_rgb8_widening() {
        let image = DecodedImage::new(1, 1, ImageBuffer::Rgb8(vec![0, 128, 255])).unwrap();
        assert_eq!(image.to_u16_samples(), vec![0, 128 * 257, 65535]);
        assert_eq!(image.row_stride(), 3);
    }
}
