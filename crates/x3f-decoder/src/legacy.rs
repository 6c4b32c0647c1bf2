//! Legacy Huffman coded images (RAW types 3-5 / 3-6 / 1-6 and the 2-11 thumbnail)
//!
//! The body holds an optional value mapping, a packed code table with `2^bits`
//! entries and the pixel data. Compressed bodies end in a table of per-row byte
//! offsets so every row decodes on its own. When the image header carries a
//! nonzero row stride, pixels are stored uncompressed as little-endian 32-bit words
//! instead.
//!
//! A decoded symbol is a sample value: it indexes the mapping when there is one and
//! is used as is otherwise.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;
use tracing::{debug, trace};
use x3f_bitstream::{BitReader, HuffmanTree};
use x3f_core::consts::CHANNELS;
use x3f_core::{zeroed_samples, DecodedImage, ImageBuffer, SampleType, X3fError, X3fResult};
use x3f_headers::ImageHeader;

/// How the pixel words are laid out
#[derive(Debug, Clone)]
pub enum PixelLayout {
    /// Prefix-coded rows starting at the given byte offsets into the pixel data
    Compressed {
        tree: HuffmanTree,
        row_offsets: Vec<u32>,
    },
    /// One little-endian u32 per pixel holding three `bits`-wide symbols, channel 0
    /// lowest; rows are `row_stride` bytes apart
    Packed { row_stride: u32 },
}

/// Parsed decoder state of a legacy Huffman image
#[derive(Debug, Clone)]
pub struct HuffmanImage {
    /// Code table width in bits; the table and mapping have `1 << bits` entries
    pub bits: u32,
    pub mapping: Option<Vec<u16>>,
    pub table: Vec<u32>,
    pub layout: PixelLayout,
    pub columns: u32,
    pub rows: u32,
    pub output: SampleType,
    /// Pixel data within the section body
    pixels: Range<usize>,
}

impl HuffmanImage {
    /// Parse the tables of `body`; pixels are decoded separately
    pub fn load(
        header: &ImageHeader,
        body: &[u8],
        bits: u32,
        mapped: bool,
        output: SampleType,
    ) -> X3fResult<Self> {
        let entries = 1usize << bits;
        let mut offset = 0usize;

        let mapping = if mapped {
            let bytes = take(body, offset, entries * 2)?;
            let mut mapping = vec![0u16; entries];
            LittleEndian::read_u16_into(bytes, &mut mapping);
            offset += entries * 2;
            Some(mapping)
        } else {
            None
        };

        let rows = header.rows as usize;
        let (table, layout, pixels) = if header.row_stride == 0 {
            let bytes = take(body, offset, entries * 4)?;
            let mut table = vec![0u32; entries];
            LittleEndian::read_u32_into(bytes, &mut table);
            offset += entries * 4;

            let offsets_size = rows
                .checked_mul(4)
                .ok_or_else(|| X3fError::out_of_range(offset, usize::MAX, body.len()))?;
            let offsets_start = body
                .len()
                .checked_sub(offsets_size)
                .filter(|&start| start >= offset)
                .ok_or_else(|| X3fError::out_of_range(offset, offsets_size, body.len()))?;
            let mut row_offsets = vec![0u32; rows];
            LittleEndian::read_u32_into(&body[offsets_start..], &mut row_offsets);

            let pixel_len = offsets_start - offset;
            if let Some((row, bad)) = row_offsets
                .iter()
                .enumerate()
                .find(|(_, o)| **o as usize > pixel_len)
            {
                debug!(row, offset = *bad, pixel_len, "row offset past pixel data");
                return Err(X3fError::out_of_range(*bad as usize, 0, pixel_len));
            }

            // Each symbol takes at least one bit of what follows the row's offset
            let needed = header.columns as u64 * CHANNELS as u64;
            if let Some((row, &start)) = row_offsets
                .iter()
                .enumerate()
                .find(|(_, o)| needed > (pixel_len - **o as usize) as u64 * 8)
            {
                debug!(
                    row,
                    start,
                    pixel_len,
                    columns = header.columns,
                    "row cannot hold its samples"
                );
                return Err(X3fError::TruncatedStream {
                    position: start as usize * 8,
                    needed: usize::try_from(needed).unwrap_or(usize::MAX),
                    available: (pixel_len - start as usize) * 8,
                });
            }

            let tree = HuffmanTree::from_packed_table(&table)?;
            (
                table,
                PixelLayout::Compressed { tree, row_offsets },
                offset..offsets_start,
            )
        } else {
            let row_stride = header.row_stride as usize;
            if (row_stride as u64) < header.columns as u64 * 4 {
                return Err(X3fError::InvalidHeader(format!(
                    "row stride {} too small for {} packed pixels",
                    row_stride, header.columns
                )));
            }
            let pixel_len = rows
                .checked_mul(row_stride)
                .ok_or_else(|| X3fError::out_of_range(offset, usize::MAX, body.len()))?;
            take(body, offset, pixel_len)?;
            (
                Vec::new(),
                PixelLayout::Packed {
                    row_stride: header.row_stride,
                },
                offset..offset + pixel_len,
            )
        };

        debug!(
            bits,
            mapped,
            packed = matches!(layout, PixelLayout::Packed { .. }),
            columns = header.columns,
            rows = header.rows,
            "loaded legacy huffman image"
        );

        Ok(Self {
            bits,
            mapping,
            table,
            layout,
            columns: header.columns,
            rows: header.rows,
            output,
            pixels,
        })
    }

    /// Decode row `row` of the image in `body` into `columns * 3` samples
    pub fn decode_row(&self, body: &[u8], row: u32) -> X3fResult<Vec<u16>> {
        if row >= self.rows {
            return Err(X3fError::InvalidParameter(format!(
                "row {} outside image of {} rows",
                row, self.rows
            )));
        }
        let mut out = zeroed_samples(DecodedImage::sample_count_for(self.columns, 1)?)?;
        self.decode_row_into(body, row as usize, &mut out)?;
        Ok(out)
    }

    /// Decode every row, in parallel when `parallel` is set
    pub fn decode(&self, body: &[u8], parallel: bool) -> X3fResult<DecodedImage> {
        let row_len = DecodedImage::sample_count_for(self.columns, 1)?;
        let mut samples = zeroed_samples(DecodedImage::sample_count_for(self.columns, self.rows)?)?;

        if row_len > 0 {
            if parallel {
                samples
                    .par_chunks_mut(row_len)
                    .enumerate()
                    .try_for_each(|(row, out)| self.decode_row_into(body, row, out))?;
            } else {
                samples
                    .chunks_mut(row_len)
                    .enumerate()
                    .try_for_each(|(row, out)| self.decode_row_into(body, row, out))?;
            }
        }

        let buffer = match self.output {
            SampleType::U16 => ImageBuffer::X3Rgb16(samples),
            SampleType::U8 => ImageBuffer::Rgb8(samples.into_iter().map(|s| s as u8).collect()),
        };
        DecodedImage::new(self.columns, self.rows, buffer)
    }

    fn decode_row_into(&self, body: &[u8], row: usize, out: &mut [u16]) -> X3fResult<()> {
        let pixels = body.get(self.pixels.clone()).ok_or_else(|| {
            X3fError::out_of_range(self.pixels.start, self.pixels.len(), body.len())
        })?;

        match &self.layout {
            PixelLayout::Compressed { tree, row_offsets } => {
                let mut reader = BitReader::at_byte(pixels, row_offsets[row] as usize)?;
                for sample in out.iter_mut() {
                    let position = reader.position();
                    let symbol = tree.decode(&mut reader)?;
                    *sample = self.sample_for(symbol, position)?;
                }
            }
            PixelLayout::Packed { row_stride } => {
                let start = row * *row_stride as usize;
                let words = &pixels[start..start + self.columns as usize * 4];
                let mask = (1u32 << self.bits) - 1;
                for (index, (pixel, word)) in out
                    .chunks_exact_mut(CHANNELS)
                    .zip(words.chunks_exact(4))
                    .enumerate()
                {
                    let value = LittleEndian::read_u32(word);
                    let position = (start + index * 4) * 8;
                    for (channel, sample) in pixel.iter_mut().enumerate() {
                        let symbol = (value >> (channel as u32 * self.bits)) & mask;
                        *sample = self.sample_for(symbol, position)?;
                    }
                }
            }
        }
        trace!(row, "decoded legacy row");
        Ok(())
    }

    fn sample_for(&self, symbol: u32, position: usize) -> X3fResult<u16> {
        let value = match &self.mapping {
            Some(mapping) => *mapping.get(symbol as usize).ok_or_else(|| {
                X3fError::CorruptStream {
                    position,
                    reason: format!(
                        "symbol {} outside mapping of {} entries",
                        symbol,
                        mapping.len()
                    ),
                }
            })? as u32,
            None => symbol,
        };
        let limit = match self.output {
            SampleType::U8 => u8::MAX as u32,
            SampleType::U16 => u16::MAX as u32,
        };
        if value > limit {
            return Err(X3fError::CorruptStream {
                position,
                reason: format!("sample {} exceeds {}", value, limit),
            });
        }
        Ok(value as u16)
    }
}

fn take(body: &[u8], offset: usize, len: usize) -> X3fResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| body.get(offset..end))
        .ok_or_else(|| X3fError::out_of_range(offset, len, body.len()))
}
