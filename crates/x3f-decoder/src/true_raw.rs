//! TRUE coded RAW images (3-0x1e, 1-0x1e)
//!
//! Three planes share one prefix code whose leaves are residual bit counts. Each
//! plane is coded independently: the first two columns of a row predict from the
//! seed and every later column from the sample two positions to its left.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};
use x3f_bitstream::{parse_true_table, BitReader, HuffmanCode, HuffmanTree};
use x3f_core::consts::{CHANNELS, TRUE_SEED};
use x3f_core::{zeroed_samples, DecodedImage, ImageBuffer, X3fError, X3fResult};
use x3f_headers::ImageHeader;

const SEEDS_SIZE: usize = 8;

/// Parsed decoder state of a TRUE image
#[derive(Debug, Clone)]
pub struct TrueImage {
    pub seeds: [u16; CHANNELS],
    pub unknown: u16,
    pub table: Vec<HuffmanCode>,
    pub tree: HuffmanTree,
    pub plane_sizes: [u32; CHANNELS],
    /// Start of each plane within the section body
    pub plane_offsets: [usize; CHANNELS],
    pub columns: u32,
    pub rows: u32,
}

impl TrueImage {
    pub fn load(header: &ImageHeader, body: &[u8]) -> X3fResult<Self> {
        if body.len() < SEEDS_SIZE {
            return Err(X3fError::out_of_range(0, SEEDS_SIZE, body.len()));
        }
        let mut seeds = [0u16; CHANNELS];
        LittleEndian::read_u16_into(&body[..6], &mut seeds);
        let unknown = LittleEndian::read_u16(&body[6..8]);
        for (plane, &seed) in seeds.iter().enumerate() {
            if seed != TRUE_SEED {
                warn!(plane, seed, "unexpected TRUE seed, keeping it");
            }
        }

        let (table, consumed) = parse_true_table(&body[SEEDS_SIZE..])?;
        let tree = HuffmanTree::build(&table)?;

        let sizes_at = SEEDS_SIZE + consumed;
        let sizes = body
            .get(sizes_at..sizes_at + CHANNELS * 4)
            .ok_or_else(|| X3fError::out_of_range(sizes_at, CHANNELS * 4, body.len()))?;
        let mut plane_sizes = [0u32; CHANNELS];
        LittleEndian::read_u32_into(sizes, &mut plane_sizes);

        let mut plane_offsets = [0usize; CHANNELS];
        let mut offset = sizes_at + CHANNELS * 4;
        for (plane, &size) in plane_sizes.iter().enumerate() {
            plane_offsets[plane] = offset;
            require_plane_bits(header.columns, header.rows, size as usize, offset)?;
            offset = offset
                .checked_add(size as usize)
                .ok_or_else(|| X3fError::out_of_range(offset, size as usize, body.len()))?;
        }
        if offset > body.len() {
            return Err(X3fError::out_of_range(
                plane_offsets[0],
                offset - plane_offsets[0],
                body.len(),
            ));
        }

        debug!(
            codes = table.len(),
            ?plane_sizes,
            columns = header.columns,
            rows = header.rows,
            "loaded TRUE image"
        );

        Ok(Self {
            seeds,
            unknown,
            table,
            tree,
            plane_sizes,
            plane_offsets,
            columns: header.columns,
            rows: header.rows,
        })
    }

    /// Bytes of plane `plane` within `body`
    pub fn plane_data<'a>(&self, body: &'a [u8], plane: usize) -> X3fResult<&'a [u8]> {
        let start = self.plane_offsets[plane];
        let size = self.plane_sizes[plane] as usize;
        body.get(start..start + size)
            .ok_or_else(|| X3fError::out_of_range(start, size, body.len()))
    }

    /// Decode all three planes into interleaved X3 RGB samples
    pub fn decode(&self, body: &[u8]) -> X3fResult<DecodedImage> {
        let count = DecodedImage::sample_count_for(self.columns, self.rows)?;
        let mut samples = zeroed_samples::<u16>(count)?;
        for plane in 0..CHANNELS {
            let values = decode_plane(
                &self.tree,
                self.plane_data(body, plane)?,
                self.seeds[plane],
                self.columns,
                self.rows,
            )?;
            for (dst, value) in samples.iter_mut().skip(plane).step_by(CHANNELS).zip(values) {
                *dst = value;
            }
        }
        DecodedImage::new(self.columns, self.rows, ImageBuffer::X3Rgb16(samples))
    }
}

/// Every coded sample takes at least one bit, so a plane of `size` bytes starting at
/// byte `start` cannot hold more than `size * 8` samples
fn require_plane_bits(columns: u32, rows: u32, size: usize, start: usize) -> X3fResult<()> {
    let needed = columns as u64 * rows as u64;
    let available = size as u64 * 8;
    if needed > available {
        return Err(X3fError::TruncatedStream {
            position: start.saturating_mul(8),
            needed: usize::try_from(needed).unwrap_or(usize::MAX),
            available: size.saturating_mul(8),
        });
    }
    Ok(())
}

/// Decode one plane of `columns * rows` samples, row-major
pub fn decode_plane(
    tree: &HuffmanTree,
    data: &[u8],
    seed: u16,
    columns: u32,
    rows: u32,
) -> X3fResult<Vec<u16>> {
    require_plane_bits(columns, rows, data.len(), 0)?;
    let mut reader = BitReader::new(data);
    let mut out = Vec::with_capacity(columns as usize * rows as usize);

    for _ in 0..rows {
        let mut previous = [seed as i32; 2];
        for col in 0..columns as usize {
            let position = reader.position();
            let residual = tree.decode_residual(&mut reader)?;
            let value = previous[col & 1] + residual;
            if !(0..=u16::MAX as i32).contains(&value) {
                return Err(X3fError::CorruptStream {
                    position,
                    reason: format!("reconstructed sample {} outside 16 bits", value),
                });
            }
            previous[col & 1] = value;
            out.push(value as u16);
        }
    }
    Ok(out)
}
