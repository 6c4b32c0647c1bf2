//! CAMF camera metadata
//!
//! The section body is obfuscated in one of several ways selected by the CAMF type.
//! Once recovered, the plain data is a sequence of self-describing entry records.
//!
//! The per-type transforms sit behind [`CamfCipher`] so a different key schedule
//! can be supplied without touching the decoder; [`SigmaCipher`] is the known one.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};
use x3f_bitstream::{parse_true_table, BitReader, HuffmanCode, HuffmanTree};
use x3f_core::consts::{
    CAMF_ENTRY_HEADER_SIZE, CAMF_ENTRY_MATRIX, CAMF_ENTRY_PROPERTY, CAMF_ENTRY_TEXT,
    CAMF_TYPE4_SAMPLE_BITS,
};
use x3f_core::{X3fError, X3fResult};
use x3f_headers::{read_u32_at, CamfHeader, CamfVariant};

/// Keyed transforms applied to CAMF data
pub trait CamfCipher: Send + Sync {
    /// Type 2: transform the whole body in place with `key`
    fn decrypt_type2(&self, key: u32, data: &mut [u8]);

    /// Type 4: transform one unpacked block in place
    fn decrypt_type4_block(&self, key: u32, block_index: usize, block: &mut [u8]);

    /// Any other type: fixed transform in place
    fn decrypt_other(&self, header: &CamfHeader, data: &mut [u8]);
}

/// The keystream used by Sigma cameras
#[derive(Debug, Clone, Copy, Default)]
pub struct SigmaCipher;

impl CamfCipher for SigmaCipher {
    fn decrypt_type2(&self, key: u32, data: &mut [u8]) {
        xor_keystream(key, data);
    }

    fn decrypt_type4_block(&self, _key: u32, _block_index: usize, _block: &mut [u8]) {}

    fn decrypt_other(&self, _header: &CamfHeader, _data: &mut [u8]) {}
}

/// XOR `data` with the type 2 keystream seeded by `key`.
///
/// The transform is its own inverse.
pub fn xor_keystream(mut key: u32, data: &mut [u8]) {
    for byte in data.iter_mut() {
        key = key.wrapping_mul(1597).wrapping_add(51749) % 244944;
        let t = ((key as u64 * 301_593_171) >> 24) as u32;
        let mask = ((((key << 8).wrapping_sub(t)) >> 1).wrapping_add(t)) >> 17;
        *byte ^= mask as u8;
    }
}

/// Kind of a CAMF entry, from its id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamfEntryKind {
    Property,
    Text,
    Matrix,
    Unknown(u32),
}

impl From<u32> for CamfEntryKind {
    fn from(id: u32) -> Self {
        match id {
            CAMF_ENTRY_PROPERTY => CamfEntryKind::Property,
            CAMF_ENTRY_TEXT => CamfEntryKind::Text,
            CAMF_ENTRY_MATRIX => CamfEntryKind::Matrix,
            other => CamfEntryKind::Unknown(other),
        }
    }
}

/// Location of one entry inside the decoded data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamfRecord {
    /// Byte offset of the record in the decoded data
    pub offset: usize,
    pub id: u32,
    pub version: u32,
    pub entry_size: u32,
    /// Relative to `offset`
    pub name_offset: u32,
    /// Relative to `offset`
    pub value_offset: u32,
}

/// Borrowed view of an entry's name and value
#[derive(Debug, Clone, Copy)]
pub struct CamfEntry<'a> {
    pub record: &'a CamfRecord,
    pub name: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> CamfEntry<'a> {
    pub fn kind(&self) -> CamfEntryKind {
        self.record.id.into()
    }

    pub fn name_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    /// Text of a `CMbT` entry: a u32 length followed by that many bytes
    pub fn text(&self) -> Option<Cow<'a, str>> {
        if self.kind() != CamfEntryKind::Text || self.value.len() < 4 {
            return None;
        }
        let len = LittleEndian::read_u32(&self.value[..4]) as usize;
        let text = self.value[4..].get(..len)?;
        let text = text.split(|&b| b == 0).next().unwrap_or(text);
        Some(String::from_utf8_lossy(text))
    }
}

/// Type 4 coding state kept after decompression
#[derive(Debug, Clone)]
pub struct Type4Coding {
    pub table: Vec<HuffmanCode>,
    pub tree: HuffmanTree,
    /// Word stored after the code table
    pub stored_size: u32,
    /// Byte offset of the bitstream in the section body
    pub decoding_start: usize,
}

/// A decoded CAMF section
#[derive(Debug)]
pub struct Camf {
    pub header: CamfHeader,
    pub type4: Option<Type4Coding>,
    pub decoded: Vec<u8>,
    pub records: Vec<CamfRecord>,
    /// Problems found while walking the entry table; the walk carries on past
    /// malformed entries where it can
    pub skipped: Vec<X3fError>,
}

impl Camf {
    pub fn decode(header: &CamfHeader, body: &[u8], cipher: &dyn CamfCipher) -> X3fResult<Self> {
        let mut type4 = None;
        let decoded = match header.variant() {
            CamfVariant::Type2 { crypt_key, .. } => {
                let mut data = body.to_vec();
                cipher.decrypt_type2(crypt_key, &mut data);
                data
            }
            CamfVariant::Type4 {
                decoded_size,
                decode_bias,
                block_size,
                block_count,
                ..
            } => {
                let (coding, data) = decode_type4(
                    body,
                    decoded_size,
                    decode_bias,
                    block_size,
                    block_count,
                    cipher,
                )?;
                type4 = Some(coding);
                data
            }
            CamfVariant::Other { .. } => {
                let mut data = body.to_vec();
                cipher.decrypt_other(header, &mut data);
                data
            }
        };

        let (records, skipped) = parse_entry_table(&decoded);
        debug!(
            camf_type = header.camf_type,
            bytes = decoded.len(),
            entries = records.len(),
            skipped = skipped.len(),
            "decoded CAMF"
        );
        Ok(Self {
            header: *header,
            type4,
            decoded,
            records,
            skipped,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = CamfEntry<'_>> {
        self.records.iter().map(|record| self.view(record))
    }

    /// First entry named `name`
    pub fn entry(&self, name: &str) -> Option<CamfEntry<'_>> {
        self.entries().find(|e| e.name == name.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn view<'a>(&'a self, record: &'a CamfRecord) -> CamfEntry<'a> {
        let entry = &self.decoded[record.offset..record.offset + record.entry_size as usize];
        let names = &entry[record.name_offset as usize..record.value_offset as usize];
        let name = names.split(|&b| b == 0).next().unwrap_or(names);
        CamfEntry {
            record,
            name,
            value: &entry[record.value_offset as usize..],
        }
    }
}

/// Walk the entry records of decoded CAMF data.
///
/// Entries with offsets outside their record are reported and skipped. A record
/// whose size is impossible ends the walk, as does a zero id or a tail too short
/// for a record header.
pub fn parse_entry_table(data: &[u8]) -> (Vec<CamfRecord>, Vec<X3fError>) {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < CAMF_ENTRY_HEADER_SIZE {
            if data[offset..].iter().any(|&b| b != 0) {
                warn!(offset, remaining, "ignoring trailing CAMF bytes");
            }
            break;
        }

        let head = &data[offset..offset + CAMF_ENTRY_HEADER_SIZE];
        let id = LittleEndian::read_u32(&head[0..4]);
        if id == 0 {
            break;
        }
        let record = CamfRecord {
            offset,
            id,
            version: LittleEndian::read_u32(&head[4..8]),
            entry_size: LittleEndian::read_u32(&head[8..12]),
            name_offset: LittleEndian::read_u32(&head[12..16]),
            value_offset: LittleEndian::read_u32(&head[16..20]),
        };

        let size = record.entry_size as usize;
        if size < CAMF_ENTRY_HEADER_SIZE || size > remaining {
            warn!(offset, size, remaining, "CAMF entry size out of range, stopping");
            skipped.push(X3fError::out_of_range(offset, size, data.len()));
            break;
        }

        let name = record.name_offset as usize;
        let value = record.value_offset as usize;
        if name < CAMF_ENTRY_HEADER_SIZE || name > value || value > size {
            warn!(
                offset,
                name_offset = name,
                value_offset = value,
                size,
                "skipping CAMF entry with bad offsets"
            );
            skipped.push(X3fError::out_of_range(
                offset + name.min(value),
                name.abs_diff(value),
                offset + size,
            ));
        } else {
            records.push(record);
        }
        offset += size;
    }

    (records, skipped)
}

fn decode_type4(
    body: &[u8],
    decoded_size: u32,
    decode_bias: u32,
    block_size: u32,
    block_count: u32,
    cipher: &dyn CamfCipher,
) -> X3fResult<(Type4Coding, Vec<u8>)> {
    let (table, consumed) = parse_true_table(body)?;
    let tree = HuffmanTree::build(&table)?;
    let size_at = consumed.next_multiple_of(4);
    let stored_size = read_u32_at(body, size_at)?;
    let decoding_start = size_at + 4;

    let block_bytes = usize::try_from(
        (block_size as u64 * CAMF_TYPE4_SAMPLE_BITS as u64).div_ceil(8),
    )
    .map_err(|_| X3fError::InvalidHeader(format!("CAMF block size {} too large", block_size)))?;
    let target = match decoded_size {
        0 => block_bytes.checked_mul(block_count as usize).ok_or_else(|| {
            X3fError::InvalidHeader(format!(
                "CAMF type 4 declares {} blocks of {} samples",
                block_count, block_size
            ))
        })?,
        size => size as usize,
    };

    // A sample costs at least one bit and packs into at most two bytes
    let available = (body.len() - decoding_start.min(body.len())) * 8;
    if target > available.saturating_mul(2) {
        return Err(X3fError::TruncatedStream {
            position: decoding_start * 8,
            needed: target.div_ceil(2),
            available,
        });
    }
    debug!(
        codes = table.len(),
        decoding_start,
        stored_size,
        block_size,
        block_count,
        target,
        "CAMF type 4 layout"
    );

    let mut reader = BitReader::at_byte(body, decoding_start)?;
    let mut out = Vec::with_capacity(target);
    let bias = decode_bias as i64;
    let mut row_start = [bias; 2];

    for block_index in 0..block_count as usize {
        if out.len() >= target {
            break;
        }
        let mut block = Vec::new();
        let mut pending: Option<u16> = None;
        let mut previous = [0i64; 2];

        for col in 0..block_size as usize {
            if out.len() + block.len() >= target {
                break;
            }
            let residual = tree.decode_residual(&mut reader)? as i64;
            let value = if col < 2 {
                row_start[col] += residual;
                row_start[col]
            } else {
                previous[col & 1] + residual
            };
            previous[col & 1] = value;

            let sample = (value & 0xfff) as u16;
            match pending.take() {
                None => pending = Some(sample),
                Some(first) => block.extend_from_slice(&[
                    (first >> 4) as u8,
                    ((first << 4) | (sample >> 8)) as u8,
                    sample as u8,
                ]),
            }
        }
        if let Some(last) = pending {
            block.extend_from_slice(&[(last >> 4) as u8, (last << 4) as u8]);
        }

        cipher.decrypt_type4_block(decode_bias, block_index, &mut block);
        out.extend_from_slice(&block);
    }

    if out.len() < target {
        return Err(X3fError::CorruptStream {
            position: reader.position(),
            reason: format!(
                "CAMF type 4 blocks yield {} bytes, header declares {}",
                out.len(),
                target
            ),
        });
    }
    out.truncate(target);

    Ok((
        Type4Coding {
            table,
            tree,
            stored_size,
            decoding_start,
        },
        out,
    ))
}
