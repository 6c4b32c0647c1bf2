//! X3F directory section
//!
//! The last four bytes of the file hold the offset of the directory. The directory is
//! `SECd`, a version word, an entry count and `count` entries of `{offset, size, type}`.
//! Each entry points at a section that starts with its own fixed header; the entry type
//! selects which of the three header shapes to read.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;
use std::ops::Range;
use tracing::{debug, warn};
use x3f_core::consts::*;
use x3f_core::*;

use crate::{read_u32_at, require};

/// The three kinds of directory section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    PropertyList,
    Image,
    Camf,
}

impl SectionKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            SECTION_PROPERTY_LIST => Some(SectionKind::PropertyList),
            SECTION_IMAGE => Some(SectionKind::Image),
            SECTION_CAMF => Some(SectionKind::Camf),
            _ => None,
        }
    }

    pub fn tag(&self) -> u32 {
        match self {
            SectionKind::PropertyList => SECTION_PROPERTY_LIST,
            SectionKind::Image => SECTION_IMAGE,
            SectionKind::Camf => SECTION_CAMF,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::PropertyList => "property list",
            SectionKind::Image => "image",
            SectionKind::Camf => "CAMF",
        }
    }

    /// Size of the fixed header at the start of the section
    pub fn header_size(&self) -> usize {
        match self {
            SectionKind::PropertyList => PROPERTY_LIST_HEADER_SIZE,
            SectionKind::Image => IMAGE_HEADER_SIZE,
            SectionKind::Camf => CAMF_HEADER_SIZE,
        }
    }

    fn accepts_identifier(&self, identifier: u32) -> bool {
        match self {
            SectionKind::PropertyList => identifier == PROPERTY_LIST_MAGIC,
            SectionKind::Image => identifier == IMAGE_MAGIC || identifier == IMAGE2_MAGIC,
            SectionKind::Camf => identifier == CAMF_MAGIC,
        }
    }

    fn expected_identifier(&self) -> u32 {
        match self {
            SectionKind::PropertyList => PROPERTY_LIST_MAGIC,
            SectionKind::Image => IMAGE_MAGIC,
            SectionKind::Camf => CAMF_MAGIC,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte range of a section in the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub offset: u32,
    pub size: u32,
}

impl Extent {
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    pub fn range(&self) -> Range<usize> {
        self.offset as usize..self.offset as usize + self.size as usize
    }
}

/// Property list section header (2.0 fields)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyListHeader {
    pub num_properties: u32,
    /// 0 = UTF-16 (the only format in use)
    pub character_format: u32,
    pub reserved: u32,
    pub total_length: u32,
}

/// Image section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub type_format: TypeFormat,
    /// Width in pixels
    pub columns: u32,
    pub rows: u32,
    /// Row size in bytes, 0 for entropy-coded data
    pub row_stride: u32,
}

/// CAMF section header: a type word followed by four type-specific words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamfHeader {
    pub camf_type: u32,
    pub values: [u32; 4],
}

/// Typed view of a [`CamfHeader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamfVariant {
    Type2 {
        reserved: u32,
        infotype: u32,
        infotype_version: u32,
        crypt_key: u32,
    },
    Type4 {
        /// Size of the decompressed data, 0 when unknown
        decoded_size: u32,
        decode_bias: u32,
        block_size: u32,
        block_count: u32,
    },
    Other {
        camf_type: u32,
        values: [u32; 4],
    },
}

impl CamfHeader {
    pub fn variant(&self) -> CamfVariant {
        let [v0, v1, v2, v3] = self.values;
        match self.camf_type {
            2 => CamfVariant::Type2 {
                reserved: v0,
                infotype: v1,
                infotype_version: v2,
                crypt_key: v3,
            },
            4 => CamfVariant::Type4 {
                decoded_size: v0,
                decode_bias: v1,
                block_size: v2,
                block_count: v3,
            },
            camf_type => CamfVariant::Other {
                camf_type,
                values: self.values,
            },
        }
    }
}

/// Kind-specific section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionHeader {
    PropertyList(PropertyListHeader),
    Image(ImageHeader),
    Camf(CamfHeader),
}

impl SectionHeader {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionHeader::PropertyList(_) => SectionKind::PropertyList,
            SectionHeader::Image(_) => SectionKind::Image,
            SectionHeader::Camf(_) => SectionKind::Camf,
        }
    }
}

/// One directory entry with its section header resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub input: Extent,
    /// Identifier at the start of the section, e.g. `IMA2`
    pub identifier: u32,
    pub version: Version,
    pub header: SectionHeader,
}

impl DirectoryEntry {
    pub fn kind(&self) -> SectionKind {
        self.header.kind()
    }

    /// Whole section, header included
    pub fn section<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.input.range()]
    }

    /// Section bytes after the fixed header
    pub fn body<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &self.section(data)[self.kind().header_size()..]
    }

    fn parse(data: &[u8], input: Extent, kind: SectionKind) -> X3fResult<Self> {
        let offset = input.offset as usize;
        let header_size = kind.header_size();
        if (input.size as usize) < header_size {
            return Err(X3fError::TruncatedStream {
                position: offset * 8,
                needed: header_size * 8,
                available: input.size as usize * 8,
            });
        }

        let mut reader = Cursor::new(&data[offset..offset + header_size]);
        let identifier = reader.read_u32::<LittleEndian>()?;
        if !kind.accepts_identifier(identifier) {
            return Err(X3fError::BadMagic {
                offset: offset as u64,
                expected: kind.expected_identifier(),
                found: identifier,
            });
        }
        let version = Version::from_word(reader.read_u32::<LittleEndian>()?);

        let header = match kind {
            SectionKind::PropertyList => SectionHeader::PropertyList(PropertyListHeader {
                num_properties: reader.read_u32::<LittleEndian>()?,
                character_format: reader.read_u32::<LittleEndian>()?,
                reserved: reader.read_u32::<LittleEndian>()?,
                total_length: reader.read_u32::<LittleEndian>()?,
            }),
            SectionKind::Image => {
                let image_type = reader.read_u32::<LittleEndian>()?;
                let format = reader.read_u32::<LittleEndian>()?;
                SectionHeader::Image(ImageHeader {
                    type_format: TypeFormat::new(image_type, format),
                    columns: reader.read_u32::<LittleEndian>()?,
                    rows: reader.read_u32::<LittleEndian>()?,
                    row_stride: reader.read_u32::<LittleEndian>()?,
                })
            }
            SectionKind::Camf => {
                let camf_type = reader.read_u32::<LittleEndian>()?;
                let mut values = [0u32; 4];
                reader.read_u32_into::<LittleEndian>(&mut values)?;
                SectionHeader::Camf(CamfHeader { camf_type, values })
            }
        };

        Ok(Self {
            input,
            identifier,
            version,
            header,
        })
    }
}

/// Parsed directory section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub offset: u32,
    pub version: Version,
    pub entries: Vec<DirectoryEntry>,
}

impl Directory {
    /// Locate and parse the directory of a complete file image
    pub fn parse(data: &[u8]) -> X3fResult<Self> {
        if data.len() < 4 {
            return Err(X3fError::TruncatedStream {
                position: 0,
                needed: 32,
                available: data.len() * 8,
            });
        }
        let offset = read_u32_at(data, data.len() - 4)?;
        let base = offset as usize;
        require(data, base, DIRECTORY_HEADER_SIZE)?;

        let identifier = read_u32_at(data, base)?;
        if identifier != DIRECTORY_MAGIC {
            return Err(X3fError::BadMagic {
                offset: base as u64,
                expected: DIRECTORY_MAGIC,
                found: identifier,
            });
        }
        let version = Version::from_word(read_u32_at(data, base + 4)?);
        let count = read_u32_at(data, base + 8)? as usize;

        let table_offset = base + DIRECTORY_HEADER_SIZE;
        let table_size = count
            .checked_mul(DIRECTORY_ENTRY_SIZE)
            .ok_or_else(|| X3fError::out_of_range(table_offset, usize::MAX, data.len()))?;
        if table_offset
            .checked_add(table_size)
            .map_or(true, |end| end > data.len())
        {
            return Err(X3fError::out_of_range(table_offset, table_size, data.len()));
        }

        debug!(%version, entries = count, offset, "parsing directory");

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = table_offset + i * DIRECTORY_ENTRY_SIZE;
            let input = Extent {
                offset: read_u32_at(data, at)?,
                size: read_u32_at(data, at + 4)?,
            };
            let tag = read_u32_at(data, at + 8)?;

            if input.end() > data.len() as u64 {
                return Err(X3fError::OffsetOutOfRange {
                    offset: input.offset as u64,
                    size: input.size as u64,
                    limit: data.len() as u64,
                });
            }

            let Some(kind) = SectionKind::from_tag(tag) else {
                warn!(
                    entry = i,
                    tag = format_args!("{:#010x}", tag),
                    "skipping directory entry of unknown type"
                );
                continue;
            };

            let entry = DirectoryEntry::parse(data, input, kind)?;
            debug!(
                entry = i,
                kind = kind.name(),
                offset = input.offset,
                size = input.size,
                "directory entry"
            );
            entries.push(entry);
        }

        Ok(Self {
            offset,
            version,
            entries,
        })
    }
}
