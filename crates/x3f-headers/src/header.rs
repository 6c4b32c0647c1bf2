//! X3F fixed file header
//!
//! Layout (all fields little-endian):
//! - `FOVb` identifier, version word, 16-byte unique identifier
//! - mark bits, columns, rows, rotation (columns and rows are before rotation)
//! - 2.1 and later: 32-byte white balance label, 32 extended types, 32 extended values

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};
use tracing::debug;
use x3f_core::consts::{
    FILE_MAGIC, HEADER_SIZE_2_0, HEADER_SIZE_2_1, NUM_EXTENDED_DATA, UNIQUE_IDENTIFIER_SIZE,
    WHITE_BALANCE_SIZE,
};
use x3f_core::*;

use crate::require;

/// Fields appended to the header from version 2.1 on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedHeader {
    /// NUL padded white balance label, e.g. `Auto`
    pub white_balance: [u8; WHITE_BALANCE_SIZE],
    /// Raw [`ExtendedType`] codes
    pub extended_types: [u8; NUM_EXTENDED_DATA],
    /// IEEE-754 single precision bit patterns
    pub extended_data: [u32; NUM_EXTENDED_DATA],
}

impl ExtendedHeader {
    /// White balance label up to the first NUL
    pub fn white_balance(&self) -> String {
        let end = self
            .white_balance
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(WHITE_BALANCE_SIZE);
        String::from_utf8_lossy(&self.white_balance[..end]).into_owned()
    }

    /// Adjustment pairs of every used slot
    pub fn adjustments(&self) -> impl Iterator<Item = (ExtendedType, f32)> + '_ {
        self.extended_types
            .iter()
            .zip(self.extended_data.iter())
            .map(|(&t, &v)| (ExtendedType::from(t), f32::from_bits(v)))
            .filter(|(t, _)| *t != ExtendedType::None)
    }
}

/// X3F file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub unique_identifier: [u8; UNIQUE_IDENTIFIER_SIZE],
    pub mark_bits: u32,
    pub columns: u32,
    pub rows: u32,
    pub rotation: Rotation,
    /// Present exactly when `version > 2.0`
    pub extended: Option<ExtendedHeader>,
}

impl Header {
    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> X3fResult<Self> {
        require(data, 0, HEADER_SIZE_2_0)?;
        let mut reader = Cursor::new(data);

        let identifier = reader.read_u32::<LittleEndian>()?;
        if identifier != FILE_MAGIC {
            return Err(X3fError::BadMagic {
                offset: 0,
                expected: FILE_MAGIC,
                found: identifier,
            });
        }

        let version = Version::from_word(reader.read_u32::<LittleEndian>()?);
        if version < X3F_VERSION_MIN {
            return Err(X3fError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        let mut unique_identifier = [0u8; UNIQUE_IDENTIFIER_SIZE];
        reader.read_exact(&mut unique_identifier)?;
        let mark_bits = reader.read_u32::<LittleEndian>()?;
        let columns = reader.read_u32::<LittleEndian>()?;
        let rows = reader.read_u32::<LittleEndian>()?;
        let rotation = Rotation::from_degrees(reader.read_u32::<LittleEndian>()?)?;

        let extended = if version.has_extended_header() {
            require(data, 0, HEADER_SIZE_2_1)?;
            let mut white_balance = [0u8; WHITE_BALANCE_SIZE];
            reader.read_exact(&mut white_balance)?;
            let mut extended_types = [0u8; NUM_EXTENDED_DATA];
            reader.read_exact(&mut extended_types)?;
            let mut extended_data = [0u32; NUM_EXTENDED_DATA];
            reader.read_u32_into::<LittleEndian>(&mut extended_data)?;
            Some(ExtendedHeader {
                white_balance,
                extended_types,
                extended_data,
            })
        } else {
            None
        };

        debug!(
            %version,
            columns,
            rows,
            rotation = rotation.degrees(),
            "parsed X3F header"
        );

        Ok(Self {
            version,
            unique_identifier,
            mark_bits,
            columns,
            rows,
            rotation,
            extended,
        })
    }

    /// Serialized size of this header
    pub fn size(&self) -> usize {
        if self.extended.is_some() {
            HEADER_SIZE_2_1
        } else {
            HEADER_SIZE_2_0
        }
    }

    /// Write the header back in file layout
    pub fn write<W: Write>(&self, writer: &mut W) -> X3fResult<()> {
        if self.extended.is_some() != self.version.has_extended_header() {
            return Err(X3fError::InvalidHeader(format!(
                "version {} {} extended fields",
                self.version,
                if self.extended.is_some() {
                    "cannot carry"
                } else {
                    "requires"
                }
            )));
        }

        writer.write_u32::<LittleEndian>(FILE_MAGIC)?;
        writer.write_u32::<LittleEndian>(self.version.to_word())?;
        writer.write_all(&self.unique_identifier)?;
        writer.write_u32::<LittleEndian>(self.mark_bits)?;
        writer.write_u32::<LittleEndian>(self.columns)?;
        writer.write_u32::<LittleEndian>(self.rows)?;
        writer.write_u32::<LittleEndian>(self.rotation.degrees())?;

        if let Some(ext) = &self.extended {
            writer.write_all(&ext.white_balance)?;
            writer.write_all(&ext.extended_types)?;
            for value in ext.extended_data {
                writer.write_u32::<LittleEndian>(value)?;
            }
        }
        Ok(())
    }

    /// Rows and columns after applying the rotation
    pub fn rotated_dimensions(&self) -> (u32, u32) {
        match self.rotation {
            Rotation::Rotate90 | Rotation::Rotate270 => (self.rows, self.columns),
            Rotation::None | Rotation::Rotate180 => (self.columns, self.rows),
        }
    }
}
