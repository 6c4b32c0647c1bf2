//! Property list sections
//!
//! After the fixed header come `num_properties` pairs of `(name_offset, value_offset)`
//! followed by a blob of UTF-16LE text. Offsets count code units from the start of the
//! blob and point at NUL terminated strings.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;
use x3f_core::{X3fError, X3fResult};
use x3f_headers::PropertyListHeader;

/// One decoded name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name_offset: u32,
    pub value_offset: u32,
    pub name: String,
    pub value: String,
}

/// Decoded property list, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyList {
    pub header: PropertyListHeader,
    pub properties: Vec<Property>,
}

impl PropertyList {
    /// Decode from the section body (everything after the fixed header)
    pub fn decode(header: &PropertyListHeader, body: &[u8]) -> X3fResult<Self> {
        let count = header.num_properties as usize;
        let table_size = count
            .checked_mul(8)
            .filter(|&size| size <= body.len())
            .ok_or_else(|| X3fError::out_of_range(0, count.saturating_mul(8), body.len()))?;

        let blob = &body[table_size..];
        let mut units = vec![0u16; blob.len() / 2];
        LittleEndian::read_u16_into(&blob[..units.len() * 2], &mut units);

        let mut properties = Vec::with_capacity(count);
        for pair in body[..table_size].chunks_exact(8) {
            let name_offset = LittleEndian::read_u32(&pair[0..4]);
            let value_offset = LittleEndian::read_u32(&pair[4..8]);
            properties.push(Property {
                name_offset,
                value_offset,
                name: utf16z_at(&units, name_offset)?,
                value: utf16z_at(&units, value_offset)?,
            });
        }

        debug!(properties = properties.len(), "decoded property list");
        Ok(Self {
            header: *header,
            properties,
        })
    }

    /// First value stored under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// NUL terminated UTF-16 string starting at code unit `offset`
fn utf16z_at(units: &[u16], offset: u32) -> X3fResult<String> {
    let start = offset as usize;
    let limit = units.len() * 2;
    let tail = units
        .get(start..)
        .filter(|tail| !tail.is_empty())
        .ok_or_else(|| X3fError::out_of_range(start * 2, 2, limit))?;
    let len = tail
        .iter()
        .position(|&u| u == 0)
        .ok_or_else(|| X3fError::out_of_range(start * 2, tail.len() * 2 + 2, limit))?;
    Ok(String::from_utf16_lossy(&tail[..len]))
}
