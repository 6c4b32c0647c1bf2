//! Synthetic X3F files for integration tests

#![allow(dead_code)]

use x3f::bitstream::{encode_residual, BitWriter, HuffmanCode};
use x3f::consts::{
    fourcc, CAMF_MAGIC, DIRECTORY_MAGIC, IMAGE2_MAGIC, PROPERTY_LIST_MAGIC, SECTION_CAMF,
    SECTION_IMAGE, SECTION_PROPERTY_LIST,
};
use x3f::{ExtendedHeader, Header, Rotation, TypeFormat, Version};

fn push_u32s(data: &mut Vec<u8>, words: &[u32]) {
    for word in words {
        data.extend_from_slice(&word.to_le_bytes());
    }
}

pub fn header(version: Version, columns: u32, rows: u32) -> Header {
    let extended = version.has_extended_header().then(|| {
        let mut white_balance = [0u8; 32];
        white_balance[..8].copy_from_slice(b"Daylight");
        let mut extended_types = [0u8; 32];
        let mut extended_data = [0u32; 32];
        extended_types[0] = 1;
        extended_data[0] = 0.5f32.to_bits();
        ExtendedHeader {
            white_balance,
            extended_types,
            extended_data,
        }
    });
    Header {
        version,
        unique_identifier: *b"0123456789abcdef",
        mark_bits: 0,
        columns,
        rows,
        rotation: Rotation::None,
        extended,
    }
}

/// Builds a file section by section, then appends the directory
pub struct X3fBuilder {
    header: Header,
    sections: Vec<(u32, Vec<u8>)>,
}

impl X3fBuilder {
    pub fn new(version: Version) -> Self {
        Self {
            header: header(version, 4, 4),
            sections: Vec::new(),
        }
    }

    pub fn property_list(mut self, pairs: &[(&str, &str)]) -> Self {
        let mut units: Vec<u16> = Vec::new();
        let mut table = Vec::new();
        for (name, value) in pairs {
            let name_offset = units.len() as u32;
            units.extend(name.encode_utf16());
            units.push(0);
            let value_offset = units.len() as u32;
            units.extend(value.encode_utf16());
            units.push(0);
            push_u32s(&mut table, &[name_offset, value_offset]);
        }

        let mut section = Vec::new();
        push_u32s(
            &mut section,
            &[
                PROPERTY_LIST_MAGIC,
                Version::V2_0.to_word(),
                pairs.len() as u32,
                0,
                0,
                units.len() as u32,
            ],
        );
        section.extend(table);
        for unit in units {
            section.extend_from_slice(&unit.to_le_bytes());
        }
        self.sections.push((SECTION_PROPERTY_LIST, section));
        self
    }

    pub fn image(
        mut self,
        type_format: TypeFormat,
        columns: u32,
        rows: u32,
        row_stride: u32,
        body: &[u8],
    ) -> Self {
        let mut section = Vec::new();
        push_u32s(
            &mut section,
            &[
                IMAGE2_MAGIC,
                Version::V2_0.to_word(),
                type_format.image_type,
                type_format.format,
                columns,
                rows,
                row_stride,
            ],
        );
        section.extend_from_slice(body);
        self.sections.push((SECTION_IMAGE, section));
        self
    }

    pub fn camf(mut self, camf_type: u32, values: [u32; 4], body: &[u8]) -> Self {
        let mut section = Vec::new();
        push_u32s(&mut section, &[CAMF_MAGIC, Version::V2_0.to_word(), camf_type]);
        push_u32s(&mut section, &values);
        section.extend_from_slice(body);
        self.sections.push((SECTION_CAMF, section));
        self
    }

    /// A directory entry with a tag no decoder knows
    pub fn unknown_section(mut self, bytes: &[u8]) -> Self {
        self.sections.push((fourcc(b"SECz"), bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.header.write(&mut data).unwrap();

        let mut entries = Vec::new();
        for (tag, section) in &self.sections {
            entries.push([data.len() as u32, section.len() as u32, *tag]);
            data.extend_from_slice(section);
        }

        let directory_offset = data.len() as u32;
        push_u32s(
            &mut data,
            &[DIRECTORY_MAGIC, Version::V2_0.to_word(), entries.len() as u32],
        );
        for entry in &entries {
            push_u32s(&mut data, entry);
        }
        push_u32s(&mut data, &[directory_offset]);
        data
    }
}

/// Residual categories 0..=15, each with a 4-bit code equal to the category
pub fn residual_codes() -> Vec<HuffmanCode> {
    (0..16).map(|n| HuffmanCode::new(4, n)).collect()
}

pub fn encode_residuals(codes: &[HuffmanCode], residuals: &[i32]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    for &residual in residuals {
        let (category, raw) = encode_residual(residual);
        writer.write_code(codes[category as usize]).unwrap();
        writer.write_bits(raw, category as usize).unwrap();
    }
    writer.into_bytes()
}

/// TRUE image body with one residual list per plane
pub fn true_body(seed: u16, planes: [&[i32]; 3]) -> Vec<u8> {
    let codes = residual_codes();
    let mut body = Vec::new();
    for _ in 0..3 {
        body.extend_from_slice(&seed.to_le_bytes());
    }
    body.extend_from_slice(&0u16.to_le_bytes());
    for code in &codes {
        body.extend_from_slice(&code.to_true_pair());
    }
    body.extend_from_slice(&[0, 0]);

    let planes: Vec<Vec<u8>> = planes
        .iter()
        .map(|residuals| encode_residuals(&codes, residuals))
        .collect();
    for plane in &planes {
        body.extend_from_slice(&(plane.len() as u32).to_le_bytes());
    }
    for plane in &planes {
        body.extend_from_slice(plane);
    }
    body
}

/// Legacy 10-bit body: identity-plus-offset mapping, a 2-bit code for symbols
/// 0..=3 and one bitstream row per entry of `rows`
pub fn legacy_body(rows: &[Vec<u32>]) -> Vec<u8> {
    let entries = 1usize << 10;
    let mut body = Vec::new();
    for value in 0..entries as u16 {
        body.extend_from_slice(&(value + 100).to_le_bytes());
    }
    for symbol in 0..entries as u32 {
        let element = if symbol < 4 {
            HuffmanCode::new(2, symbol).to_packed()
        } else {
            0
        };
        body.extend_from_slice(&element.to_le_bytes());
    }

    let mut pixels = Vec::new();
    let mut offsets = Vec::new();
    for row in rows {
        offsets.push(pixels.len() as u32);
        let mut writer = BitWriter::new();
        for &symbol in row {
            writer.write_code(HuffmanCode::new(2, symbol)).unwrap();
        }
        pixels.extend(writer.into_bytes());
    }
    body.extend(pixels);
    push_u32s(&mut body, &offsets);
    body
}

/// One CAMF entry record
pub fn camf_entry(id: &[u8; 4], name: &str, value: &[u8]) -> Vec<u8> {
    let name_offset = 20u32;
    let value_offset = name_offset + name.len() as u32 + 1;
    let mut out = Vec::new();
    push_u32s(
        &mut out,
        &[
            fourcc(id),
            2,
            value_offset + value.len() as u32,
            name_offset,
            value_offset,
        ],
    );
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    out.extend_from_slice(value);
    out
}

pub fn camf_text(text: &str) -> Vec<u8> {
    let mut value = (text.len() as u32).to_le_bytes().to_vec();
    value.extend_from_slice(text.as_bytes());
    value
}
