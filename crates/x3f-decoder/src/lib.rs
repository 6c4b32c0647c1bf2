//! X3F container decoder
//!
//! [`X3fFile`] owns the file bytes together with the parsed header and directory.
//! Section payloads are decoded on first request and cached; a failed decode
//! leaves the entry unresolved and the rest of the file usable.

pub mod camf;
pub mod image;
pub mod info;
pub mod legacy;
pub mod property;
pub mod true_raw;

pub use camf::{
    xor_keystream, Camf, CamfCipher, CamfEntry, CamfEntryKind, CamfRecord, SigmaCipher,
};
pub use image::{ImageContent, ImageData};
pub use info::write_info;
pub use legacy::HuffmanImage;
pub use property::{Property, PropertyList};
pub use true_raw::TrueImage;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};
use x3f_core::{ImageCoding, TypeFormat, X3fError, X3fResult};
use x3f_headers::{Directory, DirectoryEntry, Header, SectionHeader, SectionKind};

/// Decoder configuration
#[derive(Clone)]
pub struct DecoderOptions {
    /// Decode legacy Huffman rows on the rayon pool
    pub parallel_rows: bool,
    /// Transforms used to recover CAMF data
    pub cipher: Arc<dyn CamfCipher>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            parallel_rows: true,
            cipher: Arc::new(SigmaCipher),
        }
    }
}

impl fmt::Debug for DecoderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderOptions")
            .field("parallel_rows", &self.parallel_rows)
            .finish_non_exhaustive()
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parallel_rows(mut self, parallel_rows: bool) -> Self {
        self.parallel_rows = parallel_rows;
        self
    }

    pub fn cipher<C: CamfCipher + 'static>(mut self, cipher: C) -> Self {
        self.cipher = Arc::new(cipher);
        self
    }
}

/// A decoded section payload
#[derive(Debug)]
pub enum Payload {
    PropertyList(PropertyList),
    Image(ImageData),
    Camf(Camf),
}

impl Payload {
    pub fn kind(&self) -> SectionKind {
        match self {
            Payload::PropertyList(_) => SectionKind::PropertyList,
            Payload::Image(_) => SectionKind::Image,
            Payload::Camf(_) => SectionKind::Camf,
        }
    }
}

/// An open X3F file
pub struct X3fFile {
    data: Vec<u8>,
    header: Header,
    directory: Directory,
    payloads: Vec<OnceLock<Payload>>,
    options: DecoderOptions,
}

impl fmt::Debug for X3fFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X3fFile")
            .field("bytes", &self.data.len())
            .field("header", &self.header)
            .field("entries", &self.directory.entries.len())
            .finish()
    }
}

impl X3fFile {
    /// Read a whole file from `reader` and parse its header and directory
    pub fn open<R: Read>(reader: R) -> X3fResult<Self> {
        Self::open_with_options(reader, DecoderOptions::default())
    }

    pub fn open_with_options<R: Read>(mut reader: R, options: DecoderOptions) -> X3fResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(data, options)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> X3fResult<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }

    pub fn from_bytes(data: Vec<u8>) -> X3fResult<Self> {
        Self::from_bytes_with_options(data, DecoderOptions::default())
    }

    pub fn from_bytes_with_options(data: Vec<u8>, options: DecoderOptions) -> X3fResult<Self> {
        let header = Header::parse(&data)?;
        let directory = Directory::parse(&data)?;
        info!(
            version = %header.version,
            columns = header.columns,
            rows = header.rows,
            entries = directory.entries.len(),
            "opened X3F file"
        );
        let payloads = directory.entries.iter().map(|_| OnceLock::new()).collect();
        Ok(Self {
            data,
            header,
            directory,
            payloads,
            options,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.directory.entries
    }

    pub fn entry(&self, index: usize) -> X3fResult<&DirectoryEntry> {
        self.directory
            .entries
            .get(index)
            .ok_or(X3fError::NoSuchEntry(index))
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// The undecoded bytes of a section, header included
    pub fn section_bytes(&self, index: usize) -> X3fResult<&[u8]> {
        Ok(self.entry(index)?.section(&self.data))
    }

    /// Payload of entry `index` if it has already been resolved
    pub fn payload(&self, index: usize) -> Option<&Payload> {
        self.payloads.get(index)?.get()
    }

    /// Decode entry `index`, or return the cached payload
    pub fn resolve(&self, index: usize) -> X3fResult<&Payload> {
        let entry = self.entry(index)?;
        let cell = &self.payloads[index];
        if let Some(payload) = cell.get() {
            return Ok(payload);
        }

        let body = entry.body(&self.data);
        debug!(index, kind = %entry.kind(), bytes = body.len(), "resolving section");
        let payload = match &entry.header {
            SectionHeader::PropertyList(header) => {
                Payload::PropertyList(PropertyList::decode(header, body)?)
            }
            SectionHeader::Image(header) => {
                Payload::Image(ImageData::decode(header, body, &self.options)?)
            }
            SectionHeader::Camf(header) => {
                Payload::Camf(Camf::decode(header, body, self.options.cipher.as_ref())?)
            }
        };
        Ok(cell.get_or_init(|| payload))
    }

    pub fn property_list(&self, index: usize) -> X3fResult<&PropertyList> {
        match self.resolve_kind(index, SectionKind::PropertyList)? {
            Payload::PropertyList(list) => Ok(list),
            other => Err(self.wrong_kind(index, SectionKind::PropertyList, other.kind())),
        }
    }

    pub fn image(&self, index: usize) -> X3fResult<&ImageData> {
        match self.resolve_kind(index, SectionKind::Image)? {
            Payload::Image(image) => Ok(image),
            other => Err(self.wrong_kind(index, SectionKind::Image, other.kind())),
        }
    }

    pub fn camf(&self, index: usize) -> X3fResult<&Camf> {
        match self.resolve_kind(index, SectionKind::Camf)? {
            Payload::Camf(camf) => Ok(camf),
            other => Err(self.wrong_kind(index, SectionKind::Camf, other.kind())),
        }
    }

    /// Decode a single row of a legacy Huffman image from its row offset
    pub fn decode_huffman_row(&self, index: usize, row: u32) -> X3fResult<Vec<u16>> {
        let image = self.image(index)?;
        let coding = image.huffman().ok_or_else(|| {
            X3fError::InvalidParameter(format!(
                "entry {} ({}) is not Huffman coded",
                index,
                image.type_format()
            ))
        })?;
        coding.decode_row(self.entry(index)?.body(&self.data), row)
    }

    /// First image entry whose type and format match
    pub fn find_image(&self, type_format: TypeFormat) -> Option<usize> {
        self.find_image_by(|tf| tf == type_format)
    }

    /// First RAW image entry of any coding
    pub fn find_raw(&self) -> Option<usize> {
        self.find_image_by(|tf| tf.coding().map(|c| c.is_raw()).unwrap_or(false))
    }

    pub fn find_thumb_plain(&self) -> Option<usize> {
        self.find_image_by(|tf| matches!(tf.coding(), Ok(ImageCoding::ThumbPlain)))
    }

    pub fn find_thumb_huffman(&self) -> Option<usize> {
        self.find_image_by(|tf| matches!(tf.coding(), Ok(ImageCoding::ThumbHuffman)))
    }

    pub fn find_thumb_jpeg(&self) -> Option<usize> {
        self.find_image_by(|tf| matches!(tf.coding(), Ok(ImageCoding::ThumbJpeg)))
    }

    pub fn find_camf(&self) -> Option<usize> {
        self.find_kind(SectionKind::Camf)
    }

    pub fn find_property_list(&self) -> Option<usize> {
        self.find_kind(SectionKind::PropertyList)
    }

    fn find_kind(&self, kind: SectionKind) -> Option<usize> {
        self.directory.entries.iter().position(|e| e.kind() == kind)
    }

    fn find_image_by<F: Fn(TypeFormat) -> bool>(&self, predicate: F) -> Option<usize> {
        self.directory.entries.iter().position(|e| match &e.header {
            SectionHeader::Image(header) => predicate(header.type_format),
            _ => false,
        })
    }

    fn resolve_kind(&self, index: usize, expected: SectionKind) -> X3fResult<&Payload> {
        let found = self.entry(index)?.kind();
        if found != expected {
            return Err(self.wrong_kind(index, expected, found));
        }
        self.resolve(index)
    }

    fn wrong_kind(&self, index: usize, expected: SectionKind, found: SectionKind) -> X3fError {
        X3fError::WrongSectionKind {
            index,
            expected: expected.name(),
            found: found.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x3f_core::consts::{DIRECTORY_MAGIC, FILE_MAGIC, IMAGE2_MAGIC, SECTION_IMAGE};
    use x3f_core::Version;

    // Header, one pixmap image section and the directory
    fn pixmap_file(type_format: TypeFormat) -> Vec<u8> {
        let mut data = Vec::new();
        for word in [FILE_MAGIC, Version::V2_0.to_word()] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        data.extend_from_slice(&[0u8; 16]);
        for word in [0u32, 1, 1, 0] {
            data.extend_from_slice(&word.to_le_bytes());
        }

        let section_offset = data.len() as u32;
        for word in [
            IMAGE2_MAGIC,
            Version::V2_0.to_word(),
            type_format.image_type,
            type_format.format,
            1,
            1,
            3,
        ] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        data.extend_from_slice(&[10, 20, 30]);
        let section_size = data.len() as u32 - section_offset;

        let directory_offset = data.len() as u32;
        for word in [
            DIRECTORY_MAGIC,
            Version::V2_0.to_word(),
            1,
            section_offset,
            section_size,
            SECTION_IMAGE,
        ] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        data.extend_from_slice(&directory_offset.to_le_bytes());
        data
    }

    #[test]
    fn test_resolve_caches_payload() {
        let file = X3fFile::from_bytes(pixmap_file(TypeFormat::THUMB_PLAIN)).unwrap();
        assert!(file.payload(0).is_none());
        let first = file.resolve(0).unwrap() as *const Payload;
        let second = file.resolve(0).unwrap() as *const Payload;
        assert_eq!(first, second);
        assert!(file.payload(0).is_some());
        assert_eq!(file.find_thumb_plain(), Some(0));
        assert_eq!(file.find_raw(), None);
    }

    #[test]
    fn test_failed_resolve_is_not_cached() {
        let file = X3fFile::from_bytes(pixmap_file(TypeFormat::new(9, 9))).unwrap();
        assert!(matches!(
            file.resolve(0),
            Err(X3fError::UnsupportedFormat { .. })
        ));
        assert!(file.payload(0).is_none());
        assert!(file.section_bytes(0).is_ok());
    }

    #[test]
    fn test_wrong_kind() {
        let file = X3fFile::from_bytes(pixmap_file(TypeFormat::THUMB_PLAIN)).unwrap();
        assert!(matches!(
            file.camf(0),
            Err(X3fError::WrongSectionKind {
                index: 0,
                expected: "CAMF",
                ..
            })
        ));
        assert!(matches!(file.resolve(3), Err(X3fError::NoSuchEntry(3))));
    }

    #[test]
    fn test_decode_row_needs_huffman() {
        let file = X3fFile::from_bytes(pixmap_file(TypeFormat::THUMB_PLAIN)).unwrap();
        assert!(matches!(
            file.decode_huffman_row(0, 0),
            Err(X3fError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_options_builder() {
        let options = DecoderOptions::new().parallel_rows(false).cipher(SigmaCipher);
        assert!(!options.parallel_rows);
        assert!(DecoderOptions::default().parallel_rows);
    }
}
