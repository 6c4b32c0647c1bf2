//! Core value types for X3F

use num_traits::PrimInt;
use std::fmt;

use crate::{X3fError, X3fResult};

/// Container or section version (`major.minor`, stored as `major << 16 | minor`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const V2_0: Version = Version::new(2, 0);
    pub const V2_1: Version = Version::new(2, 1);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn from_word(word: u32) -> Self {
        Self {
            major: (word >> 16) as u16,
            minor: (word & 0xffff) as u16,
        }
    }

    pub fn to_word(self) -> u32 {
        crate::x3f_version(self.major, self.minor)
    }

    /// 2.1 and later carry white balance and extended adjustment fields
    pub fn has_extended_header(self) -> bool {
        self > Version::V2_0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Image rotation applied after decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None = 0,
    Rotate90 = 90,
    Rotate180 = 180,
    Rotate270 = 270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> X3fResult<Self> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            other => Err(X3fError::InvalidHeader(format!(
                "rotation must be 0, 90, 180 or 270, found {}",
                other
            ))),
        }
    }

    pub fn degrees(&self) -> u32 {
        *self as u32
    }
}

/// Meaning of an extended header slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedType {
    None,
    ExposureAdjust,
    ContrastAdjust,
    ShadowAdjust,
    HighlightAdjust,
    SaturationAdjust,
    SharpnessAdjust,
    RedAdjust,
    GreenAdjust,
    BlueAdjust,
    FillLightAdjust,
    Unknown(u8),
}

impl From<u8> for ExtendedType {
    fn from(value: u8) -> Self {
        match value {
            0 => ExtendedType::None,
            1 => ExtendedType::ExposureAdjust,
            2 => ExtendedType::ContrastAdjust,
            3 => ExtendedType::ShadowAdjust,
            4 => ExtendedType::HighlightAdjust,
            5 => ExtendedType::SaturationAdjust,
            6 => ExtendedType::SharpnessAdjust,
            7 => ExtendedType::RedAdjust,
            8 => ExtendedType::GreenAdjust,
            9 => ExtendedType::BlueAdjust,
            10 => ExtendedType::FillLightAdjust,
            other => ExtendedType::Unknown(other),
        }
    }
}

/// Image section `type` and `format` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeFormat {
    pub image_type: u32,
    pub format: u32,
}

impl TypeFormat {
    pub const RAW_HUFFMAN_X530: TypeFormat = TypeFormat::new(3, 5);
    pub const RAW_HUFFMAN_10BIT: TypeFormat = TypeFormat::new(3, 6);
    pub const RAW_HUFFMAN_10BIT_SD: TypeFormat = TypeFormat::new(1, 6);
    pub const RAW_TRUE: TypeFormat = TypeFormat::new(3, 0x1e);
    pub const RAW_TRUE_SD1: TypeFormat = TypeFormat::new(1, 0x1e);
    pub const THUMB_PLAIN: TypeFormat = TypeFormat::new(2, 3);
    pub const THUMB_HUFFMAN: TypeFormat = TypeFormat::new(2, 11);
    pub const THUMB_JPEG: TypeFormat = TypeFormat::new(2, 18);

    pub const fn new(image_type: u32, format: u32) -> Self {
        Self { image_type, format }
    }

    /// Dispatch key `type << 16 | format`
    pub fn key(&self) -> u32 {
        (self.image_type << 16) | (self.format & 0xffff)
    }

    /// Classify the pair, rejecting combinations the format does not define
    pub fn coding(&self) -> X3fResult<ImageCoding> {
        match *self {
            TypeFormat::RAW_HUFFMAN_10BIT
            | TypeFormat::RAW_HUFFMAN_10BIT_SD
            | TypeFormat::RAW_HUFFMAN_X530 => Ok(ImageCoding::RawHuffman),
            TypeFormat::RAW_TRUE | TypeFormat::RAW_TRUE_SD1 => Ok(ImageCoding::RawTrue),
            TypeFormat::THUMB_PLAIN => Ok(ImageCoding::ThumbPlain),
            TypeFormat::THUMB_HUFFMAN => Ok(ImageCoding::ThumbHuffman),
            TypeFormat::THUMB_JPEG => Ok(ImageCoding::ThumbJpeg),
            _ => Err(X3fError::UnsupportedFormat {
                image_type: self.image_type,
                format: self.format,
            }),
        }
    }
}

impl fmt::Display for TypeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.image_type, self.format)
    }
}

/// Decoder selected by a [`TypeFormat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCoding {
    /// 10-bit value-mapped Huffman RAW
    RawHuffman,
    /// TRUE differential Huffman RAW
    RawTrue,
    /// Uncompressed 8-bit RGB thumbnail
    ThumbPlain,
    /// 8-bit Huffman thumbnail
    ThumbHuffman,
    /// Embedded JPEG thumbnail
    ThumbJpeg,
}

impl ImageCoding {
    pub fn is_raw(&self) -> bool {
        matches!(self, ImageCoding::RawHuffman | ImageCoding::RawTrue)
    }
}

/// Sample storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
}

impl SampleType {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::U16 => 2,
        }
    }
}

/// Decoded sample type
pub trait Sample: PrimInt + Send + Sync {
    const SAMPLE_TYPE: SampleType;

    /// Widen to the full 16-bit range
    fn to_u16_range(self) -> u16;
}

impl Sample for u8 {
    const SAMPLE_TYPE: SampleType = SampleType::U8;

    fn to_u16_range(self) -> u16 {
        self as u16 * 257
    }
}

impl Sample for u16 {
    const SAMPLE_TYPE: SampleType = SampleType::U16;

    fn to_u16_range(self) -> u16 {
        self
    }
}
