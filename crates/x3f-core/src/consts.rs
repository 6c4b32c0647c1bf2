//! Constants used throughout the X3F implementation

/// Pack a four character tag the way it appears in the file (little-endian)
pub const fn fourcc(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

/// Main file identifier
pub const FILE_MAGIC: u32 = fourcc(b"FOVb");
/// Directory section identifier
pub const DIRECTORY_MAGIC: u32 = fourcc(b"SECd");

/// Directory entry type tags
pub const SECTION_PROPERTY_LIST: u32 = fourcc(b"SECp");
pub const SECTION_IMAGE: u32 = fourcc(b"SECi");
pub const SECTION_CAMF: u32 = fourcc(b"SECc");

/// Section header identifiers
pub const PROPERTY_LIST_MAGIC: u32 = fourcc(b"PROP");
pub const IMAGE_MAGIC: u32 = fourcc(b"IMAG");
pub const IMAGE2_MAGIC: u32 = fourcc(b"IMA2");
pub const CAMF_MAGIC: u32 = fourcc(b"CAMF");

/// CAMF entry identifiers
pub const CAMF_ENTRY_PROPERTY: u32 = fourcc(b"CMbP");
pub const CAMF_ENTRY_TEXT: u32 = fourcc(b"CMbT");
pub const CAMF_ENTRY_MATRIX: u32 = fourcc(b"CMbM");

/// Fixed header field sizes
pub const UNIQUE_IDENTIFIER_SIZE: usize = 16;
pub const WHITE_BALANCE_SIZE: usize = 32;
pub const NUM_EXTENDED_DATA: usize = 32;

/// Header size of a 2.0 file
pub const HEADER_SIZE_2_0: usize = 40;
/// Header size of a 2.1+ file (white balance and extended data appended)
pub const HEADER_SIZE_2_1: usize =
    HEADER_SIZE_2_0 + WHITE_BALANCE_SIZE + NUM_EXTENDED_DATA + 4 * NUM_EXTENDED_DATA;

pub const DIRECTORY_HEADER_SIZE: usize = 12;
pub const DIRECTORY_ENTRY_SIZE: usize = 12;
pub const PROPERTY_LIST_HEADER_SIZE: usize = 24;
pub const IMAGE_HEADER_SIZE: usize = 28;
pub const CAMF_HEADER_SIZE: usize = 28;
pub const CAMF_ENTRY_HEADER_SIZE: usize = 20;

/// Number of colour planes in an X3 image
pub const CHANNELS: usize = 3;
/// Seed every TRUE plane is expected to start from
pub const TRUE_SEED: u16 = 512;

/// Leaf value of a tree node that no code reaches
pub const UNDEFINED_LEAF: u32 = 0xffff_ffff;
/// Longest code the tree builder accepts
pub const MAX_CODE_LENGTH: u8 = 32;

/// Legacy Huffman coding table element: length in bits 27..31, code in bits 0..26
pub const HUFFMAN_LENGTH_SHIFT: u32 = 27;
pub const HUFFMAN_CODE_MASK: u32 = 0x07ff_ffff;

/// Mapping table width of 10-bit legacy RAW
pub const RAW_HUFFMAN_BITS: u32 = 10;
/// Symbol width of 8-bit Huffman thumbnails
pub const THUMB_HUFFMAN_BITS: u32 = 8;

/// CAMF type 4 packs two 12-bit samples into three bytes
pub const CAMF_TYPE4_SAMPLE_BITS: u32 = 12;
