//! Bitstream reading and prefix-code decoding for X3F
//!
//! This crate provides the MSB-first bit reader shared by every entropy-coded section
//! of an X3F file, and the Huffman tree used by the legacy RAW/thumbnail coder, the
//! TRUE coder and CAMF type 4 compression.

pub mod bitreader;
pub mod bitwriter;
pub mod huffman;

pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use huffman::{encode_residual, parse_true_table, HuffmanCode, HuffmanTree};
