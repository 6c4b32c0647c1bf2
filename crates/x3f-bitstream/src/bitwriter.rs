//! Bitstream writer implementation
//!
//! The inverse of [`crate::BitReader`]: packs values MSB-first. X3F decoding never
//! writes bitstreams, so this is used to synthesize coded sections.

use bitvec::prelude::*;
use x3f_core::{X3fError, X3fResult};

use crate::HuffmanCode;

/// MSB-first bit packer into an owned byte buffer
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the low `num_bits` bits of `value` (at most 32), most significant first
    pub fn write_bits(&mut self, value: u32, num_bits: usize) -> X3fResult<()> {
        if num_bits > 32 {
            return Err(X3fError::InvalidParameter(
                "Cannot write more than 32 bits at once".to_string(),
            ));
        }
        if num_bits == 0 {
            return Ok(());
        }
        let start = self.bits.len();
        self.bits.resize(start + num_bits, false);
        self.bits[start..].store_be(value);
        Ok(())
    }

    /// Write a single bit
    pub fn write_bit(&mut self, value: bool) {
        self.bits.push(value);
    }

    /// Write a prefix code
    pub fn write_code(&mut self, code: HuffmanCode) -> X3fResult<()> {
        self.write_bits(code.code, code.length as usize)
    }

    /// Pad with zero bits to the next byte boundary
    pub fn align_to_byte(&mut self) {
        let padded = self.bits.len().div_ceil(8) * 8;
        self.bits.resize(padded, false);
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Finish the stream, zero-padding the last byte
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.bits.into_vec()
    }
}
