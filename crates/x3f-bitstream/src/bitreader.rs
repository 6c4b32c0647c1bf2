//! Bitstream reader implementation

use bitvec::prelude::*;
use x3f_core::{X3fError, X3fResult};

/// MSB-first bit cursor over a borrowed byte buffer
///
/// Reads never run past the end of the buffer: a request for more bits than remain
/// fails with [`X3fError::TruncatedStream`] and leaves the position unchanged.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bits: data.view_bits::<Msb0>(),
            position: 0,
        }
    }

    /// Reader positioned at byte `offset` of `data`
    pub fn at_byte(data: &'a [u8], offset: usize) -> X3fResult<Self> {
        let mut reader = Self::new(data);
        reader.seek_to_byte(offset)?;
        Ok(reader)
    }

    /// Current position in bits from the start of the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn remaining_bits(&self) -> usize {
        self.bits.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.bits.len()
    }

    pub fn seek_to_byte(&mut self, offset: usize) -> X3fResult<()> {
        let bit_offset = offset
            .checked_mul(8)
            .filter(|&b| b <= self.bits.len())
            .ok_or_else(|| X3fError::out_of_range(offset, 0, self.bits.len() / 8))?;
        self.position = bit_offset;
        Ok(())
    }

    fn check_available(&self, num_bits: usize) -> X3fResult<()> {
        if num_bits > 32 {
            return Err(X3fError::InvalidParameter(
                "Cannot read more than 32 bits at once".to_string(),
            ));
        }
        if self.remaining_bits() < num_bits {
            return Err(X3fError::TruncatedStream {
                position: self.position,
                needed: num_bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Look at the next `num_bits` bits (at most 32) without consuming them
    pub fn peek_bits(&self, num_bits: usize) -> X3fResult<u32> {
        if num_bits == 0 {
            return Ok(0);
        }
        self.check_available(num_bits)?;
        Ok(self.bits[self.position..self.position + num_bits].load_be::<u32>())
    }

    /// Read the next `num_bits` bits (at most 32), first bit most significant
    pub fn read_bits(&mut self, num_bits: usize) -> X3fResult<u32> {
        let value = self.peek_bits(num_bits)?;
        self.position += num_bits;
        Ok(value)
    }

    /// Read a single bit
    pub fn read_bit(&mut self) -> X3fResult<bool> {
        self.check_available(1)?;
        let bit = self.bits[self.position];
        self.position += 1;
        Ok(bit)
    }

    pub fn skip_bits(&mut self, num_bits: usize) -> X3fResult<()> {
        if self.remaining_bits() < num_bits {
            return Err(X3fError::TruncatedStream {
                position: self.position,
                needed: num_bits,
                available: self.remaining_bits(),
            });
        }
        self.position += num_bits;
        Ok(())
    }

    /// Skip to byte boundary
    pub fn align_to_byte(&mut self) {
        self.position = self.position.div_ceil(8) * 8;
        self.position = self.position.min(self.bits.len());
    }
}
