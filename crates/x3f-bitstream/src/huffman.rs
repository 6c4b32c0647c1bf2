//! Huffman tree shared by the legacy, TRUE and CAMF type 4 coders
//!
//! Every X3F prefix-coded section describes its code as a table of `(length, code)`
//! pairs indexed by symbol. The tree is an arena of nodes addressed by index; a leaf
//! stores the index of the table entry that produced it.

use tracing::trace;
use x3f_core::consts::{HUFFMAN_CODE_MASK, HUFFMAN_LENGTH_SHIFT, MAX_CODE_LENGTH, UNDEFINED_LEAF};
use x3f_core::{X3fError, X3fResult};

use crate::BitReader;

/// Largest residual magnitude category accepted from a TRUE/CAMF stream
const MAX_RESIDUAL_BITS: u32 = 16;

/// One prefix code, `length` bits right-aligned in `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    pub length: u8,
    pub code: u32,
}

impl HuffmanCode {
    pub const fn new(length: u8, code: u32) -> Self {
        Self { length, code }
    }

    /// Decode a legacy 32-bit coding table element
    pub fn from_packed(element: u32) -> Self {
        Self {
            length: (element >> HUFFMAN_LENGTH_SHIFT) as u8,
            code: element & HUFFMAN_CODE_MASK,
        }
    }

    /// Inverse of [`HuffmanCode::from_packed`]
    pub fn to_packed(self) -> u32 {
        ((self.length as u32) << HUFFMAN_LENGTH_SHIFT) | (self.code & HUFFMAN_CODE_MASK)
    }

    /// Decode a TRUE/CAMF table pair, where the code is left-aligned in its byte
    pub fn from_true_pair(code_size: u8, code: u8) -> Self {
        let length = code_size.min(8);
        let code = if length == 0 {
            0
        } else {
            (code as u32) >> (8 - length)
        };
        Self {
            length: code_size,
            code,
        }
    }

    /// Inverse of [`HuffmanCode::from_true_pair`]
    pub fn to_true_pair(self) -> [u8; 2] {
        let shifted = if self.length == 0 || self.length > 8 {
            0
        } else {
            (self.code << (8 - self.length)) as u8
        };
        [self.length, shifted]
    }

    fn bit(&self, depth: u8) -> usize {
        ((self.code >> (self.length - depth - 1)) & 1) as usize
    }
}

/// Parse a `(code_size, code)` byte-pair table terminated by a zero `code_size`
///
/// Returns the codes (without the terminator) and the number of bytes consumed,
/// terminator included.
pub fn parse_true_table(data: &[u8]) -> X3fResult<(Vec<HuffmanCode>, usize)> {
    let mut codes = Vec::new();
    for (index, pair) in data.chunks(2).enumerate() {
        if pair.len() < 2 {
            break;
        }
        if pair[0] == 0 {
            return Ok((codes, (index + 1) * 2));
        }
        if pair[0] > 8 {
            return Err(X3fError::CorruptTable(format!(
                "entry {} has code size {}, byte codes hold at most 8 bits",
                index, pair[0]
            )));
        }
        codes.push(HuffmanCode::from_true_pair(pair[0], pair[1]));
    }
    Err(X3fError::TruncatedStream {
        position: data.len() * 8,
        needed: 16,
        available: 0,
    })
}

#[derive(Debug, Clone, Copy)]
struct Node {
    branch: [Option<u32>; 2],
    leaf: u32,
}

impl Node {
    const EMPTY: Node = Node {
        branch: [None, None],
        leaf: UNDEFINED_LEAF,
    };

    fn is_terminal(&self) -> bool {
        self.branch[0].is_none() && self.branch[1].is_none()
    }
}

/// Binary decode tree built from a symbol-indexed code table
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    leaves: usize,
}

impl HuffmanTree {
    /// Build the tree; symbol `i` is `codes[i]`, zero-length entries are unused symbols
    pub fn build(codes: &[HuffmanCode]) -> X3fResult<Self> {
        let mut tree = Self {
            nodes: vec![Node::EMPTY],
            leaves: 0,
        };
        for (symbol, code) in codes.iter().enumerate() {
            if code.length == 0 {
                continue;
            }
            tree.insert(*code, symbol as u32)?;
        }
        trace!(
            leaves = tree.leaves,
            nodes = tree.nodes.len(),
            "built huffman tree"
        );
        Ok(tree)
    }

    /// Build from a legacy table of packed 32-bit elements
    pub fn from_packed_table(table: &[u32]) -> X3fResult<Self> {
        let codes: Vec<HuffmanCode> = table.iter().map(|&e| HuffmanCode::from_packed(e)).collect();
        Self::build(&codes)
    }

    fn insert(&mut self, code: HuffmanCode, symbol: u32) -> X3fResult<()> {
        if code.length > MAX_CODE_LENGTH {
            return Err(X3fError::CorruptTable(format!(
                "symbol {} has code length {}, maximum is {}",
                symbol, code.length, MAX_CODE_LENGTH
            )));
        }

        let mut index = 0usize;
        for depth in 0..code.length {
            if self.nodes[index].leaf != UNDEFINED_LEAF {
                return Err(X3fError::CorruptTable(format!(
                    "code of symbol {} runs through the leaf of symbol {}",
                    symbol, self.nodes[index].leaf
                )));
            }
            let bit = code.bit(depth);
            index = match self.nodes[index].branch[bit] {
                Some(next) => next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::EMPTY);
                    self.nodes[index].branch[bit] = Some(next as u32);
                    next
                }
            };
        }

        let node = &mut self.nodes[index];
        if !node.is_terminal() {
            return Err(X3fError::CorruptTable(format!(
                "code of symbol {} is a prefix of another code",
                symbol
            )));
        }
        if node.leaf != UNDEFINED_LEAF {
            return Err(X3fError::CorruptTable(format!(
                "symbols {} and {} share a code",
                node.leaf, symbol
            )));
        }
        node.leaf = symbol;
        self.leaves += 1;
        Ok(())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Follow `code` from the root without a bitstream; `None` if it does not end on a leaf
    pub fn lookup(&self, code: HuffmanCode) -> Option<u32> {
        let mut index = 0usize;
        for depth in 0..code.length {
            index = self.nodes[index].branch[code.bit(depth)]? as usize;
        }
        let node = &self.nodes[index];
        (node.is_terminal() && node.leaf != UNDEFINED_LEAF).then_some(node.leaf)
    }

    /// Decode one symbol, consuming one bit per edge
    pub fn decode(&self, reader: &mut BitReader<'_>) -> X3fResult<u32> {
        let mut index = 0usize;
        loop {
            let node = &self.nodes[index];
            if node.is_terminal() {
                if node.leaf == UNDEFINED_LEAF {
                    return Err(X3fError::CorruptStream {
                        position: reader.position(),
                        reason: "code reaches an undefined leaf".to_string(),
                    });
                }
                return Ok(node.leaf);
            }
            let position = reader.position();
            let bit = reader.read_bit()? as usize;
            index = match node.branch[bit] {
                Some(next) => next as usize,
                None => {
                    return Err(X3fError::CorruptStream {
                        position,
                        reason: format!("no code continues with bit {}", bit),
                    })
                }
            };
        }
    }

    /// Decode a signed residual: the symbol is a magnitude category `n`, followed by
    /// `n` raw bits; a leading zero bit marks a negative value
    pub fn decode_residual(&self, reader: &mut BitReader<'_>) -> X3fResult<i32> {
        let position = reader.position();
        let bits = self.decode(reader)?;
        if bits == 0 {
            return Ok(0);
        }
        if bits > MAX_RESIDUAL_BITS {
            return Err(X3fError::CorruptStream {
                position,
                reason: format!("residual category {} exceeds {} bits", bits, MAX_RESIDUAL_BITS),
            });
        }
        let value = reader.read_bits(bits as usize)? as i32;
        if value >> (bits - 1) == 0 {
            Ok(value - ((1 << bits) - 1))
        } else {
            Ok(value)
        }
    }
}

/// Split a residual into its magnitude category and raw bits, the inverse of
/// [`HuffmanTree::decode_residual`]
pub fn encode_residual(value: i32) -> (u32, u32) {
    if value == 0 {
        return (0, 0);
    }
    let category = 32 - value.unsigned_abs().leading_zeros();
    let raw = if value > 0 {
        value as u32
    } else {
        (value + (1 << category) - 1) as u32
    };
    (category, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BitWriter;

    fn sample_codes() -> Vec<HuffmanCode> {
        vec![
            HuffmanCode::new(2, 0b00),
            HuffmanCode::new(2, 0b01),
            HuffmanCode::new(0, 0),
            HuffmanCode::new(3, 0b100),
            HuffmanCode::new(3, 0b101),
            HuffmanCode::new(2, 0b11),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let tree = HuffmanTree::build(&sample_codes()).unwrap();
        assert_eq!(tree.leaf_count(), 5);
        for (symbol, code) in sample_codes().iter().enumerate() {
            if code.length > 0 {
                assert_eq!(tree.lookup(*code), Some(symbol as u32));
            }
        }
        // Internal node, not a leaf
        assert_eq!(tree.lookup(HuffmanCode::new(1, 1)), None);
    }

    #[test]
    fn test_decode_sequence() {
        let codes = sample_codes();
        let tree = HuffmanTree::build(&codes).unwrap();
        let symbols = [5u32, 0, 3, 1, 4, 4, 0];

        let mut writer = BitWriter::new();
        for &s in &symbols {
            writer.write_code(codes[s as usize]).unwrap();
        }
        let data = writer.into_bytes();

        let mut reader = BitReader::new(&data);
        for &s in &symbols {
            assert_eq!(tree.decode(&mut reader).unwrap(), s);
        }
    }

    #[test]
    fn test_prefix_collision() {
        let codes = [HuffmanCode::new(1, 0), HuffmanCode::new(2, 0b01)];
        assert!(matches!(
            HuffmanTree::build(&codes),
            Err(X3fError::CorruptTable(_))
        ));

        let codes = [HuffmanCode::new(2, 0b01), HuffmanCode::new(1, 0)];
        assert!(matches!(
            HuffmanTree::build(&codes),
            Err(X3fError::CorruptTable(_))
        ));
    }

    #[test]
    fn test_duplicate_code() {
        let codes = [HuffmanCode::new(2, 0b10), HuffmanCode::new(2, 0b10)];
        assert!(matches!(
            HuffmanTree::build(&codes),
            Err(X3fError::CorruptTable(_))
        ));
    }

    #[test]
    fn test_missing_branch_is_corrupt_stream() {
        // Only "0" is a valid code
        let tree = HuffmanTree::build(&[HuffmanCode::new(1, 0)]).unwrap();
        let data = [0b0100_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
        assert!(matches!(
            tree.decode(&mut reader),
            Err(X3fError::CorruptStream { position: 1, .. })
        ));
    }

    #[test]
    fn test_empty_tree_is_corrupt_stream() {
        let tree = HuffmanTree::build(&[]).unwrap();
        let data = [0u8];
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            tree.decode(&mut reader),
            Err(X3fError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_truncated_symbol() {
        let tree = HuffmanTree::build(&[HuffmanCode::new(9, 0x1ff), HuffmanCode::new(1, 0)]).unwrap();
        let data = [0xff];
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            tree.decode(&mut reader),
            Err(X3fError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_packed_element() {
        let code = HuffmanCode::from_packed(0x1800_0005);
        assert_eq!(code.length, 3);
        assert_eq!(code.code, 5);
        assert_eq!(code.to_packed(), 0x1800_0005);
    }

    #[test]
    fn test_true_pair_left_aligned() {
        let code = HuffmanCode::from_true_pair(3, 0b1010_0000);
        assert_eq!(code, HuffmanCode::new(3, 0b101));
        assert_eq!(code.to_true_pair(), [3, 0b1010_0000]);
    }

    #[test]
    fn test_parse_true_table() {
        let data = [2, 0b0000_0000, 2, 0b0100_0000, 1, 0b1000_0000, 0, 0, 0xaa];
        let (codes, consumed) = parse_true_table(&data).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(
            codes,
            vec![
                HuffmanCode::new(2, 0),
                HuffmanCode::new(2, 1),
                HuffmanCode::new(1, 1)
            ]
        );

        assert!(parse_true_table(&[2, 0, 3]).is_err());
        assert!(parse_true_table(&[9, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_residual_coding() {
        // Category symbol i coded as a fixed 4-bit code
        let codes: Vec<HuffmanCode> = (0..16).map(|i| HuffmanCode::new(4, i)).collect();
        let tree = HuffmanTree::build(&codes).unwrap();
        let values = [0, 1, -1, 2, -3, 255, -256, 4095, -4095];

        let mut writer = BitWriter::new();
        for &v in &values {
            let (category, raw) = encode_residual(v);
            writer.write_code(codes[category as usize]).unwrap();
            writer.write_bits(raw, category as usize).unwrap();
        }
        let data = writer.into_bytes();

        let mut reader = BitReader::new(&data);
        for &v in &values {
            assert_eq!(tree.decode_residual(&mut reader).unwrap(), v);
        }
    }

    #[test]
    fn test_residual_category_limits() {
        assert_eq!(encode_residual(-1), (1, 0));
        assert_eq!(encode_residual(1), (1, 1));
        assert_eq!(encode_residual(-2), (2, 1));
        assert_eq!(encode_residual(3), (2, 3));
    }
}
