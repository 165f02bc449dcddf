//! Script opcodes
//!
//! Only the opcodes that appear in standard output templates are named.

/// Opcodes used by the output templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    // Push value (0x00 - 0x60)
    /// Push an empty byte vector (also the witness v0 marker)
    Zero = 0x00,
    /// Push the number 1 (witness v1 marker)
    One = 0x51,
    /// Push the number 16 (witness v16 marker)
    Sixteen = 0x60,

    // Control
    /// Marks the output as provably unspendable
    Return = 0x6a,

    // Stack
    /// Duplicate the top stack item
    Dup = 0x76,

    // Bit logic
    /// Push 1 if the top two items are equal
    Equal = 0x87,
    /// Equal followed by verify
    EqualVerify = 0x88,

    // Crypto
    /// RIPEMD-160 of SHA-256
    Hash160 = 0xa9,
    /// Signature check against a public key
    CheckSig = 0xac,
}

impl Opcode {
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Decode a small-integer push opcode (OP_0, OP_1 ..= OP_16) to its value.
pub fn decode_small_int(byte: u8) -> Option<u8> {
    if byte == Opcode::Zero.byte() {
        return Some(0);
    }
    if (Opcode::One.byte()..=Opcode::Sixteen.byte()).contains(&byte) {
        return Some(byte - (Opcode::One.byte() - 1));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_small_int(value: u8) -> Option<u8> {
        match value {
            0 => Some(Opcode::Zero.byte()),
            1..=16 => Some(Opcode::One.byte() - 1 + value),
            _ => None,
        }
    }

    #[test]
    fn test_small_int_decoding() {
        assert_eq!(decode_small_int(0x00), Some(0));
        assert_eq!(decode_small_int(0x51), Some(1));
        assert_eq!(decode_small_int(0x60), Some(16));
        assert_eq!(decode_small_int(0x4f), None); // OP_1NEGATE
        assert_eq!(decode_small_int(0x50), None); // OP_RESERVED
        assert_eq!(decode_small_int(0x61), None);
    }

    #[test]
    fn test_small_int_encoding() {
        for value in 0..=16 {
            let byte = encode_small_int(value).unwrap();
            assert_eq!(decode_small_int(byte), Some(value));
        }
        assert_eq!(encode_small_int(17), None);
    }
}
