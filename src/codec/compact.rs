//! Compact size ("var uint") encoding
//!
//! Encoding rules:
//! - value < 0xfd: single byte
//! - value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! Decoding only accepts the shortest form. A value that fits a smaller
//! tier but was written with a wider prefix is rejected, so a length can
//! never be smuggled past a check through an alternative encoding.

use super::{Decodable, DecodeError};
use crate::stream::BufferedSource;
use std::io::Read;

/// Largest length or count accepted from the wire (32 MiB)
pub const MAX_SIZE: u64 = 0x0200_0000;

/// Decode a compact size, enforcing canonical form and the [`MAX_SIZE`] ceiling.
pub fn read_compact_size<R: Read>(src: &mut BufferedSource<R>) -> Result<u64, DecodeError> {
    read_compact_size_with_limit(src, MAX_SIZE)
}

/// Decode a compact size, enforcing canonical form and a caller-chosen ceiling.
pub fn read_compact_size_with_limit<R: Read>(
    src: &mut BufferedSource<R>,
    limit: u64,
) -> Result<u64, DecodeError> {
    let prefix = u8::decode(src)?;
    let (value, minimum) = match prefix {
        0..=0xfc => (u64::from(prefix), 0),
        0xfd => (u64::from(u16::decode(src)?), 0xfd),
        0xfe => (u64::from(u32::decode(src)?), 0x1_0000),
        0xff => (u64::decode(src)?, 0x1_0000_0000),
    };

    if value < minimum {
        return Err(DecodeError::NonCanonicalEncoding { value, prefix });
    }
    if value > limit {
        return Err(DecodeError::ValueTooLarge(value));
    }

    Ok(value)
}

/// Append the canonical encoding of `value`.
pub fn write_compact_size(value: u64, out: &mut Vec<u8>) {
    if value < 0xfd {
        out.push(value as u8);
    } else if value <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Canonical encoding of `value` as a fresh vector.
pub fn encode_compact_size(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    write_compact_size(value, &mut out);
    out
}
