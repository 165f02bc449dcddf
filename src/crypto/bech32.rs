//! Bech32 encoding for segregated witness addresses (BIP-173)
//!
//! An address is `hrp || '1' || data || checksum`, where `data` is the
//! witness version followed by the witness program regrouped into 5-bit
//! values, and the checksum is six 5-bit values derived from a BCH code
//! over the expanded hrp and the data.

use thiserror::Error;

/// Data alphabet, indexed by 5-bit value
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// BCH generator coefficients
const GENERATOR: [u32; 5] = [
    0x3b6a_57b2,
    0x2650_8e6d,
    0x1ea1_19fa,
    0x3d42_33dd,
    0x2a14_62b3,
];

/// Separator between the human-readable part and the data
const SEPARATOR: char = '1';

const CHECKSUM_LEN: usize = 6;

/// Longest string a bech32 checksum covers
pub const MAX_LEN: usize = 90;

/// Errors raised while building a bech32 string
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Bech32Error {
    #[error("Invalid human-readable part: {0:?}")]
    InvalidHrp(String),
    #[error("Invalid witness version: {0}")]
    InvalidWitnessVersion(u8),
    #[error("Invalid witness program length: {0} bytes")]
    InvalidProgramLength(usize),
    #[error("Encoded string too long: {0} characters (max: {MAX_LEN})")]
    TooLong(usize),
    #[error("Value {0} does not fit in {1} bits")]
    InvalidValue(u32, u32),
    #[error("Non-zero padding bits")]
    InvalidPadding,
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, coefficient) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= coefficient;
            }
        }
    }
    chk
}

/// High bits of each hrp character, a zero, then the low bits.
fn hrp_expand(hrp: &[u8]) -> Vec<u8> {
    hrp.iter()
        .map(|c| c >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.iter().map(|c| c & 0x1f))
        .collect()
}

fn create_checksum(hrp: &[u8], data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; CHECKSUM_LEN]);

    let modulus = polymod(values) ^ 1;
    std::array::from_fn(|i| ((modulus >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f) as u8)
}

/// Encode 5-bit `data` under `hrp`.
///
/// The hrp must be 1 to 83 printable ASCII characters; it is emitted in
/// lowercase.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String, Bech32Error> {
    let valid_hrp = !hrp.is_empty()
        && hrp.len() <= 83
        && hrp.bytes().all(|c| (33..=126).contains(&c));
    if !valid_hrp {
        return Err(Bech32Error::InvalidHrp(hrp.to_string()));
    }

    let total = hrp.len() + 1 + data.len() + CHECKSUM_LEN;
    if total > MAX_LEN {
        return Err(Bech32Error::TooLong(total));
    }
    if let Some(&value) = data.iter().find(|&&v| v > 0x1f) {
        return Err(Bech32Error::InvalidValue(u32::from(value), 5));
    }

    let hrp = hrp.to_ascii_lowercase();
    let checksum = create_checksum(hrp.as_bytes(), data);

    let mut encoded = String::with_capacity(total);
    encoded.push_str(&hrp);
    encoded.push(SEPARATOR);
    for &value in data.iter().chain(checksum.iter()) {
        encoded.push(CHARSET[value as usize] as char);
    }
    Ok(encoded)
}

/// Regroup `data` from `from`-bit values into `to`-bit values.
///
/// With `pad`, a trailing partial group is zero-filled. Without it, the
/// leftover bits must be fewer than `from` and all zero.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, Bech32Error> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max_value: u32 = (1 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        let value = u32::from(value);
        if value >> from != 0 {
            return Err(Bech32Error::InvalidValue(value, from));
        }
        acc = (acc << from) | value;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return Err(Bech32Error::InvalidPadding);
    }

    Ok(out)
}

/// Encode a witness program as a segwit address.
///
/// Version 0 programs must be 20 or 32 bytes; any version takes 2 to 40
/// bytes.
pub fn encode_segwit(hrp: &str, version: u8, program: &[u8]) -> Result<String, Bech32Error> {
    if version > 16 {
        return Err(Bech32Error::InvalidWitnessVersion(version));
    }
    if !(2..=40).contains(&program.len()) || (version == 0 && ![20, 32].contains(&program.len()))
    {
        return Err(Bech32Error::InvalidProgramLength(program.len()));
    }

    let mut data = Vec::with_capacity(1 + (program.len() * 8).div_ceil(5));
    data.push(version);
    data.extend(convert_bits(program, 8, 5, true)?);
    encode(hrp, &data)
}
