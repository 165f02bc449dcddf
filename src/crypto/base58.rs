//! Base58Check encoding for legacy addresses
//!
//! `version || payload || checksum`, where the checksum is the first four
//! bytes of double SHA-256 over `version || payload`. Leading zero bytes
//! map to leading '1' characters, which `bs58` handles for us.

use super::hash::double_sha256;

/// Length of the trailing checksum
pub const CHECKSUM_LEN: usize = 4;

/// Encode `payload` behind a one-byte `version` with a 4-byte checksum.
pub fn encode_check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);

    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    bs58::encode(data).into_string()
}
