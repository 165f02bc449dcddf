//! Cryptographic utilities for address extraction
//!
//! This module provides:
//! - SHA-256 / HASH160 hashing
//! - Public key identifiers and secp256k1 key derivation
//! - Base58Check and bech32 address encodings

pub mod base58;
pub mod bech32;
pub mod hash;
pub mod keys;

pub use base58::encode_check;
pub use bech32::{encode_segwit, Bech32Error};
pub use hash::{display_hex, double_sha256, hash160, sha256};
pub use keys::{derive_public_key, is_valid_encoding, key_id, KeyError};
