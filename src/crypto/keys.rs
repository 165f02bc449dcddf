//! Public key handling
//!
//! Output scripts embed raw public keys; addresses are derived from their
//! HASH160 identifier. Deriving a public key from a secret uses secp256k1
//! and is only needed by tooling, never by the block parser.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::hash160;

/// Size of an uncompressed public key
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Size of a compressed public key
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid secret key length: {0} bytes")]
    InvalidSecretKeyLength(usize),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// Encoded length implied by a public key's leading byte, if any.
///
/// 0x02/0x03 are compressed keys, 0x04 uncompressed and 0x06/0x07 the
/// hybrid encodings.
pub fn encoded_len(prefix: u8) -> Option<usize> {
    match prefix {
        0x02 | 0x03 => Some(COMPRESSED_PUBLIC_KEY_SIZE),
        0x04 | 0x06 | 0x07 => Some(PUBLIC_KEY_SIZE),
        _ => None,
    }
}

/// True when the leading byte implies exactly `key.len()` bytes.
pub fn is_valid_encoding(key: &[u8]) -> bool {
    match key.first() {
        Some(&prefix) => encoded_len(prefix) == Some(key.len()),
        None => false,
    }
}

/// Identifier of a public key: RIPEMD-160(SHA-256(key))
pub fn key_id(key: &[u8]) -> [u8; 20] {
    hash160(key)
}

/// Derive the serialized public key for a 32-byte secret.
pub fn derive_public_key(secret: &[u8], compressed: bool) -> Result<Vec<u8>, KeyError> {
    if secret.len() != 32 {
        return Err(KeyError::InvalidSecretKeyLength(secret.len()));
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(secret)?;
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);

    Ok(if compressed {
        public_key.serialize().to_vec()
    } else {
        public_key.serialize_uncompressed().to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_one() -> [u8; 32] {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        secret
    }

    #[test]
    fn test_prefix_implies_length() {
        assert!(is_valid_encoding(&[0x02; 33]));
        assert!(is_valid_encoding(&{
            let mut key = [0u8; 33];
            key[0] = 0x03;
            key
        }));
        assert!(is_valid_encoding(&{
            let mut key = [0u8; 65];
            key[0] = 0x04;
            key
        }));

        // Right length, wrong prefix
        assert!(!is_valid_encoding(&[0x05; 33]));
        // Compressed prefix on an uncompressed-length key
        let mut mismatched = [0u8; 65];
        mismatched[0] = 0x02;
        assert!(!is_valid_encoding(&mismatched));
        assert!(!is_valid_encoding(&[]));
    }

    #[test]
    fn test_derive_generator_point() {
        let compressed = derive_public_key(&secret_one(), true).unwrap();
        assert_eq!(
            hex::encode(&compressed),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );

        let uncompressed = derive_public_key(&secret_one(), false).unwrap();
        assert_eq!(uncompressed.len(), PUBLIC_KEY_SIZE);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(&uncompressed[1..33], &compressed[1..]);
    }

    #[test]
    fn test_derive_rejects_bad_secrets() {
        assert!(matches!(
            derive_public_key(&[1u8; 31], true),
            Err(KeyError::InvalidSecretKeyLength(31))
        ));
        assert!(matches!(
            derive_public_key(&[0u8; 32], true),
            Err(KeyError::Secp256k1Error(_))
        ));
    }
}
