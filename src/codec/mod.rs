//! Canonical binary codec for the block file wire format
//!
//! Every record type implements [`Decodable`] ("decode self from a byte
//! source") and [`Encodable`] ("append self to a buffer"). Integers are
//! little-endian; lengths and counts use the compact size encoding from
//! [`compact`].

pub mod compact;

use crate::stream::{BufferedSource, StreamError};
use std::io::Read;
use thiserror::Error;

pub use compact::{
    encode_compact_size, read_compact_size, read_compact_size_with_limit, write_compact_size,
    MAX_SIZE,
};

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised while decoding records
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("Non-canonical compact size: {value} encoded behind prefix {prefix:#04x}")]
    NonCanonicalEncoding { value: u64, prefix: u8 },
    #[error("Compact size too large: {0} (max: {max})", max = MAX_SIZE)]
    ValueTooLarge(u64),
    #[error("Superfluous witness record")]
    SuperfluousWitness,
    #[error("Unknown transaction optional data: flags {0:#04x}")]
    UnknownTransactionFlags(u8),
}

impl DecodeError {
    /// The origin ran dry mid-record.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, DecodeError::Stream(StreamError::EndOfData))
    }

    /// Structurally impossible transaction framing. These point at either a
    /// bug or deliberately malformed input and get logged on their own.
    pub fn is_framing_violation(&self) -> bool {
        matches!(
            self,
            DecodeError::SuperfluousWitness | DecodeError::UnknownTransactionFlags(_)
        )
    }
}

// =============================================================================
// Codec Traits
// =============================================================================

/// A record that can decode itself from a [`BufferedSource`].
pub trait Decodable: Sized {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError>;
}

/// A record that can append its wire encoding to a buffer.
pub trait Encodable {
    fn encode(&self, out: &mut Vec<u8>);

    /// Wire encoding as a fresh vector
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

macro_rules! impl_int_codec {
    ($($ty:ty),*) => {
        $(
            impl Decodable for $ty {
                fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
                    Ok(<$ty>::from_le_bytes(src.read_array()?))
                }
            }

            impl Encodable for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_int_codec!(u8, u16, u32, u64);

impl<const N: usize> Decodable for [u8; N] {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(src.read_array()?)
    }
}

impl<const N: usize> Encodable for [u8; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

/// Compact-size count followed by that many records.
impl<T: Decodable> Decodable for Vec<T> {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        let count = read_compact_size(src)? as usize;
        // The count is untrusted; let the vector grow as records actually decode
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(T::decode(src)?);
        }
        Ok(items)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        write_compact_size(self.len() as u64, out);
        for item in self {
            item.encode(out);
        }
    }
}

/// Read a compact-size length followed by that many raw bytes.
pub fn read_var_bytes<R: Read>(src: &mut BufferedSource<R>) -> Result<Vec<u8>, DecodeError> {
    let len = read_compact_size(src)? as usize;
    Ok(src.read_vec(len)?)
}

/// Append a compact-size length followed by the raw bytes.
pub fn write_var_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_compact_size(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}
