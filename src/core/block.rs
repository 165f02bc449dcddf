//! Block records
//!
//! A block is an 80-byte header followed by a compact-size count of
//! transactions.

use crate::address::AddressEncoder;
use crate::codec::{Decodable, DecodeError, Encodable};
use crate::core::transaction::Transaction;
use crate::crypto::{display_hex, double_sha256};
use crate::stream::BufferedSource;
use chrono::{DateTime, Utc};
use std::io::Read;

/// Block header size in bytes
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Block header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    /// Hash of the previous block, internal byte order
    pub prev_block: [u8; 32],
    /// Merkle root of all transactions, internal byte order
    pub merkle_root: [u8; 32],
    /// Unix timestamp in seconds
    pub time: u32,
    /// Compact difficulty target
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Double SHA-256 of the encoded header, internal byte order
    pub fn hash(&self) -> [u8; 32] {
        double_sha256(&self.to_bytes())
    }

    /// Block hash as explorers display it
    pub fn hash_hex(&self) -> String {
        display_hex(&self.hash())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.time), 0).unwrap_or_default()
    }
}

impl Decodable for BlockHeader {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            version: u32::decode(src)?,
            prev_block: <[u8; 32]>::decode(src)?,
            merkle_root: <[u8; 32]>::decode(src)?,
            time: u32::decode(src)?,
            bits: u32::decode(src)?,
            nonce: u32::decode(src)?,
        })
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        self.version.encode(out);
        self.prev_block.encode(out);
        self.merkle_root.encode(out);
        self.time.encode(out);
        self.bits.encode(out);
        self.nonce.encode(out);
    }
}

/// A block as stored in a block file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> [u8; 32] {
        self.header.hash()
    }

    /// Number of outputs across all transactions
    pub fn output_count(&self) -> usize {
        self.transactions.iter().map(|tx| tx.outputs.len()).sum()
    }

    /// Addresses of every output with a recognised destination, in order
    pub fn addresses(&self, encoder: &AddressEncoder) -> Vec<String> {
        self.transactions
            .iter()
            .flat_map(|tx| tx.outputs.iter())
            .filter_map(|output| output.address(encoder))
            .collect()
    }
}

impl Decodable for Block {
    fn decode<R: Read>(src: &mut BufferedSource<R>) -> Result<Self, DecodeError> {
        Ok(Self {
            header: BlockHeader::decode(src)?,
            transactions: Vec::decode(src)?,
        })
    }
}

impl Encodable for Block {
    fn encode(&self, out: &mut Vec<u8>) {
        self.header.encode(out);
        self.transactions.encode(out);
    }
}
