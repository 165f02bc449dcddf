//! Core record model
//!
//! This module contains:
//! - Network parameters (record marker and address prefixes)
//! - Transactions, including the witness framing rules
//! - Blocks and block headers
//! - The block file scanner that frames and decodes records

pub mod block;
pub mod params;
pub mod scanner;
pub mod transaction;

#[cfg(test)]
pub(crate) mod fixtures;

pub use block::{Block, BlockHeader, BLOCK_HEADER_SIZE};
pub use params::{Network, NetworkParams};
pub use scanner::{
    BlockFileScanner, ScanConfig, ScanError, ScanStats, ScannedBlock, SkippedRecord,
    MAX_RECORD_SIZE, MIN_RECORD_SIZE,
};
pub use transaction::{
    OutPoint, Transaction, TxFlags, TxIn, TxOut, Witness, NULL_INDEX, SEQUENCE_FINAL,
};
