//! blkaddr: destination address extraction from raw block files
//!
//! This crate reads the append-only block files a full node keeps on disk
//! and reports the address of every output it can recognise:
//! - A ring-buffered byte source with bounded rewind and read fences
//! - A canonical decoder for compact sizes and the block/transaction records
//! - A resynchronising scanner that survives corrupt or truncated records
//! - A classifier for the standard output script templates
//! - Base58Check and bech32 address encoding
//!
//! # Example
//!
//! ```rust,no_run
//! use blkaddr::address::AddressEncoder;
//! use blkaddr::core::{BlockFileScanner, Network, ScanConfig};
//! use std::fs::File;
//!
//! let params = Network::Mainnet.params();
//! let encoder = AddressEncoder::new(params);
//! let file = File::open("blocks/blk00000.dat").unwrap();
//!
//! let scanner = BlockFileScanner::new(file, params, ScanConfig::default()).unwrap();
//! for scanned in scanner.flatten() {
//!     for address in scanned.block.addresses(&encoder) {
//!         println!("{}", address);
//!     }
//! }
//! ```

pub mod address;
pub mod cli;
pub mod codec;
pub mod core;
pub mod crypto;
pub mod script;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use address::AddressEncoder;
pub use codec::{Decodable, DecodeError, Encodable};
pub use core::{
    Block, BlockFileScanner, BlockHeader, Network, NetworkParams, ScanConfig, ScanError,
    ScannedBlock, Transaction, TxIn, TxOut,
};
pub use script::{classify, Destination, Script, ScriptKind, ScriptPattern};
pub use storage::{BlockFiles, BlockFilesConfig, StorageError};
pub use stream::{BufferedSource, StreamError};
