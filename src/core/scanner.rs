//! Block file scanner
//!
//! A block file is a sequence of `marker || length || block` records, but
//! nothing guarantees the file is clean: records may be truncated, zeroed
//! or interleaved with garbage. The scanner therefore treats every marker
//! it finds as a candidate, fences the decode to the declared length, and
//! on any failure resumes the search one byte past that marker.
//!
//! Running out of data while searching for a marker ends the scan
//! normally. Nothing inside a record can abort the scan.

use crate::codec::{Decodable, DecodeError};
use crate::core::block::{Block, BLOCK_HEADER_SIZE};
use crate::core::params::NetworkParams;
use crate::stream::{BufferedSource, StreamError};
use std::io::{Read, Seek};
use thiserror::Error;

// =============================================================================
// Scan Constants
// =============================================================================

/// Largest record payload accepted
pub const MAX_RECORD_SIZE: u32 = 4_000_000;

/// Smallest record payload accepted (a bare header)
pub const MIN_RECORD_SIZE: u32 = BLOCK_HEADER_SIZE as u32;

/// Marker plus length prefix
pub const RECORD_PREFIX_SIZE: usize = 8;

// =============================================================================
// Scan Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid record length: {0}")]
    InvalidLength(u32),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Scanner tuning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Ring buffer size in bytes
    pub buffer_size: usize,
    /// Bytes that must stay rewindable behind the cursor
    pub rewind_window: usize,
    pub min_record_size: u32,
    pub max_record_size: u32,
    /// Absolute offset to start scanning from
    pub start_offset: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2 * MAX_RECORD_SIZE as usize,
            rewind_window: MAX_RECORD_SIZE as usize + RECORD_PREFIX_SIZE,
            min_record_size: MIN_RECORD_SIZE,
            max_record_size: MAX_RECORD_SIZE,
            start_offset: 0,
        }
    }
}

impl ScanConfig {
    /// Check the buffer can hold a full record and still rewind past it.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.rewind_window >= self.buffer_size {
            return Err(ScanError::InvalidConfig(format!(
                "rewind window {} must be smaller than buffer size {}",
                self.rewind_window, self.buffer_size
            )));
        }
        if self.min_record_size > self.max_record_size {
            return Err(ScanError::InvalidConfig(format!(
                "min record size {} exceeds max record size {}",
                self.min_record_size, self.max_record_size
            )));
        }
        if (self.rewind_window as u64) < u64::from(self.max_record_size) + RECORD_PREFIX_SIZE as u64
        {
            return Err(ScanError::InvalidConfig(format!(
                "rewind window {} cannot cover a {}-byte record",
                self.rewind_window, self.max_record_size
            )));
        }
        Ok(())
    }

    fn accepts(&self, size: u32) -> bool {
        (self.min_record_size..=self.max_record_size).contains(&size)
    }
}

// =============================================================================
// Scan Results
// =============================================================================

/// A successfully decoded record
#[derive(Debug, Clone)]
pub struct ScannedBlock {
    /// Offset of the block payload in the file
    pub offset: u64,
    /// Declared payload length
    pub size: u32,
    pub block: Block,
}

/// A candidate record that failed to decode
#[derive(Debug)]
pub struct SkippedRecord {
    pub offset: u64,
    pub size: u32,
    pub error: ScanError,
}

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub blocks: usize,
    pub skipped: usize,
    /// Markers followed by an out-of-range length
    pub rejected_lengths: usize,
}

// =============================================================================
// Scanner
// =============================================================================

/// Iterator over the records of one block file.
///
/// Yields `Ok` for each decoded block and `Err` for each candidate that
/// had to be skipped. Ends when no further marker can be found.
pub struct BlockFileScanner<R> {
    src: BufferedSource<R>,
    params: NetworkParams,
    config: ScanConfig,
    /// Where the next marker search starts
    rewind: u64,
    finished: bool,
    stats: ScanStats,
}

impl<R: Read> BlockFileScanner<R> {
    pub fn new(reader: R, params: NetworkParams, config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let src = BufferedSource::new(reader, config.buffer_size, config.rewind_window)?;

        Ok(Self {
            src,
            params,
            config,
            rewind: 0,
            finished: false,
            stats: ScanStats::default(),
        })
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn position(&self) -> u64 {
        self.src.position()
    }

    /// Find the next marker with an acceptable length.
    ///
    /// Returns `None` once the data runs out.
    fn next_header(&mut self) -> Option<u32> {
        loop {
            if self.src.at_end() {
                return None;
            }

            if !self.src.set_cursor(self.rewind) {
                log::debug!(
                    "Rewind to {} clamped to {}",
                    self.rewind,
                    self.src.position()
                );
            }
            self.rewind += 1;
            self.src.set_fence(None);

            match self.read_header() {
                Ok(Some(size)) => return Some(size),
                Ok(None) => continue,
                Err(e) => {
                    log::trace!("No further record header: {}", e);
                    return None;
                }
            }
        }
    }

    /// Read one candidate header at the next marker byte.
    fn read_header(&mut self) -> Result<Option<u32>, DecodeError> {
        let marker = self.params.marker;
        self.src.find_byte(marker[0])?;
        self.rewind = self.src.position() + 1;

        let found = <[u8; 4]>::decode(&mut self.src)?;
        if found != marker {
            return Ok(None);
        }

        let size = u32::decode(&mut self.src)?;
        if !self.config.accepts(size) {
            self.stats.rejected_lengths += 1;
            log::debug!(
                "Skipping marker at {}: {}",
                self.rewind - 1,
                ScanError::InvalidLength(size)
            );
            return Ok(None);
        }

        Ok(Some(size))
    }

    fn read_block(&mut self, size: u32) -> Result<ScannedBlock, SkippedRecord> {
        let offset = self.src.position();
        self.src.set_fence(Some(offset + u64::from(size)));

        match Block::decode(&mut self.src) {
            Ok(block) => {
                self.rewind = self.src.position();
                self.stats.blocks += 1;
                Ok(ScannedBlock {
                    offset,
                    size,
                    block,
                })
            }
            Err(e) => {
                if e.is_framing_violation() {
                    log::warn!("Framing violation in record at {}: {}", offset, e);
                } else {
                    log::warn!("Skipping record at {} ({} bytes): {}", offset, size, e);
                }
                self.stats.skipped += 1;
                Err(SkippedRecord {
                    offset,
                    size,
                    error: ScanError::Decode(e),
                })
            }
        }
    }
}

impl<R: Read + Seek> BlockFileScanner<R> {
    /// Restart the scan at an absolute file offset.
    pub fn seek(&mut self, offset: u64) -> Result<(), ScanError> {
        self.src.seek_absolute(offset)?;
        self.rewind = offset;
        self.finished = false;
        Ok(())
    }
}

impl<R: Read> Iterator for BlockFileScanner<R> {
    type Item = Result<ScannedBlock, SkippedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_header() {
            Some(size) => Some(self.read_block(size)),
            None => {
                self.finished = true;
                self.src.close();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressEncoder;
    use crate::codec::Encodable;
    use crate::core::fixtures::{frame, genesis_block, p2pkh_block, GENESIS_ADDRESS};
    use crate::core::params::Network;
    use crate::crypto::encode_check;
    use std::io::Cursor;

    fn mainnet() -> NetworkParams {
        Network::Mainnet.params()
    }

    fn scan(bytes: Vec<u8>) -> BlockFileScanner<Cursor<Vec<u8>>> {
        BlockFileScanner::new(Cursor::new(bytes), mainnet(), small_config()).unwrap()
    }

    fn small_config() -> ScanConfig {
        ScanConfig {
            buffer_size: 4096,
            rewind_window: 2048,
            min_record_size: 80,
            max_record_size: 2000,
            start_offset: 0,
        }
    }

    fn split(
        scanner: BlockFileScanner<Cursor<Vec<u8>>>,
    ) -> (Vec<ScannedBlock>, Vec<SkippedRecord>) {
        let mut blocks = Vec::new();
        let mut skipped = Vec::new();
        for item in scanner {
            match item {
                Ok(block) => blocks.push(block),
                Err(record) => skipped.push(record),
            }
        }
        (blocks, skipped)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_size, 8_000_000);
        assert_eq!(config.rewind_window, 4_000_008);
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = small_config();
        config.rewind_window = config.buffer_size;
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));

        let mut config = small_config();
        config.min_record_size = 3000;
        assert!(config.validate().is_err());

        let mut config = small_config();
        config.max_record_size = 2041;
        assert!(config.validate().is_err());

        let mut config = small_config();
        config.max_record_size = 2040;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_genesis_end_to_end() {
        let file = frame(mainnet().marker, &genesis_block());
        let (blocks, skipped) = split(scan(file));

        assert!(skipped.is_empty());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].offset, 8);
        assert_eq!(blocks[0].size, 285);

        let encoder = AddressEncoder::new(mainnet());
        assert_eq!(blocks[0].block.addresses(&encoder), vec![GENESIS_ADDRESS]);
    }

    #[test]
    fn test_single_pubkey_hash_output() {
        let hash = [0x42u8; 20];
        let file = frame(mainnet().marker, &p2pkh_block(&[hash]));
        let (blocks, skipped) = split(scan(file));

        assert!(skipped.is_empty());
        assert_eq!(blocks.len(), 1);
        let encoder = AddressEncoder::new(mainnet());
        assert_eq!(
            blocks[0].block.addresses(&encoder),
            vec![encode_check(0, &hash)]
        );
    }

    #[test]
    fn test_resync_after_garbage() {
        let first = p2pkh_block(&[[1u8; 20]]);
        let second = p2pkh_block(&[[2u8; 20]]);

        let mut file = frame(mainnet().marker, &first);
        file.extend_from_slice(&[0xaa; 50]);
        file.extend(frame(mainnet().marker, &second));

        let mut scanner = scan(file);
        let blocks: Vec<_> = scanner.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block, first);
        assert_eq!(blocks[1].block, second);
        assert_eq!(scanner.stats().blocks, 2);
        assert_eq!(scanner.stats().skipped, 0);
    }

    #[test]
    fn test_garbage_with_marker_bytes() {
        let block = p2pkh_block(&[[3u8; 20]]);
        let marker = mainnet().marker;

        let mut file = vec![0xf9, 0xf9, 0xbe, 0x00];
        // Full marker with a length below a header
        file.extend_from_slice(&marker);
        file.extend_from_slice(&79u32.to_le_bytes());
        // Full marker with a length above the ceiling
        file.extend_from_slice(&marker);
        file.extend_from_slice(&4_000_001u32.to_le_bytes());
        file.extend(frame(marker, &block));

        let mut scanner = scan(file);
        let (blocks, skipped): (Vec<_>, Vec<_>) = scanner.by_ref().partition(|r| r.is_ok());
        assert_eq!(blocks.len(), 1);
        assert!(skipped.is_empty());
        assert_eq!(scanner.stats().rejected_lengths, 2);
    }

    #[test]
    fn test_framing_violation_is_skipped() {
        let marker = mainnet().marker;
        let good = p2pkh_block(&[[4u8; 20]]);

        // Same block, but the coinbase claims unknown optional data
        let tx = &good.transactions[0];
        let mut payload = good.header.to_bytes();
        payload.push(0x01);
        tx.version.encode(&mut payload);
        payload.extend_from_slice(&[0x00, 0x02]);
        tx.inputs.encode(&mut payload);
        tx.outputs.encode(&mut payload);
        tx.lock_time.encode(&mut payload);

        let mut file = marker.to_vec();
        (payload.len() as u32).encode(&mut file);
        file.extend_from_slice(&payload);
        file.extend(frame(marker, &good));

        let (blocks, skipped) = split(scan(file));
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            skipped[0].error,
            ScanError::Decode(DecodeError::UnknownTransactionFlags(0x02))
        ));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, good);
    }

    #[test]
    fn test_overlong_block_hits_fence() {
        let marker = mainnet().marker;
        let block = p2pkh_block(&[[5u8; 20]]);
        let payload = block.to_bytes();

        // Declared length ends inside the transaction
        let mut file = marker.to_vec();
        ((payload.len() - 10) as u32).encode(&mut file);
        file.extend_from_slice(&payload);
        file.extend(frame(marker, &block));

        let (blocks, skipped) = split(scan(file));
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            skipped[0].error,
            ScanError::Decode(DecodeError::Stream(StreamError::EndOfFrame { .. }))
        ));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_truncated_tail() {
        let marker = mainnet().marker;
        let mut file = frame(marker, &p2pkh_block(&[[6u8; 20]]));
        let tail = frame(marker, &p2pkh_block(&[[7u8; 20]]));
        file.extend_from_slice(&tail[..tail.len() - 10]);

        let (blocks, skipped) = split(scan(file));
        assert_eq!(blocks.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            &skipped[0].error,
            ScanError::Decode(e) if e.is_end_of_data()
        ));
    }

    #[test]
    fn test_other_network_marker_yields_nothing() {
        let file = frame(Network::Testnet.params().marker, &genesis_block());
        let (blocks, skipped) = split(scan(file));
        assert!(blocks.is_empty());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_empty_file() {
        let mut scanner = scan(Vec::new());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_many_records_wrap_the_ring() {
        let marker = mainnet().marker;
        let mut file = Vec::new();
        for i in 0..40u8 {
            file.extend(frame(marker, &p2pkh_block(&[[i; 20]])));
        }

        let mut scanner = scan(file);
        let count = scanner.by_ref().filter(|r| r.is_ok()).count();
        assert_eq!(count, 40);
        assert_eq!(scanner.stats().skipped, 0);
    }

    #[test]
    fn test_seek_to_second_record() {
        let marker = mainnet().marker;
        let first = frame(marker, &p2pkh_block(&[[8u8; 20]]));
        let second_block = p2pkh_block(&[[9u8; 20]]);
        let mut file = first.clone();
        file.extend(frame(marker, &second_block));

        let mut scanner = scan(file);
        scanner.seek(first.len() as u64).unwrap();
        let (blocks, _) = split(scanner);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, second_block);
        assert_eq!(blocks[0].offset, first.len() as u64 + 8);
    }
}
