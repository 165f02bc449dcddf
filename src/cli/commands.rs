//! CLI commands for the address extractor
//!
//! Implements all command handlers for the CLI interface.

use crate::address::AddressEncoder;
use crate::core::{Block, BlockFileScanner, Network, NetworkParams, ScanConfig, ScanStats};
use crate::crypto::{derive_public_key, key_id};
use crate::script::{classify, Destination, ScriptKind};
use crate::storage::{BlockFiles, BlockFilesConfig, BlockFilesStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// What to print while scanning
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// One JSON object per block instead of one address per line
    pub json: bool,
    /// Print only the final summary
    pub summary_only: bool,
}

// =============================================================================
// Reporting
// =============================================================================

/// Totals across every scanned file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub files: usize,
    /// Size of the block files queued for scanning
    pub bytes: u64,
    pub blocks: usize,
    pub skipped: usize,
    pub rejected_lengths: usize,
    pub transactions: usize,
    pub outputs: usize,
    pub addresses: usize,
    /// Outputs per script kind
    pub kinds: BTreeMap<ScriptKind, usize>,
}

impl ScanSummary {
    /// Count a decoded block and return its addresses in output order.
    pub fn record_block(&mut self, block: &Block, encoder: &AddressEncoder) -> Vec<String> {
        let mut addresses = Vec::new();
        self.blocks += 1;
        self.transactions += block.transactions.len();

        for output in block.transactions.iter().flat_map(|tx| tx.outputs.iter()) {
            let pattern = output.pattern();
            *self.kinds.entry(pattern.kind()).or_insert(0) += 1;
            self.outputs += 1;
            if let Some(address) = encoder.encode(&pattern.destination()) {
                addresses.push(address);
            }
        }

        self.addresses += addresses.len();
        addresses
    }

    /// Take the file count and size of a block directory up front.
    pub fn record_files(&mut self, stats: &BlockFilesStats) {
        self.bytes += stats.total_size;
    }

    /// Fold in the counters kept by a finished scanner.
    pub fn record_scan(&mut self, stats: ScanStats) {
        self.skipped += stats.skipped;
        self.rejected_lengths += stats.rejected_lengths;
    }

    pub fn print(&self) {
        println!("📊 Scan summary");
        println!("   ├─ Files: {} ({} bytes)", self.files, self.bytes);
        println!("   ├─ Blocks decoded: {}", self.blocks);
        println!("   ├─ Records skipped: {}", self.skipped);
        println!("   ├─ Lengths rejected: {}", self.rejected_lengths);
        println!("   ├─ Transactions: {}", self.transactions);
        println!("   ├─ Outputs: {}", self.outputs);
        println!("   └─ Addresses: {}", self.addresses);
        if !self.kinds.is_empty() {
            println!("\n   Outputs by script kind:");
            for (kind, count) in &self.kinds {
                println!("   {:>24}: {}", kind.name(), count);
            }
        }
    }
}

/// One decoded block, as printed in JSON mode
#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub file: Option<u32>,
    pub offset: u64,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub transactions: usize,
    pub addresses: Vec<String>,
}

// =============================================================================
// Scanning
// =============================================================================

/// Scan one block file from `reader`, writing per-block output to `out`.
pub fn scan_reader<R: Read + Seek, W: Write>(
    reader: R,
    file: Option<u32>,
    params: NetworkParams,
    config: &ScanConfig,
    options: OutputOptions,
    out: &mut W,
    summary: &mut ScanSummary,
) -> CliResult<()> {
    let encoder = AddressEncoder::new(params);
    let mut scanner = BlockFileScanner::new(reader, params, config.clone())?;
    if config.start_offset > 0 {
        scanner.seek(config.start_offset)?;
    }

    for item in scanner.by_ref() {
        let scanned = match item {
            Ok(scanned) => scanned,
            Err(skipped) => {
                log::debug!("Record at {} skipped: {}", skipped.offset, skipped.error);
                continue;
            }
        };

        let addresses = summary.record_block(&scanned.block, &encoder);
        log::debug!("Block {} is read", summary.blocks);

        if options.summary_only {
            continue;
        }
        if options.json {
            let report = BlockReport {
                file,
                offset: scanned.offset,
                hash: scanned.block.header.hash_hex(),
                time: scanned.block.header.timestamp(),
                transactions: scanned.block.transactions.len(),
                addresses,
            };
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        } else {
            for address in addresses {
                writeln!(out, "{}", address)?;
            }
        }
    }

    summary.record_scan(scanner.stats());
    summary.files += 1;
    Ok(())
}

fn finish(summary: &ScanSummary, options: OutputOptions) -> CliResult<()> {
    if options.json {
        println!("{}", serde_json::json!({ "summary": summary }));
    } else {
        summary.print();
    }
    Ok(())
}

/// Scan every consecutive block file in a data directory
pub fn cmd_scan(
    network: Network,
    files_config: BlockFilesConfig,
    options: OutputOptions,
) -> CliResult<()> {
    let files = BlockFiles::new(files_config)?;
    let params = network.params();
    let config = ScanConfig::default();
    let mut summary = ScanSummary::default();

    let stats = files.stats()?;
    log::info!(
        "Found {} block files ({} bytes) in {:?}",
        stats.file_count,
        stats.total_size,
        stats.data_dir
    );
    summary.record_files(&stats);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for block_file in files.iter() {
        log::info!("Scanning {:?}", block_file.path);
        let before = summary.blocks;
        scan_reader(
            block_file.open()?,
            Some(block_file.index),
            params,
            &config,
            options,
            &mut out,
            &mut summary,
        )?;
        out.flush()?;
        log::info!(
            "Finished {}: {} blocks",
            files.file_name(block_file.index),
            summary.blocks - before
        );
    }

    if summary.files == 0 {
        log::warn!(
            "No block files found in {:?}",
            files.config().data_dir
        );
    }

    drop(out);
    finish(&summary, options)
}

/// Scan a single block file
pub fn cmd_scan_file(
    network: Network,
    path: &Path,
    start_offset: u64,
    options: OutputOptions,
) -> CliResult<()> {
    let config = ScanConfig {
        start_offset,
        ..Default::default()
    };
    let mut summary = ScanSummary {
        bytes: std::fs::metadata(path)?.len(),
        ..Default::default()
    };

    log::info!("Scanning {:?}", path);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    scan_reader(
        File::open(path)?,
        None,
        network.params(),
        &config,
        options,
        &mut out,
        &mut summary,
    )?;
    out.flush()?;
    drop(out);

    finish(&summary, options)
}

// =============================================================================
// Tooling
// =============================================================================

/// Classify a hex-encoded locking script
pub fn cmd_script(network: Network, script_hex: &str) -> CliResult<()> {
    let script = hex::decode(script_hex.trim())?;
    let pattern = classify(&script);
    let encoder = AddressEncoder::new(network.params());

    println!("📜 Script ({} bytes)", script.len());
    println!("   ├─ Kind: {}", pattern.kind());
    match encoder.encode(&pattern.destination()) {
        Some(address) => println!("   └─ Address: {}", address),
        None => println!("   └─ Address: (none)"),
    }

    Ok(())
}

/// Derive the public key and key-hash address for a secret key
pub fn cmd_derive(network: Network, secret_hex: &str, uncompressed: bool) -> CliResult<()> {
    let secret = hex::decode(secret_hex.trim())?;
    let public_key = derive_public_key(&secret, !uncompressed)?;
    let encoder = AddressEncoder::new(network.params());
    let address = encoder
        .encode(&Destination::PubKeyHash(key_id(&public_key)))
        .ok_or("key hash has no address form")?;

    println!("🔑 Public key: {}", hex::encode(&public_key));
    println!("📍 Address: {}", address);

    Ok(())
}
