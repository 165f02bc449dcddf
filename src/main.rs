//! blkaddr CLI Application
//!
//! Extracts destination addresses from on-disk block files.

use blkaddr::cli::{self, OutputOptions};
use blkaddr::core::Network;
use blkaddr::storage::BlockFilesConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blkaddr")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Extract output addresses from raw block files", long_about = None)]
struct Cli {
    /// Network whose record marker and address prefixes to use
    #[arg(short, long, value_enum, default_value_t = Network::Mainnet)]
    network: Network,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan consecutive blkNNNNN.dat files in a directory
    Scan {
        /// Directory holding the block files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// First file number to scan
        #[arg(long, default_value = "0")]
        first: u32,

        /// Last file number to scan (default: until the first missing file)
        #[arg(long)]
        last: Option<u32>,

        /// Print one JSON object per block
        #[arg(long)]
        json: bool,

        /// Print only the final summary
        #[arg(long)]
        summary_only: bool,
    },

    /// Scan a single block file
    ScanFile {
        /// Path to the block file
        path: PathBuf,

        /// Byte offset to start scanning from
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Print one JSON object per block
        #[arg(long)]
        json: bool,

        /// Print only the final summary
        #[arg(long)]
        summary_only: bool,
    },

    /// Classify a hex-encoded output script
    Script {
        /// Script bytes in hex
        hex: String,
    },

    /// Derive the public key and address of a secret key
    Derive {
        /// 32-byte secret key in hex
        secret: String,

        /// Use the uncompressed public key encoding
        #[arg(long)]
        uncompressed: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("Using {} parameters", cli.network);

    match cli.command {
        Commands::Scan {
            data_dir,
            first,
            last,
            json,
            summary_only,
        } => {
            let files = BlockFilesConfig {
                data_dir,
                first_index: first,
                last_index: last,
                ..Default::default()
            };
            cli::cmd_scan(cli.network, files, OutputOptions { json, summary_only })?;
        }

        Commands::ScanFile {
            path,
            offset,
            json,
            summary_only,
        } => {
            cli::cmd_scan_file(
                cli.network,
                &path,
                offset,
                OutputOptions { json, summary_only },
            )?;
        }

        Commands::Script { hex } => {
            cli::cmd_script(cli.network, &hex)?;
        }

        Commands::Derive {
            secret,
            uncompressed,
        } => {
            cli::cmd_derive(cli.network, &secret, uncompressed)?;
        }
    }

    Ok(())
}
