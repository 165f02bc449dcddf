//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_derive, cmd_scan, cmd_scan_file, cmd_script, scan_reader, BlockReport, CliResult,
    OutputOptions, ScanSummary,
};
