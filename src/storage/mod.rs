//! Storage module for block file access

pub mod block_files;

pub use block_files::{
    BlockFile, BlockFileIter, BlockFiles, BlockFilesConfig, BlockFilesStats, StorageError,
};
