//! Block file enumeration
//!
//! Block files are numbered sequentially (`blk00000.dat`, `blk00001.dat`,
//! ...) inside one data directory. Enumeration walks the numbers upwards
//! and stops at the first file that does not exist.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Not found: {0:?}")]
    NotFound(PathBuf),
}

/// Block file naming and range
#[derive(Debug, Clone)]
pub struct BlockFilesConfig {
    pub data_dir: PathBuf,
    pub file_prefix: String,
    pub file_extension: String,
    pub first_index: u32,
    /// Inclusive upper bound; unbounded when `None`
    pub last_index: Option<u32>,
}

impl Default for BlockFilesConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("blocks"),
            file_prefix: "blk".to_string(),
            file_extension: "dat".to_string(),
            first_index: 0,
            last_index: None,
        }
    }
}

/// A numbered block file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFile {
    pub index: u32,
    pub path: PathBuf,
}

impl BlockFile {
    pub fn open(&self) -> Result<fs::File, StorageError> {
        match fs::File::open(&self.path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn size(&self) -> Result<u64, StorageError> {
        Ok(fs::metadata(&self.path)?.len())
    }
}

/// Block file directory
pub struct BlockFiles {
    config: BlockFilesConfig,
}

impl BlockFiles {
    /// Bind to a data directory, which must exist.
    pub fn new(config: BlockFilesConfig) -> Result<Self, StorageError> {
        if !config.data_dir.is_dir() {
            return Err(StorageError::NotFound(config.data_dir.clone()));
        }
        Ok(Self { config })
    }

    /// Default naming inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Result<Self, StorageError> {
        Self::new(BlockFilesConfig {
            data_dir: data_dir.to_path_buf(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &BlockFilesConfig {
        &self.config
    }

    /// File name for `index`, e.g. `blk00042.dat`
    pub fn file_name(&self, index: u32) -> String {
        format!(
            "{}{:05}.{}",
            self.config.file_prefix, index, self.config.file_extension
        )
    }

    pub fn file_path(&self, index: u32) -> PathBuf {
        self.config.data_dir.join(self.file_name(index))
    }

    pub fn exists(&self, index: u32) -> bool {
        self.file_path(index).is_file()
    }

    /// Files from `first_index` up to the first gap (or `last_index`).
    pub fn iter(&self) -> BlockFileIter<'_> {
        BlockFileIter {
            files: self,
            next: Some(self.config.first_index),
        }
    }

    /// Get directory statistics for the enumerated range
    pub fn stats(&self) -> Result<BlockFilesStats, StorageError> {
        let mut stats = BlockFilesStats {
            file_count: 0,
            total_size: 0,
            data_dir: self.config.data_dir.clone(),
        };
        for file in self.iter() {
            stats.file_count += 1;
            stats.total_size += file.size()?;
        }
        Ok(stats)
    }
}

/// Iterator over consecutive block files
pub struct BlockFileIter<'a> {
    files: &'a BlockFiles,
    next: Option<u32>,
}

impl Iterator for BlockFileIter<'_> {
    type Item = BlockFile;

    fn next(&mut self) -> Option<BlockFile> {
        let index = self.next?;
        if self.files.config.last_index.is_some_and(|last| index > last) {
            self.next = None;
            return None;
        }

        let path = self.files.file_path(index);
        if !path.is_file() {
            log::debug!("No block file at {:?}, stopping", path);
            self.next = None;
            return None;
        }

        self.next = index.checked_add(1);
        Some(BlockFile { index, path })
    }
}

/// Block file statistics
#[derive(Debug)]
pub struct BlockFilesStats {
    pub file_count: usize,
    pub total_size: u64,
    pub data_dir: PathBuf,
}
