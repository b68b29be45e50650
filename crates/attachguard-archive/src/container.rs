//! Container format boundary
//!
//! The inspector only needs four things from a container: how many entries it
//! has, each entry's name, whether an entry is a directory or encrypted, and a
//! way to copy one entry's decompressed bytes out. [`Container`] captures that
//! capability set; [`ZipContainer`] implements it on top of the `zip` crate.

use crate::error::ArchiveError;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::Path;
use zip::ZipArchive;

/// Metadata about a single entry, read from the container index
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntryInfo {
    /// Entry path within the container, as stored
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Whether the entry's encryption flag is set
    pub encrypted: bool,
    /// Declared uncompressed size in bytes
    pub size: u64,
}

/// Read access to a structured container.
pub trait Container {
    /// Number of entries in the container index.
    fn entry_count(&self) -> usize;

    /// Read metadata for the entry at `index` without decompressing it.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the index entry cannot be parsed.
    fn entry(&mut self, index: usize) -> Result<EntryInfo, ArchiveError>;

    /// Copy the decompressed bytes of the entry at `index` into `sink`.
    ///
    /// At most `limit` bytes are accepted. Returns the number of bytes
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::BudgetExceeded` if the entry is larger than
    /// `limit`, `ArchiveError::PasswordProtected` for encrypted entries, and
    /// IO/format errors for corrupted data.
    fn extract(
        &mut self,
        index: usize,
        sink: &mut dyn Write,
        limit: u64,
    ) -> Result<u64, ArchiveError>;

    /// Whether any entry in the container has its encryption flag set.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if an index entry cannot be parsed.
    fn any_encrypted(&mut self) -> Result<bool, ArchiveError> {
        for index in 0..self.entry_count() {
            if self.entry(index)?.encrypted {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// A ZIP archive opened for inspection
pub struct ZipContainer<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> std::fmt::Debug for ZipContainer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipContainer")
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl<R: Read + Seek> ZipContainer<R> {
    /// Parse the central directory of a ZIP stream.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::InvalidZip` if the stream is not a readable ZIP
    /// archive.
    pub fn new(reader: R) -> Result<Self, ArchiveError> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }
}

impl ZipContainer<BufReader<File>> {
    /// Open a ZIP archive from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the file cannot be opened or parsed.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> Container for ZipContainer<R> {
    #[inline]
    fn entry_count(&self) -> usize {
        self.archive.len()
    }

    fn entry(&mut self, index: usize) -> Result<EntryInfo, ArchiveError> {
        // Raw access reads the header without trying to decrypt.
        let zip_file = self.archive.by_index_raw(index)?;
        Ok(EntryInfo {
            name: zip_file.name().to_string(),
            is_dir: zip_file.is_dir(),
            encrypted: zip_file.encrypted(),
            size: zip_file.size(),
        })
    }

    fn extract(
        &mut self,
        index: usize,
        sink: &mut dyn Write,
        limit: u64,
    ) -> Result<u64, ArchiveError> {
        {
            let raw = self.archive.by_index_raw(index)?;
            if raw.encrypted() {
                return Err(ArchiveError::PasswordProtected {
                    name: raw.name().to_string(),
                });
            }
        }

        let zip_file = self.archive.by_index(index)?;
        // One byte of slack tells an exact fit apart from an oversized entry.
        let mut limited = zip_file.take(limit.saturating_add(1));
        let written = io::copy(&mut limited, sink)?;
        if written > limit {
            return Err(ArchiveError::BudgetExceeded {
                what: "extracted bytes",
            });
        }
        Ok(written)
    }
}
