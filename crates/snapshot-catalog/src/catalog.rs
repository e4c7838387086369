//! Directory scanning and snapshot lookup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult};
use crate::feed::DateExtractor;

/// One dated snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub filename: String,
    pub date: NaiveDate,
    /// e.g. "Pronóstico para 10 Mar 2024"
    pub label: String,
}

impl SnapshotEntry {
    pub fn new(filename: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            filename: filename.into(),
            date,
            label: format!("Pronóstico para {}", date.format("%d %b %Y")),
        }
    }
}

/// What a catalog found, so the page can say which "no data" case applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    MissingDirectory,
    Empty,
    Ready,
}

/// Dated snapshots of one directory, ascending by date.
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    dir: PathBuf,
    dir_exists: bool,
    entries: Vec<SnapshotEntry>,
}

impl SnapshotCatalog {
    /// List `dir`, keeping files whose name yields a date.
    ///
    /// A missing directory is not an error; it produces an empty catalog
    /// with [`CatalogStatus::MissingDirectory`].
    pub fn scan(dir: impl AsRef<Path>, extractor: &DateExtractor) -> CatalogResult<Self> {
        let path = dir.as_ref();
        let io_err = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        let read_dir = match fs::read_dir(path) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = ?path, "Snapshot directory does not exist");
                return Ok(Self {
                    dir: path.to_path_buf(),
                    dir_exists: false,
                    entries: Vec::new(),
                });
            }
            Err(e) => return Err(io_err(e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(io_err)?;
            // Follows symlinks; dangling links are skipped.
            if !entry.path().is_file() {
                continue;
            }
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match extractor.extract(&filename) {
                Some(date) => entries.push(SnapshotEntry::new(filename, date)),
                None => debug!(file = %filename, "Skipping snapshot without a valid date"),
            }
        }

        entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.filename.cmp(&b.filename)));

        debug!(path = ?path, count = entries.len(), "Scanned snapshot directory");
        Ok(Self {
            dir: path.to_path_buf(),
            dir_exists: true,
            entries,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn status(&self) -> CatalogStatus {
        if !self.dir_exists {
            CatalogStatus::MissingDirectory
        } else if self.entries.is_empty() {
            CatalogStatus::Empty
        } else {
            CatalogStatus::Ready
        }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn entry(&self, filename: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    pub fn first(&self) -> Option<&SnapshotEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full text of a catalogued snapshot. Names outside the catalog are
    /// rejected before touching the filesystem.
    pub fn read(&self, filename: &str) -> CatalogResult<String> {
        let entry = self
            .entry(filename)
            .ok_or_else(|| CatalogError::NotInCatalog(filename.to_string()))?;
        let path = self.dir.join(&entry.filename);
        fs::read_to_string(&path).map_err(|source| CatalogError::Io { path, source })
    }
}
