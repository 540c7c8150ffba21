//! Archive Indexer
//!
//! One artifact per calendar day in a flat directory, named
//! `{prefix}{YYYY-MM-DD}.{extension}`. The filename is a pure function of the
//! date, so a re-run on the same day overwrites that day's artifact. The index
//! itself is never stored: it is rebuilt by scanning the directory.

use chrono::NaiveDate;
use index_core::fs::write_atomic;
use index_core::{ArchiveEntry, IndexError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DATE_LEN: usize = "YYYY-MM-DD".len();

#[derive(Debug, Clone)]
pub struct ArchiveIndexer {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl ArchiveIndexer {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.prefix,
            date.format("%Y-%m-%d"),
            self.extension
        ))
    }

    /// Write (or overwrite) the artifact for `date`.
    pub fn write_artifact(&self, date: NaiveDate, body: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(date);
        write_atomic(&path, body).map_err(|source| IndexError::ArchiveWrite {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Archive artifact written");
        Ok(path)
    }

    pub fn write_json<T: Serialize>(&self, date: NaiveDate, value: &T) -> Result<PathBuf> {
        let body = serde_json::to_vec_pretty(value)?;
        self.write_artifact(date, &body)
    }

    /// All dated artifacts, newest first, at most one per date.
    ///
    /// A missing directory is an empty archive. Unreadable directories are
    /// logged and also yield an empty list.
    pub fn scan(&self) -> Vec<ArchiveEntry> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "Archive directory does not exist yet");
                return Vec::new();
            }
            Err(err) => {
                warn!(dir = %self.dir.display(), "Failed to read archive directory: {}", err);
                return Vec::new();
            }
        };

        let mut by_date: BTreeMap<NaiveDate, PathBuf> = BTreeMap::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            let Some(date) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(find_iso_date)
            else {
                continue;
            };

            // The canonical name wins, otherwise the lexically first file.
            let canonical = self.artifact_path(date);
            let replace = match by_date.get(&date) {
                None => true,
                Some(existing) => path == canonical || (*existing != canonical && path < *existing),
            };
            if replace {
                by_date.insert(date, path);
            }
        }

        by_date
            .into_iter()
            .rev()
            .map(|(date, artifact_path)| ArchiveEntry { date, artifact_path })
            .collect()
    }

    /// The `n` most recent artifacts.
    pub fn latest(&self, n: usize) -> Vec<ArchiveEntry> {
        let mut entries = self.scan();
        entries.truncate(n);
        entries
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

/// First `YYYY-MM-DD` substring that is a real calendar date.
pub fn find_iso_date(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() < DATE_LEN {
        return None;
    }
    (0..=bytes.len() - DATE_LEN).find_map(|start| {
        let candidate = name.get(start..start + DATE_LEN)?;
        let shaped = candidate.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shaped {
            return None;
        }
        NaiveDate::parse_from_str(candidate, "%Y-%m-%d").ok()
    })
}
