use index_core::fs::write_atomic;
use index_core::scale::MAX_SCORE;
use index_core::{HistoryEntry, IndexError, Result, Score};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// JSON-file backed history of daily readings.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read persisted entries. A missing file is an empty history; malformed
    /// content is reported as [`IndexError::HistoryCorrupt`].
    pub fn try_load(&self) -> Result<Vec<HistoryEntry>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(IndexError::HistoryCorrupt {
                    path: self.path.clone(),
                    reason: err.to_string(),
                })
            }
        };

        let entries: Vec<HistoryEntry> =
            serde_json::from_str(&raw).map_err(|err| IndexError::HistoryCorrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;

        Ok(normalize(entries))
    }

    /// Like [`try_load`](Self::try_load), but a corrupt or unreadable file
    /// degrades to an empty history.
    pub fn load(&self) -> Vec<HistoryEntry> {
        match self.try_load() {
            Ok(entries) => {
                debug!(path = %self.path.display(), entries = entries.len(), "Loaded history");
                entries
            }
            Err(err) => {
                warn!("{}. Treating history as empty", err);
                Vec::new()
            }
        }
    }

    /// Score of the most recent persisted entry, if any.
    pub fn latest_score(&self) -> Option<Score> {
        self.load().last().map(|entry| entry.score)
    }

    /// Overwrite the persisted history with `entries`.
    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let body = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &body).map_err(|source| IndexError::HistoryWrite {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), entries = entries.len(), "History saved");
        Ok(())
    }
}

/// Ascending by date, one entry per date (the later record in the file wins),
/// scores capped at 100.
fn normalize(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.sort_by_key(|entry| entry.date);

    let mut out: Vec<HistoryEntry> = Vec::with_capacity(entries.len());
    for mut entry in entries {
        entry.score = entry.score.min(MAX_SCORE);
        match out.last_mut() {
            Some(last) if last.date == entry.date => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}
