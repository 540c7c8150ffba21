use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("History corrupt at {}: {reason}", path.display())]
    HistoryCorrupt { path: PathBuf, reason: String },

    #[error("History write failed for {}: {source}", path.display())]
    HistoryWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive write failed for {}: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Fatal errors abort the run; everything else has a fallback value.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IndexError::HistoryWrite { .. } | IndexError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_history_write_and_config_errors_are_fatal() {
        let write = IndexError::HistoryWrite {
            path: PathBuf::from("history.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        let archive = IndexError::ArchiveWrite {
            path: PathBuf::from("archive/report-2024-01-02.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        let corrupt = IndexError::HistoryCorrupt {
            path: PathBuf::from("history.json"),
            reason: "expected value at line 1".to_string(),
        };

        assert!(write.is_fatal());
        assert!(IndexError::InvalidConfig("weights".into()).is_fatal());
        assert!(!archive.is_fatal());
        assert!(!corrupt.is_fatal());
    }

    #[test]
    fn messages_name_the_path() {
        let err = IndexError::HistoryCorrupt {
            path: PathBuf::from("data/history.json"),
            reason: "trailing characters".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "History corrupt at data/history.json: trailing characters"
        );
    }
}
