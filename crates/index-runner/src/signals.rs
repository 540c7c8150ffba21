use index_core::{IndexConfig, IndexError, RawSignal};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Raw signals keyed by source name, as written by the fetch stage.
pub type SignalSet = BTreeMap<String, RawSignal>;

/// Load the signal file. A missing or malformed file yields an empty set, so
/// every source degrades to its fallback score.
pub fn load_signals(path: &Path) -> SignalSet {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            let err = IndexError::SourceUnavailable {
                source_name: path.display().to_string(),
                reason: err.to_string(),
            };
            warn!("{}. All sources will use fallback scores", err);
            return SignalSet::new();
        }
    };

    match serde_json::from_str::<SignalSet>(&raw) {
        Ok(signals) => {
            info!(path = %path.display(), sources = signals.len(), "Loaded raw signals");
            signals
        }
        Err(err) => {
            warn!(path = %path.display(), "Malformed signal file: {}. All sources will use fallback scores", err);
            SignalSet::new()
        }
    }
}

/// The signal for every configured source, `Unavailable` where none was fetched.
pub fn signals_for(config: &IndexConfig, signals: &SignalSet) -> Vec<(String, RawSignal)> {
    config
        .sources
        .iter()
        .map(|source| {
            let signal = signals
                .get(&source.name)
                .cloned()
                .unwrap_or_else(|| RawSignal::unavailable("no measurement fetched"));
            (source.name.clone(), signal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_signals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        std::fs::write(
            &path,
            r#"{
                "market": {"kind": "price_windows",
                           "reference": [{"open": 100.0, "close": 101.0}, {"open": 101.0, "close": 102.0}],
                           "subject": [{"open": 50.0, "close": 50.0}, {"open": 50.0, "close": 49.0}]},
                "conflict": {"kind": "unavailable", "reason": "RSS timeout"}
            }"#,
        )
        .unwrap();

        let signals = load_signals(&path);
        assert_eq!(signals.len(), 2);
        assert_eq!(signals["market"].kind(), "price_windows");
        assert_eq!(signals["conflict"], RawSignal::unavailable("RSS timeout"));
    }

    #[test]
    fn missing_or_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_signals(&dir.path().join("absent.json")).is_empty());

        let corrupt = dir.path().join("signals.json");
        std::fs::write(&corrupt, "[1, 2").unwrap();
        assert!(load_signals(&corrupt).is_empty());
    }

    #[test]
    fn unfetched_sources_are_unavailable() {
        let config = IndexConfig::taiwan_strait();
        let mut signals = SignalSet::new();
        signals.insert("market".to_string(), RawSignal::Value { value: 1.0 });

        let resolved = signals_for(&config, &signals);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, "market");
        assert_eq!(resolved[1].1.kind(), "unavailable");
    }
}
