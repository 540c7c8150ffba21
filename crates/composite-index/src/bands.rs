use index_core::{Score, StatusBand};

pub const UNCLASSIFIED_LABEL: &str = "UNCLASSIFIED";
pub const UNCLASSIFIED_COLOR: &str = "#6c757d";

/// Map a score to exactly one band: the first whose exclusive upper bound
/// exceeds the score, else the open-ended last band.
pub fn classify(bands: &[StatusBand], score: Score) -> Option<&StatusBand> {
    bands
        .iter()
        .find(|band| band.upper.map_or(true, |upper| score < upper))
        .or_else(|| bands.last())
}
