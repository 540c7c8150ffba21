use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A risk score on the 0-100 scale.
pub type Score = u8;

/// Daily price bar. Only the session open and close are used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(open: f64, close: f64) -> Self {
        Self { open, close }
    }
}

/// One already-fetched measurement for a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSignal {
    /// Comparable price windows for a reference and a subject instrument
    PriceWindows { reference: Vec<Bar>, subject: Vec<Bar> },
    /// Ordered observations, oldest first (closes, volumes)
    Series { values: Vec<f64> },
    /// Closes per instrument symbol, oldest first
    Closes { closes: BTreeMap<String, Vec<f64>> },
    /// Headlines, most recent first
    Headlines { titles: Vec<String> },
    /// A single scalar reading (forward P/E, a placeholder level)
    Value { value: f64 },
    /// The fetch collaborator failed for this source
    Unavailable { reason: String },
}

impl RawSignal {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RawSignal::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RawSignal::PriceWindows { .. } => "price_windows",
            RawSignal::Series { .. } => "series",
            RawSignal::Closes { .. } => "closes",
            RawSignal::Headlines { .. } => "headlines",
            RawSignal::Value { .. } => "value",
            RawSignal::Unavailable { .. } => "unavailable",
        }
    }
}

/// A single source's normalized risk contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub value: Score,
    pub evidence: String,
}

impl SubScore {
    pub fn new(value: Score, evidence: impl Into<String>) -> Self {
        Self {
            value: value.min(crate::scale::MAX_SCORE),
            evidence: evidence.into(),
        }
    }
}

/// Weighted, classified result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub final_score: Score,
    /// Weighted score before any amplifier was applied
    pub base_score: Score,
    /// Multiplier applied on top of the weighted score, if the index has one
    pub amplifier: Option<f64>,
    pub status_label: String,
    pub status_color: String,
    pub status_summary: String,
    pub sub_scores: BTreeMap<String, SubScore>,
}

/// One persisted daily reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub score: Score,
}

impl HistoryEntry {
    pub fn new(date: NaiveDate, score: Score) -> Self {
        Self { date, score }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendArrow {
    Up,
    Down,
    Flat,
}

impl TrendArrow {
    pub fn from_delta(delta: i32) -> Self {
        match delta {
            d if d > 0 => TrendArrow::Up,
            d if d < 0 => TrendArrow::Down,
            _ => TrendArrow::Flat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendArrow::Up => "up",
            TrendArrow::Down => "down",
            TrendArrow::Flat => "flat",
        }
    }

    /// Direction of risk, as shown next to the score
    pub fn direction(&self) -> &'static str {
        match self {
            TrendArrow::Up => "rising",
            TrendArrow::Down => "falling",
            TrendArrow::Flat => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendResult {
    pub delta: i32,
    pub arrow: TrendArrow,
    pub description: String,
}

/// One dated artifact discovered in the archive directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub date: NaiveDate,
    pub artifact_path: PathBuf,
}
