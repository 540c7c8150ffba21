//! Hand-off payload for the dashboard renderer and social posting stages.

use chrono::NaiveDate;
use index_core::{ArchiveEntry, CompositeResult, HistoryEntry, IndexConfig, Score, TrendResult};
use serde::{Deserialize, Serialize};

/// Number of archive links shown on the dashboard.
pub const ARCHIVE_DISPLAY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceView {
    pub name: String,
    pub label: String,
    pub weight: f64,
    pub score: Score,
    pub evidence: String,
}

/// Everything the render and post collaborators need, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub index_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub final_score: Score,
    pub base_score: Score,
    pub amplifier: Option<f64>,
    pub status_label: String,
    pub status_color: String,
    pub status_summary: String,
    pub sources: Vec<SourceView>,
    pub trend: TrendResult,
    /// Full history, ascending, for the chart
    pub history: Vec<HistoryEntry>,
    /// True when the history was replaced by synthetic backfill this run
    pub backfilled: bool,
    /// Newest first, capped at [`ARCHIVE_DISPLAY_LIMIT`]
    pub archive: Vec<ArchiveEntry>,
    pub last_updated: String,
    pub site_url: String,
    pub post_text: String,
}

pub struct PayloadInput<'a> {
    pub config: &'a IndexConfig,
    pub date: NaiveDate,
    pub composite: &'a CompositeResult,
    pub trend: &'a TrendResult,
    pub history: &'a [HistoryEntry],
    pub backfilled: bool,
    pub archive: Vec<ArchiveEntry>,
    pub last_updated: String,
    pub site_url: &'a str,
}

impl DashboardPayload {
    pub fn build(input: PayloadInput<'_>) -> Self {
        let PayloadInput {
            config,
            date,
            composite,
            trend,
            history,
            backfilled,
            mut archive,
            last_updated,
            site_url,
        } = input;

        let sources = config
            .sources
            .iter()
            .map(|source| {
                let sub = composite.sub_scores.get(&source.name);
                SourceView {
                    name: source.name.clone(),
                    label: source.label.clone(),
                    weight: source.weight,
                    score: sub.map_or(source.fallback_score, |s| s.value),
                    evidence: sub.map(|s| s.evidence.clone()).unwrap_or_default(),
                }
            })
            .collect();

        archive.truncate(ARCHIVE_DISPLAY_LIMIT);

        Self {
            index_id: config.id.clone(),
            title: config.title.clone(),
            date,
            final_score: composite.final_score,
            base_score: composite.base_score,
            amplifier: composite.amplifier,
            status_label: composite.status_label.clone(),
            status_color: composite.status_color.clone(),
            status_summary: composite.status_summary.clone(),
            sources,
            trend: trend.clone(),
            history: history.to_vec(),
            backfilled,
            archive,
            last_updated,
            site_url: site_url.to_string(),
            post_text: post_text(
                &config.title,
                composite.final_score,
                &composite.status_label,
                trend,
                site_url,
            ),
        }
    }
}

pub fn post_text(title: &str, score: Score, label: &str, trend: &TrendResult, url: &str) -> String {
    format!(
        "🚨 {title} Update\n\nToday's Risk Index: {score}/100 ({label}, {})\n\nFull intelligence briefing and radar: {url}",
        trend.arrow.direction()
    )
}
