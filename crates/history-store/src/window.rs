use chrono::{Days, NaiveDate};
use index_core::{BackfillPolicy, HistoryEntry, Score};
use rand::Rng;
use tracing::{info, warn};

/// Backfill triggers iff the history holds fewer than `min_entries` readings.
pub fn needs_backfill(entries: &[HistoryEntry], policy: &BackfillPolicy) -> bool {
    entries.len() < policy.min_entries
}

/// Synthetic calm-baseline history: one entry per day for the `window` days
/// ending the day before `today`, oldest first, each score drawn from
/// `low..=high`.
pub fn synthesize_backfill<R: Rng>(
    today: NaiveDate,
    policy: &BackfillPolicy,
    rng: &mut R,
) -> Vec<HistoryEntry> {
    (1..=policy.window as u64)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| HistoryEntry::new(date, rng.gen_range(policy.low..=policy.high)))
        .collect()
}

/// Replace a too-short history with synthetic backfill. Returns whether it did.
pub fn ensure_minimum<R: Rng>(
    entries: &mut Vec<HistoryEntry>,
    today: NaiveDate,
    policy: &BackfillPolicy,
    rng: &mut R,
) -> bool {
    if !needs_backfill(entries, policy) {
        return false;
    }

    warn!(
        entries = entries.len(),
        min_entries = policy.min_entries,
        "History too short, synthesizing {} days of calm baseline ({}-{})",
        policy.window,
        policy.low,
        policy.high
    );
    *entries = synthesize_backfill(today, policy, rng);
    true
}

/// Insert or overwrite the reading for `date`, keeping ascending order.
pub fn upsert(entries: &mut Vec<HistoryEntry>, date: NaiveDate, score: Score) {
    entries.retain(|entry| entry.date != date);
    let at = entries.partition_point(|entry| entry.date < date);
    entries.insert(at, HistoryEntry::new(date, score));
}

/// Keep only the most recent `window` entries.
pub fn trim(entries: &mut Vec<HistoryEntry>, window: usize) {
    if entries.len() > window {
        let excess = entries.len() - window;
        entries.drain(..excess);
        info!(dropped = excess, window, "Trimmed history");
    }
}

/// Score of the last entry strictly before `today`. Must be read before
/// today's reading is upserted.
pub fn previous_score(entries: &[HistoryEntry], today: NaiveDate) -> Option<Score> {
    entries
        .iter()
        .rev()
        .find(|entry| entry.date < today)
        .map(|entry| entry.score)
}
