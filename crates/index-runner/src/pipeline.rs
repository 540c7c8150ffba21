//! One sequential batch run of an index variant.
//!
//! Stages hand their results to the next explicitly. The previous score is
//! read from the history as loaded, before backfill and before today's
//! upsert, so same-day re-runs report the same trend.

use crate::report::{DashboardPayload, PayloadInput, ARCHIVE_DISPLAY_LIMIT};
use crate::signals::{signals_for, SignalSet};
use archive_indexer::ArchiveIndexer;
use chrono::NaiveDate;
use composite_index::aggregate;
use history_store::{compute_trend, ensure_minimum, previous_score, trim, upsert, HistoryStore};
use index_core::fs::write_atomic;
use index_core::{
    ArchiveEntry, CompositeResult, HistoryEntry, IndexConfig, PolarityScorer, Result, SubScore,
    TrendResult,
};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info};

/// Everything a run needs besides the raw signals.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: IndexConfig,
    pub today: NaiveDate,
    pub history: HistoryStore,
    pub archive: ArchiveIndexer,
    pub output_path: PathBuf,
    /// History of the index that amplifies this one, if any
    pub amplifier_history: Option<HistoryStore>,
    pub site_url: String,
    pub last_updated: String,
    /// Compute and log only; nothing is written
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub composite: CompositeResult,
    pub trend: TrendResult,
    pub history: Vec<HistoryEntry>,
    pub backfilled: bool,
    pub artifact_path: Option<PathBuf>,
    pub output_written: bool,
    pub payload: DashboardPayload,
}

/// Normalize every configured source.
pub fn normalize_all(
    config: &IndexConfig,
    signals: &SignalSet,
    scorer: &dyn PolarityScorer,
) -> BTreeMap<String, SubScore> {
    signals_for(config, signals)
        .into_iter()
        .filter_map(|(name, signal)| {
            let source = config.source(&name)?;
            Some((name, signal_normalizer::normalize(source, &signal, scorer)))
        })
        .collect()
}

/// Run the full pipeline. Only a failed history write is returned as an error;
/// every other failure is logged and replaced by a fallback.
pub fn run<R: Rng>(
    ctx: &PipelineContext,
    signals: &SignalSet,
    scorer: &dyn PolarityScorer,
    rng: &mut R,
) -> Result<RunOutcome> {
    let config = &ctx.config;
    info!(index = %config.id, date = %ctx.today, dry_run = ctx.dry_run, "Starting index run");

    let sub_scores = normalize_all(config, signals, scorer);
    let amplifier_input = ctx
        .amplifier_history
        .as_ref()
        .and_then(|store| store.latest_score());
    let composite = aggregate(config, sub_scores, amplifier_input);

    let mut history = ctx.history.load();
    let previous = previous_score(&history, ctx.today);

    let backfilled = match &config.backfill {
        Some(policy) => ensure_minimum(&mut history, ctx.today, policy, rng),
        None => false,
    };
    upsert(&mut history, ctx.today, composite.final_score);
    trim(&mut history, config.history_window);

    if !ctx.dry_run {
        ctx.history.save(&history)?;
    }

    let trend = compute_trend(previous, composite.final_score);
    info!(
        delta = trend.delta,
        direction = trend.arrow.direction(),
        "Trend computed"
    );

    let mut payload = DashboardPayload::build(PayloadInput {
        config,
        date: ctx.today,
        composite: &composite,
        trend: &trend,
        history: &history,
        backfilled,
        archive: projected_archive(&ctx.archive, ctx.today),
        last_updated: ctx.last_updated.clone(),
        site_url: &ctx.site_url,
    });

    let mut artifact_path = None;
    let mut output_written = false;
    if !ctx.dry_run {
        match ctx.archive.write_json(ctx.today, &payload) {
            Ok(path) => artifact_path = Some(path),
            Err(err) => error!("{}. Continuing without today's archive artifact", err),
        }
        payload.archive = ctx.archive.latest(ARCHIVE_DISPLAY_LIMIT);

        output_written = match write_output(&ctx.output_path, &payload) {
            Ok(()) => true,
            Err(err) => {
                error!(path = %ctx.output_path.display(), "Failed to write dashboard payload: {}", err);
                false
            }
        };
    }

    info!(
        index = %config.id,
        score = composite.final_score,
        status = %composite.status_label,
        entries = history.len(),
        "Index run complete"
    );

    Ok(RunOutcome {
        composite,
        trend,
        history,
        backfilled,
        artifact_path,
        output_written,
        payload,
    })
}

/// Archive listing as it will look once today's artifact exists.
fn projected_archive(archive: &ArchiveIndexer, today: NaiveDate) -> Vec<ArchiveEntry> {
    let mut entries = archive.scan();
    if !entries.iter().any(|entry| entry.date == today) {
        entries.push(ArchiveEntry {
            date: today,
            artifact_path: archive.artifact_path(today),
        });
        entries.sort_by(|a, b| b.date.cmp(&a.date));
    }
    entries
}

fn write_output(path: &std::path::Path, payload: &DashboardPayload) -> Result<()> {
    let body = serde_json::to_vec_pretty(payload)?;
    write_atomic(path, &body)?;
    info!(path = %path.display(), "Dashboard payload written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_core::{Bar, IndexError, RawSignal, TrendArrow};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use signal_normalizer::LexiconPolarity;
    use std::path::Path;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn context(dir: &Path, config: IndexConfig, today: NaiveDate) -> PipelineContext {
        PipelineContext {
            archive: ArchiveIndexer::new(dir.join("archive"), config.archive_prefix(), "json"),
            config,
            today,
            history: HistoryStore::new(dir.join("history.json")),
            output_path: dir.join("dashboard.json"),
            amplifier_history: None,
            site_url: "https://example.org".to_string(),
            last_updated: "2024-01-02 08:00".to_string(),
            dry_run: false,
        }
    }

    fn strait_without_backfill() -> IndexConfig {
        let mut config = IndexConfig::taiwan_strait();
        config.backfill = None;
        config
    }

    /// Market 40 (SPY +2.5%, TSM flat) and conflict 20 (ten calm headlines that each mention jets).
    fn scenario_signals() -> SignalSet {
        let mut signals = SignalSet::new();
        signals.insert(
            "market".to_string(),
            RawSignal::PriceWindows {
                reference: vec![Bar::new(100.0, 100.0), Bar::new(100.0, 102.5)],
                subject: vec![Bar::new(50.0, 50.0), Bar::new(50.0, 50.0)],
            },
        );
        signals.insert(
            "conflict".to_string(),
            RawSignal::Headlines {
                titles: vec!["Ceasefire deal holds as jets return - Reuters".to_string(); 10],
            },
        );
        signals
    }

    fn seed_history(dir: &TempDir) {
        std::fs::write(
            dir.path().join("history.json"),
            r#"[{"date":"2024-01-01","score":34}]"#,
        )
        .unwrap();
    }

    #[test]
    fn end_to_end_scenario() {
        let dir = tempfile::tempdir().unwrap();
        seed_history(&dir);
        let ctx = context(dir.path(), strait_without_backfill(), day(2));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap();

        assert_eq!(outcome.composite.sub_scores["market"].value, 40);
        assert_eq!(outcome.composite.sub_scores["conflict"].value, 20);
        assert_eq!(outcome.composite.final_score, 30);
        assert_eq!(outcome.composite.status_label, "Elevated");
        assert_eq!(outcome.trend.delta, -4);
        assert_eq!(outcome.trend.arrow, TrendArrow::Down);
        assert_eq!(outcome.trend.arrow.direction(), "falling");
        assert!(!outcome.backfilled);

        let expected = vec![HistoryEntry::new(day(1), 34), HistoryEntry::new(day(2), 30)];
        assert_eq!(outcome.history, expected);
        assert_eq!(ctx.history.load(), expected);

        let artifact = outcome.artifact_path.unwrap();
        assert!(artifact.ends_with("taiwan-strait-report-2024-01-02.json"));
        assert!(outcome.output_written);
        assert_eq!(outcome.payload.archive[0].date, day(2));
    }

    #[test]
    fn same_day_rerun_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        seed_history(&dir);
        let ctx = context(dir.path(), strait_without_backfill(), day(2));
        let mut rng = StdRng::seed_from_u64(0);
        let scorer = LexiconPolarity::default();

        let first = run(&ctx, &scenario_signals(), &scorer, &mut rng).unwrap();
        let second = run(&ctx, &scenario_signals(), &scorer, &mut rng).unwrap();

        assert_eq!(second.history.len(), 2);
        assert_eq!(second.history, first.history);
        assert_eq!(second.trend, first.trend);
        assert_eq!(ctx.archive.scan().len(), 1);
    }

    #[test]
    fn cold_start_backfills_and_reports_no_change() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), IndexConfig::taiwan_strait(), day(31));
        let mut rng = StdRng::seed_from_u64(11);

        let outcome = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap();

        assert!(outcome.backfilled);
        assert!(outcome.payload.backfilled);
        assert_eq!(outcome.history.len(), 30);
        assert_eq!(outcome.history.last(), Some(&HistoryEntry::new(day(31), 30)));
        assert!(outcome.history[..29].iter().all(|e| (25..=45).contains(&e.score)));
        assert!(outcome.history.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(outcome.trend.delta, 0);
    }

    #[test]
    fn corrupt_history_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("history.json"), "<<garbage>>").unwrap();
        let ctx = context(dir.path(), strait_without_backfill(), day(2));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap();
        assert_eq!(outcome.history, vec![HistoryEntry::new(day(2), 30)]);
        assert_eq!(outcome.trend.delta, 0);
    }

    #[test]
    fn missing_signals_fall_back_per_source() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), strait_without_backfill(), day(2));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &SignalSet::new(), &LexiconPolarity::default(), &mut rng).unwrap();
        assert_eq!(outcome.composite.final_score, 30);
        for sub in outcome.composite.sub_scores.values() {
            assert!(sub.evidence.starts_with("Data unavailable"));
        }
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        seed_history(&dir);
        let mut ctx = context(dir.path(), strait_without_backfill(), day(2));
        ctx.dry_run = true;
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap();
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(ctx.history.load(), vec![HistoryEntry::new(day(1), 34)]);
        assert!(outcome.artifact_path.is_none());
        assert!(!outcome.output_written);
        assert!(!dir.path().join("archive").exists());
        assert_eq!(outcome.payload.archive[0].date, day(2));
    }

    #[test]
    fn unwritable_history_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut ctx = context(dir.path(), strait_without_backfill(), day(2));
        ctx.history = HistoryStore::new(blocker.join("history.json"));
        let mut rng = StdRng::seed_from_u64(0);

        let err = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap_err();
        assert!(matches!(err, IndexError::HistoryWrite { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn archive_failure_does_not_block_history_or_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        seed_history(&dir);
        std::fs::write(dir.path().join("archive"), "not a directory").unwrap();
        let ctx = context(dir.path(), strait_without_backfill(), day(2));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &scenario_signals(), &LexiconPolarity::default(), &mut rng).unwrap();
        assert!(outcome.artifact_path.is_none());
        assert!(outcome.payload.archive.is_empty());
        assert!(outcome.output_written);
        assert_eq!(ctx.history.load().len(), 2);
    }

    #[test]
    fn basket_variant_runs_from_configuration_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = IndexConfig::k_shape();
        config.backfill = None;
        let ctx = context(dir.path(), config, day(2));

        let closes = [
            ("SPY", vec![100.0, 105.0]),
            ("VNQ", vec![100.0, 110.0]),
            ("DBA", vec![100.0, 102.0]),
            ("XLP", vec![100.0, 101.0]),
        ]
        .into_iter()
        .map(|(symbol, series)| (symbol.to_string(), series))
        .collect();
        let mut signals = SignalSet::new();
        signals.insert("gap".to_string(), RawSignal::Closes { closes });
        let mut rng = StdRng::seed_from_u64(0);

        // (1.075 - 1.015) * 100 * 2.5 + 50
        let outcome = run(&ctx, &signals, &LexiconPolarity::default(), &mut rng).unwrap();
        assert_eq!(outcome.composite.final_score, 65);
        assert_eq!(outcome.composite.status_label, "STABLE TREND");
        assert!(outcome
            .artifact_path
            .unwrap()
            .ends_with("k-shape-report-2024-01-02.json"));
    }

    #[test]
    fn amplifier_reads_the_other_index_history() {
        let dir = tempfile::tempdir().unwrap();
        let strait = HistoryStore::new(dir.path().join("strait.json"));
        strait.save(&[HistoryEntry::new(day(1), 100)]).unwrap();

        let mut config = IndexConfig::ai_bubble();
        config.backfill = None;
        let mut ctx = context(dir.path(), config, day(2));
        ctx.amplifier_history = Some(strait);

        let mut signals = SignalSet::new();
        for name in ["valuation", "adoption"] {
            signals.insert(name.to_string(), RawSignal::Value { value: 40.0 });
        }
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = run(&ctx, &signals, &LexiconPolarity::default(), &mut rng).unwrap();
        assert_eq!(outcome.composite.amplifier, Some(1.5));
        assert!(outcome.composite.final_score > outcome.composite.base_score);
    }
}
