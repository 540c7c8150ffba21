//! index-runner: compute one day's reading of a composite risk index.
//!
//! Reads the raw signals written by the fetch stage, updates the rolling
//! history, writes the dated archive artifact and the dashboard payload.
//!
//! Usage:
//!   cargo run -p index-runner
//!   cargo run -p index-runner -- --variant ai-bubble
//!   cargo run -p index-runner -- --date 2024-01-02 --dry-run

use anyhow::{Context, Result};
use archive_indexer::ArchiveIndexer;
use chrono::Utc;
use history_store::HistoryStore;
use index_runner::{load_signals, run, PipelineContext, RunnerConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use signal_normalizer::LexiconPolarity;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut runner = RunnerConfig::from_env().context("Invalid runner environment")?;
    let args: Vec<String> = std::env::args().collect();
    runner.apply_args(&args)?;

    let config = runner.index_config()?;
    let now = Utc::now();
    let today = runner.today(now);
    let last_updated = now
        .with_timezone(&runner.timezone)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let ctx = PipelineContext {
        archive: ArchiveIndexer::new(&runner.archive_dir, config.archive_prefix(), "json"),
        history: HistoryStore::new(runner.history_path(&config)),
        output_path: runner.output_path(&config),
        amplifier_history: runner.amplifier_history_path(&config).map(HistoryStore::new),
        config,
        today,
        site_url: runner.site_url.clone(),
        last_updated,
        dry_run: runner.dry_run,
    };

    let signals = load_signals(&runner.signals_path);
    let scorer = LexiconPolarity::default();
    let mut rng = match runner.backfill_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let outcome = run(&ctx, &signals, &scorer, &mut rng).map_err(|err| {
        tracing::error!(fatal = err.is_fatal(), "Index run failed: {}", err);
        err
    })?;

    tracing::info!(
        "SUCCESS: {} {}/100 ({}, {})",
        ctx.config.title,
        outcome.composite.final_score,
        outcome.composite.status_label,
        outcome.trend.description
    );
    println!("{}", outcome.payload.post_text);

    Ok(())
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "index_runner=info,history_store=info,archive_indexer=info,composite_index=info,signal_normalizer=warn",
            )
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}
