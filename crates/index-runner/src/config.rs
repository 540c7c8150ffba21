use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use index_core::IndexConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    // Which index to build
    pub variant: String,
    pub config_path: Option<PathBuf>, // JSON file overriding the preset

    // Inputs and outputs. Unset paths are derived from the index id.
    pub signals_path: PathBuf,
    pub history_path: Option<PathBuf>,
    pub archive_dir: PathBuf,
    pub output_path: Option<PathBuf>,
    pub amplifier_history_path: Option<PathBuf>,

    // Calendar
    pub timezone: Tz, // "today" is computed here
    pub date: Option<NaiveDate>,

    pub site_url: String,
    pub backfill_seed: Option<u64>,
    pub dry_run: bool,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable lookup. Unset variables take their defaults.
    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timezone_name = get("RISK_TIMEZONE").unwrap_or_else(|| "Australia/Brisbane".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid RISK_TIMEZONE '{}': {}", timezone_name, e))?;

        let backfill_seed = get("RISK_BACKFILL_SEED")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .context("RISK_BACKFILL_SEED must be an unsigned integer")?;

        Ok(Self {
            variant: get("RISK_INDEX_VARIANT").unwrap_or_else(|| "taiwan-strait".to_string()),
            config_path: get("RISK_INDEX_CONFIG").map(PathBuf::from),
            signals_path: get("RISK_SIGNALS_PATH")
                .unwrap_or_else(|| "signals.json".to_string())
                .into(),
            history_path: get("RISK_HISTORY_PATH").map(PathBuf::from),
            archive_dir: get("RISK_ARCHIVE_DIR")
                .unwrap_or_else(|| "archive".to_string())
                .into(),
            output_path: get("RISK_OUTPUT_PATH").map(PathBuf::from),
            amplifier_history_path: get("RISK_AMPLIFIER_HISTORY_PATH").map(PathBuf::from),
            timezone,
            date: None,
            site_url: get("RISK_SITE_URL")
                .unwrap_or_else(|| "https://taiwanstraittracker.com".to_string()),
            backfill_seed,
            dry_run: false,
        })
    }

    /// Apply `--date YYYY-MM-DD`, `--dry-run` and `--variant NAME`.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if args.iter().any(|a| a == "--dry-run") {
            self.dry_run = true;
        }

        if let Some(variant) = flag_value(args, "--variant")? {
            self.variant = variant.to_string();
        }

        if let Some(raw) = flag_value(args, "--date")? {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("--date expects YYYY-MM-DD, got '{raw}'"))?;
            self.date = Some(date);
        }

        Ok(())
    }

    /// The configured JSON file if set, otherwise the named preset.
    pub fn index_config(&self) -> Result<IndexConfig> {
        let config = match &self.config_path {
            Some(path) => IndexConfig::from_json_file(path)
                .with_context(|| format!("Failed to load index config {}", path.display()))?,
            None => IndexConfig::preset(&self.variant).with_context(|| {
                format!(
                    "Unknown index variant '{}' (expected one of: {})",
                    self.variant,
                    IndexConfig::preset_ids().join(", ")
                )
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// `RISK_HISTORY_PATH`, else `{id}-history.json`.
    pub fn history_path(&self, config: &IndexConfig) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| default_history_path(&config.id))
    }

    /// `RISK_OUTPUT_PATH`, else `{id}-dashboard.json`.
    pub fn output_path(&self, config: &IndexConfig) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}-dashboard.json", config.id)))
    }

    /// History of the amplifying index: `RISK_AMPLIFIER_HISTORY_PATH`, else that
    /// index's default history path. `None` when the index has no amplifier.
    pub fn amplifier_history_path(&self, config: &IndexConfig) -> Option<PathBuf> {
        let amplifier = config.amplifier.as_ref()?;
        Some(
            self.amplifier_history_path
                .clone()
                .unwrap_or_else(|| default_history_path(&amplifier.source_index)),
        )
    }

    /// The run date: `--date` if given, else the current day in the configured zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date
            .unwrap_or_else(|| now.with_timezone(&self.timezone).date_naive())
    }
}

fn default_history_path(index_id: &str) -> PathBuf {
    PathBuf::from(format!("{index_id}-history.json"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .filter(|v| !v.starts_with("--"))
            .map(|v| Some(v.as_str()))
            .with_context(|| format!("{flag} requires a value")),
        None => Ok(None),
    }
}
