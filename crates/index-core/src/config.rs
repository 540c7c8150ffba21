use crate::error::{IndexError, Result};
use crate::types::Score;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Which part of a price window a percent change is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeWindow {
    /// Open to close of the most recent bar
    LastSession,
    /// Open of the first bar to close of the last bar
    FullWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceConfig {
    pub reference_label: String,
    pub subject_label: String,
    /// Score at zero divergence
    pub base: f64,
    /// Points per unit of fractional divergence (0.01 divergence * 400 = 4 points)
    pub multiplier: f64,
    pub window: ChangeWindow,
    #[serde(default)]
    pub callout: Option<DivergenceCallout>,
}

/// Fixed evidence wording chosen by the size of the divergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceCallout {
    /// Divergence in points above which `notable` is reported
    pub notable_pts: f64,
    pub notable: String,
    pub calm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    pub warning_terms: Vec<String>,
    pub max_headlines: usize,
    pub points_per_hit: f64,
    pub sentiment_weight: f64,
    pub keyword_weight: f64,
    pub max_evidence: usize,
    pub no_signal_evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanDeviationConfig {
    pub label: String,
    pub base: f64,
    /// Points per percent of deviation from the window mean
    pub multiplier: f64,
    /// Deviation (in percent) above which the evidence calls out the move
    pub notable_pct: f64,
    pub calm_evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanRatioConfig {
    pub label: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordShareConfig {
    pub terms: Vec<String>,
    /// Denominator of the share as well as the number of headlines scanned
    pub max_headlines: usize,
    pub amplification: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCountConfig {
    pub terms: Vec<String>,
    pub max_headlines: usize,
    pub points_per_hit: f64,
    pub placeholder_evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    pub label: String,
    pub offset: f64,
    pub multiplier: f64,
}

/// One instrument of a basket and its share of the basket's weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketLeg {
    pub symbol: String,
    #[serde(default = "default_leg_weight")]
    pub weight: f64,
}

fn default_leg_weight() -> f64 {
    1.0
}

/// Weighted mean of each leg's `last / first` close, long basket against short.
/// An empty short basket counts as flat (1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketChangeConfig {
    pub long_label: String,
    pub long: Vec<BasketLeg>,
    pub short_label: String,
    #[serde(default)]
    pub short: Vec<BasketLeg>,
    pub base: f64,
    /// Points per percentage point of gap between the baskets
    pub multiplier: f64,
}

/// How a source's raw signal becomes a 0-100 sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Normalization {
    Divergence(DivergenceConfig),
    Lexical(LexicalConfig),
    MeanDeviation(MeanDeviationConfig),
    MeanRatio(MeanRatioConfig),
    KeywordShare(KeywordShareConfig),
    KeywordCount(KeywordCountConfig),
    Linear(LinearConfig),
    BasketChange(BasketChangeConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Key in the signals input and in `CompositeResult::sub_scores`
    pub name: String,
    pub label: String,
    pub weight: f64,
    /// Neutral score used whenever the source cannot be measured
    pub fallback_score: Score,
    pub normalization: Normalization,
}

/// One bucket of the status classifier. `upper` is exclusive; the last band has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBand {
    pub upper: Option<Score>,
    pub label: String,
    pub color: String,
    pub summary: String,
}

impl StatusBand {
    fn new(upper: Option<Score>, label: &str, color: &str, summary: &str) -> Self {
        Self {
            upper,
            label: label.to_string(),
            color: color.to_string(),
            summary: summary.to_string(),
        }
    }
}

/// Scales the weighted score by another index's latest reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplifierConfig {
    pub source_index: String,
    pub divisor: f64,
    pub fallback_score: Score,
}

/// Synthetic history used when persisted history is too short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillPolicy {
    pub min_entries: usize,
    pub window: usize,
    pub low: Score,
    pub high: Score,
}

impl Default for BackfillPolicy {
    fn default() -> Self {
        Self {
            min_entries: 5,
            window: 30,
            low: 25,
            high: 45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub id: String,
    pub title: String,
    pub sources: Vec<SourceConfig>,
    pub bands: Vec<StatusBand>,
    #[serde(default)]
    pub amplifier: Option<AmplifierConfig>,
    #[serde(default)]
    pub backfill: Option<BackfillPolicy>,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Archive file prefix; `{id}-report-` when unset
    #[serde(default)]
    pub archive_prefix: Option<String>,
}

fn default_history_window() -> usize {
    30
}

impl IndexConfig {
    /// Look up a built-in index variant by id.
    pub fn preset(id: &str) -> Option<Self> {
        match id {
            "taiwan-strait" => Some(Self::taiwan_strait()),
            "ai-bubble" => Some(Self::ai_bubble()),
            "middle-east" => Some(Self::middle_east()),
            "fiat" => Some(Self::fiat()),
            "k-shape" => Some(Self::k_shape()),
            "supply-chain" => Some(Self::supply_chain()),
            _ => None,
        }
    }

    pub fn preset_ids() -> &'static [&'static str] {
        &[
            "taiwan-strait",
            "ai-bubble",
            "middle-east",
            "fiat",
            "k-shape",
            "supply-chain",
        ]
    }

    pub fn archive_prefix(&self) -> String {
        self.archive_prefix
            .clone()
            .unwrap_or_else(|| format!("{}-report-", self.id))
    }

    /// Load and validate a variant from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Two-source index: semiconductor market divergence and conflict headlines.
    pub fn taiwan_strait() -> Self {
        Self {
            id: "taiwan-strait".to_string(),
            title: "Taiwan Strait Risk Index".to_string(),
            sources: vec![
                SourceConfig {
                    name: "market".to_string(),
                    label: "Market Divergence".to_string(),
                    weight: 0.5,
                    fallback_score: 30,
                    normalization: Normalization::Divergence(DivergenceConfig {
                        reference_label: "SPY".to_string(),
                        subject_label: "TSM".to_string(),
                        base: 30.0,
                        multiplier: 400.0,
                        window: ChangeWindow::LastSession,
                        callout: None,
                    }),
                },
                SourceConfig {
                    name: "conflict".to_string(),
                    label: "Conflict Signals".to_string(),
                    weight: 0.5,
                    fallback_score: 30,
                    normalization: Normalization::Lexical(LexicalConfig {
                        warning_terms: terms(&[
                            "invasion", "jets", "incursion", "adiz", "war", "missile", "blockade",
                        ]),
                        max_headlines: 15,
                        points_per_hit: 5.0,
                        sentiment_weight: 0.6,
                        keyword_weight: 0.4,
                        max_evidence: 3,
                        no_signal_evidence: "No escalation keywords in today's headlines."
                            .to_string(),
                    }),
                },
            ],
            bands: vec![
                StatusBand::new(
                    Some(30),
                    "Low Tension",
                    "#28a745",
                    "Markets are stable and rhetorical noise is low.",
                ),
                StatusBand::new(
                    Some(60),
                    "Elevated",
                    "#ffc107",
                    "Increased diplomatic friction or minor market divergence detected.",
                ),
                StatusBand::new(
                    None,
                    "High Risk",
                    "#dc3545",
                    "Significant market volatility or aggressive military signaling detected.",
                ),
            ],
            amplifier: None,
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    /// Four-source valuation index, amplified by Taiwan Strait tension.
    pub fn ai_bubble() -> Self {
        Self {
            id: "ai-bubble".to_string(),
            title: "AI Bubble Index".to_string(),
            sources: vec![
                SourceConfig {
                    name: "valuation".to_string(),
                    label: "Mag 7 Forward P/E".to_string(),
                    weight: 0.4,
                    fallback_score: 50,
                    normalization: Normalization::Linear(LinearConfig {
                        label: "Average forward P/E".to_string(),
                        offset: 20.0,
                        multiplier: 2.5,
                    }),
                },
                SourceConfig {
                    name: "capex".to_string(),
                    label: "Capex Momentum".to_string(),
                    weight: 0.3,
                    fallback_score: 50,
                    normalization: Normalization::MeanRatio(MeanRatioConfig {
                        label: "NVDA volume".to_string(),
                        multiplier: 50.0,
                    }),
                },
                SourceConfig {
                    name: "sentiment".to_string(),
                    label: "Media Sentiment".to_string(),
                    weight: 0.2,
                    fallback_score: 50,
                    normalization: Normalization::KeywordShare(KeywordShareConfig {
                        terms: terms(&["bubble", "crash"]),
                        max_headlines: 15,
                        amplification: 2.0,
                    }),
                },
                SourceConfig {
                    name: "adoption".to_string(),
                    label: "Adoption Velocity".to_string(),
                    weight: 0.1,
                    fallback_score: 65,
                    normalization: Normalization::Linear(LinearConfig {
                        label: "Enterprise adoption level".to_string(),
                        offset: 0.0,
                        multiplier: 1.0,
                    }),
                },
            ],
            bands: vec![
                StatusBand::new(
                    Some(40),
                    "HEALTHY GROWTH",
                    "#10b981",
                    "Valuations are supported by earnings and adoption.",
                ),
                StatusBand::new(
                    Some(65),
                    "ELEVATED VALUATION",
                    "#f59e0b",
                    "Prices are running ahead of fundamentals.",
                ),
                StatusBand::new(
                    Some(85),
                    "SPECULATIVE MANIA",
                    "#f97316",
                    "Momentum and media hype dominate price action.",
                ),
                StatusBand::new(
                    None,
                    "CRITICAL INSTABILITY",
                    "#ef4444",
                    "Valuation stretch combined with geopolitical stress.",
                ),
            ],
            amplifier: Some(AmplifierConfig {
                source_index: "taiwan-strait".to_string(),
                divisor: 200.0,
                fallback_score: 30,
            }),
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    /// Three-source regional war risk index.
    pub fn middle_east() -> Self {
        Self {
            id: "middle-east".to_string(),
            title: "Middle East War Risk Index".to_string(),
            sources: vec![
                SourceConfig {
                    name: "energy".to_string(),
                    label: "Energy Shock".to_string(),
                    weight: 0.4,
                    fallback_score: 50,
                    normalization: Normalization::MeanDeviation(MeanDeviationConfig {
                        label: "Brent Crude".to_string(),
                        base: 50.0,
                        multiplier: 5.0,
                        notable_pct: 2.0,
                        calm_evidence: "Oil markets absorbing kinetic action.".to_string(),
                    }),
                },
                SourceConfig {
                    name: "defense".to_string(),
                    label: "Defense Premium".to_string(),
                    weight: 0.3,
                    fallback_score: 50,
                    normalization: Normalization::Divergence(DivergenceConfig {
                        reference_label: "ITA".to_string(),
                        subject_label: "SPY".to_string(),
                        base: 50.0,
                        multiplier: 1000.0,
                        window: ChangeWindow::FullWindow,
                        callout: Some(DivergenceCallout {
                            notable_pts: 1.0,
                            notable: "Capital rotating into defense contractors.".to_string(),
                            calm: "Normal sector variance.".to_string(),
                        }),
                    }),
                },
                SourceConfig {
                    name: "osint".to_string(),
                    label: "Regional Contagion".to_string(),
                    weight: 0.3,
                    fallback_score: 50,
                    normalization: Normalization::KeywordCount(KeywordCountConfig {
                        terms: terms(&[
                            "strike", "missile", "bomb", "base", "khamenei", "retaliation", "uae",
                            "bahrain", "qatar",
                        ]),
                        max_headlines: 25,
                        points_per_hit: 4.0,
                        placeholder_evidence: "Awaiting regional OSINT data.".to_string(),
                    }),
                },
            ],
            bands: vec![
                StatusBand::new(
                    Some(56),
                    "CONTAINED CONFLICT",
                    "#10b981",
                    "Hostilities remain localized with limited market spillover.",
                ),
                StatusBand::new(
                    Some(76),
                    "ELEVATED CONTAGION",
                    "#f59e0b",
                    "Energy and defense markets are pricing regional spread.",
                ),
                StatusBand::new(
                    None,
                    "CRITICAL ESCALATION",
                    "#ef4444",
                    "Direct strikes and energy shock signal a widening war.",
                ),
            ],
            amplifier: None,
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    /// Hard assets against fiat instruments over the window.
    pub fn fiat() -> Self {
        Self {
            id: "fiat".to_string(),
            title: "Fiat Sovereignty Index".to_string(),
            sources: vec![SourceConfig {
                name: "flight".to_string(),
                label: "Hard Asset Flight".to_string(),
                weight: 1.0,
                fallback_score: 50,
                normalization: Normalization::BasketChange(BasketChangeConfig {
                    long_label: "Hard assets".to_string(),
                    long: legs(&[("GLD", 1.0), ("BTC-USD", 1.0)]),
                    short_label: "Fiat assets".to_string(),
                    short: legs(&[("TLT", 1.0), ("UUP", 1.0)]),
                    base: 50.0,
                    multiplier: 1.5,
                }),
            }],
            bands: vec![
                StatusBand::new(
                    Some(56),
                    "SYSTEM CONFIDENCE HIGH",
                    "#10b981",
                    "Bonds and the dollar are holding their value against hard assets.",
                ),
                StatusBand::new(
                    Some(76),
                    "EROSION OF TRUST",
                    "#f59e0b",
                    "Capital is drifting from fiat instruments into gold and bitcoin.",
                ),
                StatusBand::new(
                    None,
                    "CAPITAL FLIGHT",
                    "#ef4444",
                    "Hard assets are sharply outrunning treasuries and the dollar.",
                ),
            ],
            amplifier: None,
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    /// Asset owners against essentials over the window.
    pub fn k_shape() -> Self {
        Self {
            id: "k-shape".to_string(),
            title: "K-Shape Wealth Fracture Index".to_string(),
            sources: vec![SourceConfig {
                name: "gap".to_string(),
                label: "Wealth Gap".to_string(),
                weight: 1.0,
                fallback_score: 50,
                normalization: Normalization::BasketChange(BasketChangeConfig {
                    long_label: "Assets".to_string(),
                    long: legs(&[("SPY", 1.0), ("VNQ", 1.0)]),
                    short_label: "Essentials".to_string(),
                    short: legs(&[("DBA", 1.0), ("XLP", 1.0)]),
                    base: 50.0,
                    multiplier: 2.5,
                }),
            }],
            bands: vec![
                StatusBand::new(
                    Some(35),
                    "WEALTH COMPRESSION",
                    "#3b82f6",
                    "Essentials are outpacing asset prices.",
                ),
                StatusBand::new(
                    Some(66),
                    "STABLE TREND",
                    "#10b981",
                    "Asset and essentials prices are moving together.",
                ),
                StatusBand::new(
                    None,
                    "WIDENING GAP",
                    "#ef4444",
                    "Asset owners are pulling away from the cost of living.",
                ),
            ],
            amplifier: None,
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    /// Dry bulk shipping and oil over the window, weighted 0.6/0.4.
    pub fn supply_chain() -> Self {
        Self {
            id: "supply-chain".to_string(),
            title: "Supply Chain Stress Index".to_string(),
            sources: vec![SourceConfig {
                name: "freight".to_string(),
                label: "Shipping and Energy".to_string(),
                weight: 1.0,
                fallback_score: 50,
                normalization: Normalization::BasketChange(BasketChangeConfig {
                    long_label: "Shipping and energy".to_string(),
                    long: legs(&[("BDRY", 0.6), ("USO", 0.4)]),
                    short_label: "Flat baseline".to_string(),
                    short: Vec::new(),
                    base: 50.0,
                    multiplier: 1.0,
                }),
            }],
            bands: vec![
                StatusBand::new(
                    Some(56),
                    "SUPPLY FLOWING",
                    "#10b981",
                    "Freight and fuel costs are steady.",
                ),
                StatusBand::new(
                    Some(71),
                    "ELEVATED FRICTION",
                    "#f59e0b",
                    "Shipping or energy costs are climbing.",
                ),
                StatusBand::new(
                    None,
                    "SEVERE BOTTLENECKS",
                    "#ef4444",
                    "Freight and fuel are both under heavy stress.",
                ),
            ],
            amplifier: None,
            backfill: Some(BackfillPolicy::default()),
            history_window: default_history_window(),
            archive_prefix: None,
        }
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Check weights, bands and policies before the config is used for a run.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(invalid(format!("{}: no sources configured", self.id)));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(invalid(format!("{}: duplicate source '{}'", self.id, source.name)));
            }
            if !(0.0..=1.0).contains(&source.weight) {
                return Err(invalid(format!(
                    "{}: weight {} for '{}' is outside [0, 1]",
                    self.id, source.weight, source.name
                )));
            }
            if source.fallback_score > crate::scale::MAX_SCORE {
                return Err(invalid(format!(
                    "{}: fallback score for '{}' exceeds 100",
                    self.id, source.name
                )));
            }
        }

        let total: f64 = self.sources.iter().map(|s| s.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(format!(
                "{}: weights sum to {total:.4}, expected 1.0",
                self.id
            )));
        }

        self.validate_bands()?;

        for source in &self.sources {
            if let Normalization::BasketChange(basket) = &source.normalization {
                let bad_weight = basket
                    .long
                    .iter()
                    .chain(&basket.short)
                    .any(|leg| !(leg.weight > 0.0 && leg.weight.is_finite()));
                if basket.long.is_empty() || bad_weight {
                    return Err(invalid(format!(
                        "{}: basket for '{}' needs a long leg and positive leg weights",
                        self.id, source.name
                    )));
                }
            }
        }

        if let Some(policy) = &self.backfill {
            if policy.window == 0 || policy.min_entries > policy.window {
                return Err(invalid(format!(
                    "{}: backfill needs 0 < min_entries <= window",
                    self.id
                )));
            }
            if policy.low > policy.high || policy.high > crate::scale::MAX_SCORE {
                return Err(invalid(format!(
                    "{}: backfill range {}..={} is not within [0, 100]",
                    self.id, policy.low, policy.high
                )));
            }
        }

        if let Some(amplifier) = &self.amplifier {
            if amplifier.divisor <= 0.0 || !amplifier.divisor.is_finite() {
                return Err(invalid(format!("{}: amplifier divisor must be positive", self.id)));
            }
        }

        if self.history_window == 0 {
            return Err(invalid(format!("{}: history window must be positive", self.id)));
        }

        Ok(())
    }

    /// Bands must partition [0, 100]: ascending exclusive bounds, open-ended last band.
    fn validate_bands(&self) -> Result<()> {
        let Some((last, rest)) = self.bands.split_last() else {
            return Err(invalid(format!("{}: no status bands configured", self.id)));
        };

        if last.upper.is_some() {
            return Err(invalid(format!(
                "{}: last status band '{}' must be open-ended",
                self.id, last.label
            )));
        }

        let mut previous: Score = 0;
        for band in rest {
            let Some(upper) = band.upper else {
                return Err(invalid(format!(
                    "{}: only the last status band may be open-ended ('{}')",
                    self.id, band.label
                )));
            };
            if upper <= previous || upper > crate::scale::MAX_SCORE {
                return Err(invalid(format!(
                    "{}: status band '{}' bound {} is not ascending within (0, 100]",
                    self.id, band.label, upper
                )));
            }
            previous = upper;
        }

        Ok(())
    }
}

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn legs(pairs: &[(&str, f64)]) -> Vec<BasketLeg> {
    pairs
        .iter()
        .map(|(symbol, weight)| BasketLeg {
            symbol: symbol.to_string(),
            weight: *weight,
        })
        .collect()
}

fn invalid(message: String) -> IndexError {
    IndexError::InvalidConfig(message)
}
