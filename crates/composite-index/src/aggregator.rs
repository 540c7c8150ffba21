use crate::bands::{classify, UNCLASSIFIED_COLOR, UNCLASSIFIED_LABEL};
use index_core::scale::clamp_score;
use index_core::{AmplifierConfig, CompositeResult, IndexConfig, Score, SubScore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Per-source contributions behind one weighted score.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedBreakdown {
    pub contributions: Vec<(String, f64)>,
    pub total: f64,
}

/// Weighted sum of sub-scores over the configured sources.
pub fn weighted_score(config: &IndexConfig, sub_scores: &BTreeMap<String, SubScore>) -> WeightedBreakdown {
    let contributions: Vec<(String, f64)> = config
        .sources
        .iter()
        .map(|source| {
            let value = sub_scores
                .get(&source.name)
                .map_or(source.fallback_score, |s| s.value);
            (source.name.clone(), source.weight * value as f64)
        })
        .collect();

    let total = contributions.iter().map(|(_, c)| c).sum::<f64>();
    WeightedBreakdown { contributions, total }
}

/// `1 + other / divisor`, using the configured fallback when the other index has no reading.
pub fn amplifier_multiplier(amplifier: &AmplifierConfig, other_score: Option<Score>) -> f64 {
    let other = other_score.unwrap_or_else(|| {
        warn!(
            source_index = %amplifier.source_index,
            "No reading for amplifying index, using fallback {}",
            amplifier.fallback_score
        );
        amplifier.fallback_score
    });
    1.0 + other as f64 / amplifier.divisor
}

/// Combine sub-scores into the classified composite result.
///
/// Sources missing from `sub_scores` contribute their fallback score and are
/// reported with an "unavailable" evidence string. Scores for names the
/// config does not know are ignored.
pub fn aggregate(
    config: &IndexConfig,
    mut sub_scores: BTreeMap<String, SubScore>,
    amplifier_input: Option<Score>,
) -> CompositeResult {
    for source in &config.sources {
        if !sub_scores.contains_key(&source.name) {
            warn!(
                index = %config.id,
                source = %source.name,
                "Missing sub-score, using fallback {}",
                source.fallback_score
            );
            sub_scores.insert(
                source.name.clone(),
                SubScore::new(source.fallback_score, "Data unavailable: no reading this run"),
            );
        }
    }
    sub_scores.retain(|name, _| {
        let known = config.source(name).is_some();
        if !known {
            debug!(index = %config.id, source = %name, "Ignoring sub-score for unknown source");
        }
        known
    });

    let breakdown = weighted_score(config, &sub_scores);
    debug!(index = %config.id, contributions = ?breakdown.contributions, "Weighted contributions");
    let base_score = clamp_score(breakdown.total);

    let amplifier = config
        .amplifier
        .as_ref()
        .map(|amp| amplifier_multiplier(amp, amplifier_input));
    let final_score = match amplifier {
        Some(multiplier) => clamp_score(breakdown.total * multiplier),
        None => base_score,
    };

    let (status_label, status_color, status_summary) = match classify(&config.bands, final_score) {
        Some(band) => (band.label.clone(), band.color.clone(), band.summary.clone()),
        None => (
            UNCLASSIFIED_LABEL.to_string(),
            UNCLASSIFIED_COLOR.to_string(),
            String::new(),
        ),
    };

    info!(
        index = %config.id,
        base_score,
        final_score,
        amplifier = ?amplifier,
        status = %status_label,
        "Composite score computed"
    );

    CompositeResult {
        final_score,
        base_score,
        amplifier,
        status_label,
        status_color,
        status_summary,
        sub_scores,
    }
}
