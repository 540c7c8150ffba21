//! Lexical scan of news headlines: warning-term hits blended with mean polarity.

use crate::keywords::{clean_headline, matched_terms};
use index_core::scale::clamp_score;
use index_core::{LexicalConfig, PolarityScorer, Score, SubScore};

/// Intermediate values of one scan, kept for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalBreakdown {
    pub headlines_scanned: usize,
    pub keyword_hits: usize,
    pub avg_sentiment: f64,
    pub sentiment_risk: f64,
    pub keyword_risk: f64,
    pub total: f64,
    pub flagged: Vec<String>,
}

/// Returns `None` for an empty headline set.
pub fn analyze(
    cfg: &LexicalConfig,
    headlines: &[String],
    scorer: &dyn PolarityScorer,
) -> Option<LexicalBreakdown> {
    let scanned: Vec<&String> = headlines.iter().take(cfg.max_headlines).collect();
    if scanned.is_empty() {
        return None;
    }

    let mut keyword_hits = 0;
    let mut polarity_sum = 0.0;
    let mut flagged = Vec::new();

    for headline in &scanned {
        let hits = matched_terms(headline, &cfg.warning_terms);
        keyword_hits += hits;
        if hits > 0 && flagged.len() < cfg.max_evidence {
            flagged.push(clean_headline(headline));
        }
        polarity_sum += scorer.polarity(headline).clamp(-1.0, 1.0);
    }

    let avg_sentiment = polarity_sum / scanned.len() as f64;
    let sentiment_risk = 50.0 - avg_sentiment * 50.0;
    let keyword_risk = keyword_hits as f64 * cfg.points_per_hit;
    let total = sentiment_risk * cfg.sentiment_weight + keyword_risk * cfg.keyword_weight;

    Some(LexicalBreakdown {
        headlines_scanned: scanned.len(),
        keyword_hits,
        avg_sentiment,
        sentiment_risk,
        keyword_risk,
        total,
        flagged,
    })
}

pub fn scan(
    cfg: &LexicalConfig,
    headlines: &[String],
    scorer: &dyn PolarityScorer,
    fallback: Score,
) -> SubScore {
    let Some(breakdown) = analyze(cfg, headlines, scorer) else {
        tracing::warn!("No headlines to scan, using fallback score {}", fallback);
        return SubScore::new(fallback, String::new());
    };

    tracing::debug!(
        headlines = breakdown.headlines_scanned,
        keyword_hits = breakdown.keyword_hits,
        avg_sentiment = breakdown.avg_sentiment,
        "Lexical scan complete"
    );

    let evidence = if breakdown.flagged.is_empty() {
        cfg.no_signal_evidence.clone()
    } else {
        breakdown.flagged.join(" | ")
    };

    SubScore::new(clamp_score(breakdown.total), evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LexiconPolarity;
    use approx::assert_relative_eq;
    use index_core::{IndexConfig, NeutralPolarity, Normalization};

    fn conflict_config() -> LexicalConfig {
        match IndexConfig::taiwan_strait().source("conflict").unwrap().normalization.clone() {
            Normalization::Lexical(cfg) => cfg,
            other => panic!("unexpected normalization {other:?}"),
        }
    }

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct FixedPolarity(f64);

    impl PolarityScorer for FixedPolarity {
        fn polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn empty_input_falls_back_with_empty_evidence() {
        let score = scan(&conflict_config(), &[], &NeutralPolarity, 30);
        assert_eq!(score.value, 30);
        assert_eq!(score.evidence, "");
    }

    #[test]
    fn neutral_headlines_without_terms_score_thirty() {
        let cfg = conflict_config();
        let headlines = titles(&["Taipei hosts trade fair", "Typhoon season begins"]);

        let breakdown = analyze(&cfg, &headlines, &NeutralPolarity).unwrap();
        assert_relative_eq!(breakdown.sentiment_risk, 50.0);
        assert_relative_eq!(breakdown.keyword_risk, 0.0);
        assert_relative_eq!(breakdown.total, 30.0);

        let score = scan(&cfg, &headlines, &NeutralPolarity, 30);
        assert_eq!(score.value, 30);
        assert_eq!(score.evidence, cfg.no_signal_evidence);
    }

    #[test]
    fn keyword_hits_add_fixed_points() {
        let cfg = conflict_config();
        let headlines = titles(&["Jets enter ADIZ - Reuters", "Markets open"]);

        let breakdown = analyze(&cfg, &headlines, &NeutralPolarity).unwrap();
        assert_eq!(breakdown.keyword_hits, 2);
        // 50 * 0.6 + 10 * 0.4
        assert_eq!(scan(&cfg, &headlines, &NeutralPolarity, 30).value, 34);
    }

    #[test]
    fn negative_sentiment_raises_risk() {
        let cfg = conflict_config();
        let headlines = titles(&["Headline one", "Headline two"]);
        // 50 - (-1 * 50) = 100, * 0.6 = 60
        assert_eq!(scan(&cfg, &headlines, &FixedPolarity(-1.0), 30).value, 60);
        // 50 - (1 * 50) = 0
        assert_eq!(scan(&cfg, &headlines, &FixedPolarity(1.0), 30).value, 0);
    }

    #[test]
    fn evidence_keeps_first_three_matches_in_order() {
        let cfg = conflict_config();
        let headlines = titles(&[
            "Missile test over strait - AP",
            "Chip exports climb",
            "Blockade drill announced - Reuters",
            "Jets scrambled again",
            "War games extend - BBC",
        ]);

        let score = scan(&cfg, &headlines, &NeutralPolarity, 30);
        assert_eq!(
            score.evidence,
            "Missile test over strait | Blockade drill announced | Jets scrambled again"
        );
    }

    #[test]
    fn only_the_most_recent_headlines_are_scanned() {
        let cfg = conflict_config();
        let mut headlines = titles(&["Calm day in Taipei"; 15]);
        headlines.push("Invasion fears".to_string());

        let breakdown = analyze(&cfg, &headlines, &NeutralPolarity).unwrap();
        assert_eq!(breakdown.headlines_scanned, 15);
        assert_eq!(breakdown.keyword_hits, 0);
    }

    #[test]
    fn saturates_at_hundred() {
        let cfg = conflict_config();
        let headlines = titles(&["Invasion war missile blockade jets incursion adiz"; 15]);
        let score = scan(&cfg, &headlines, &LexiconPolarity::default(), 30);
        assert_eq!(score.value, 100);
    }
}
