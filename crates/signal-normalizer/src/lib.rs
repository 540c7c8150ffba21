use index_core::{Normalization, PolarityScorer, RawSignal, Score, SourceConfig, SubScore};
use tracing::{debug, warn};

pub mod basket;
pub mod divergence;
pub mod keywords;
pub mod lexical;
pub mod lexicon;
pub mod series;

pub use lexicon::LexiconPolarity;

/// Normalize one source's raw signal into a bounded sub-score.
///
/// This never fails: a missing measurement, a fetch failure or a signal of the
/// wrong shape all degrade to the source's configured fallback score with an
/// explicit "data unavailable" evidence string.
pub fn normalize(source: &SourceConfig, signal: &RawSignal, scorer: &dyn PolarityScorer) -> SubScore {
    let fallback = source.fallback_score;

    let sub_score = match (&source.normalization, signal) {
        (_, RawSignal::Unavailable { reason }) => {
            warn!(source = %source.name, %reason, "Source unavailable, using fallback score {}", fallback);
            unavailable(fallback, reason)
        }
        (Normalization::Divergence(cfg), RawSignal::PriceWindows { reference, subject }) => {
            divergence::score_windows(cfg, reference, subject, fallback)
        }
        (Normalization::Lexical(cfg), RawSignal::Headlines { titles }) => {
            lexical::scan(cfg, titles, scorer, fallback)
        }
        (Normalization::MeanDeviation(cfg), RawSignal::Series { values }) => {
            series::mean_deviation(cfg, values, fallback)
        }
        (Normalization::MeanRatio(cfg), RawSignal::Series { values }) => {
            series::mean_ratio(cfg, values, fallback)
        }
        (Normalization::KeywordShare(cfg), RawSignal::Headlines { titles }) => {
            keywords::share(cfg, titles)
        }
        (Normalization::KeywordCount(cfg), RawSignal::Headlines { titles }) => {
            keywords::count(cfg, titles)
        }
        (Normalization::Linear(cfg), RawSignal::Value { value }) => {
            series::linear(cfg, *value, fallback)
        }
        (Normalization::BasketChange(cfg), RawSignal::Closes { closes }) => {
            basket::score(cfg, closes, fallback)
        }
        (_, other) => {
            warn!(
                source = %source.name,
                kind = other.kind(),
                "Signal kind does not match the source's normalization"
            );
            unavailable(fallback, &format!("unexpected {} signal", other.kind()))
        }
    };

    debug!(source = %source.name, score = sub_score.value, "Normalized sub-score");
    sub_score
}

pub(crate) fn unavailable(fallback: Score, detail: &str) -> SubScore {
    SubScore::new(fallback, format!("Data unavailable: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_core::{Bar, IndexConfig, NeutralPolarity};

    #[test]
    fn unavailable_source_degrades_to_fallback() {
        let config = IndexConfig::taiwan_strait();
        let market = config.source("market").unwrap();

        let score = normalize(market, &RawSignal::unavailable("HTTP 503"), &NeutralPolarity);
        assert_eq!(score.value, 30);
        assert_eq!(score.evidence, "Data unavailable: HTTP 503");
    }

    #[test]
    fn mismatched_signal_kind_degrades_to_fallback() {
        let config = IndexConfig::taiwan_strait();
        let market = config.source("market").unwrap();
        let headlines = RawSignal::Headlines {
            titles: vec!["Jets cross median line".to_string()],
        };

        let score = normalize(market, &headlines, &NeutralPolarity);
        assert_eq!(score.value, 30);
        assert!(score.evidence.contains("unexpected headlines signal"));
    }

    #[test]
    fn dispatches_to_divergence_mapping() {
        let config = IndexConfig::taiwan_strait();
        let market = config.source("market").unwrap();
        let signal = RawSignal::PriceWindows {
            reference: vec![Bar::new(100.0, 100.0), Bar::new(100.0, 100.0)],
            subject: vec![Bar::new(100.0, 100.0), Bar::new(100.0, 87.5)],
        };

        // SPY flat, TSM -12.5% => divergence 0.125 => 30 + 50
        let score = normalize(market, &signal, &NeutralPolarity);
        assert_eq!(score.value, 80);
    }

    #[test]
    fn dispatches_to_basket_change() {
        let config = IndexConfig::supply_chain();
        let freight = config.source("freight").unwrap();
        let signal = RawSignal::Closes {
            closes: [
                ("BDRY".to_string(), vec![100.0, 120.0]),
                ("USO".to_string(), vec![100.0, 100.0]),
            ]
            .into_iter()
            .collect(),
        };

        // 50 + 20 * 0.6
        assert_eq!(normalize(freight, &signal, &NeutralPolarity).value, 62);

        let wrong_kind = RawSignal::Series { values: vec![1.0, 2.0] };
        let score = normalize(freight, &wrong_kind, &NeutralPolarity);
        assert_eq!(score.value, 50);
        assert!(score.evidence.contains("unexpected series signal"));
    }

    #[test]
    fn every_preset_source_stays_in_range_for_extreme_inputs() {
        let extremes = [
            RawSignal::PriceWindows {
                reference: vec![Bar::new(1.0, 1.0), Bar::new(1.0, 1000.0)],
                subject: vec![Bar::new(1.0, 1.0), Bar::new(1000.0, 1.0)],
            },
            RawSignal::Series {
                values: vec![1.0, 1.0, 1.0e9],
            },
            RawSignal::Headlines {
                titles: vec!["war war missile blockade invasion bubble crash strike".to_string(); 40],
            },
            RawSignal::Closes {
                closes: ["GLD", "BTC-USD", "TLT", "UUP", "SPY", "VNQ", "DBA", "XLP", "BDRY", "USO"]
                    .iter()
                    .enumerate()
                    .map(|(i, symbol)| (symbol.to_string(), vec![1.0, 1.0e9_f64.powi(i as i32 % 2)]))
                    .collect(),
            },
            RawSignal::Value { value: -1.0e9 },
            RawSignal::Value { value: 1.0e9 },
        ];

        for id in IndexConfig::preset_ids() {
            let config = IndexConfig::preset(id).unwrap();
            for source in &config.sources {
                for signal in &extremes {
                    let score = normalize(source, signal, &LexiconPolarity::default());
                    assert!(score.value <= 100, "{} produced {}", source.name, score.value);
                }
            }
        }
    }
}
