//! Basket-against-basket performance over a full window.
//!
//! Each leg's performance is its last close over its first close. A basket is
//! the weighted mean of its legs, and the gap between the long and the short
//! basket maps as `base + gap_pct * multiplier`.

use index_core::scale::clamp_score;
use index_core::{BasketChangeConfig, BasketLeg, Score, SubScore};
use std::collections::BTreeMap;
use tracing::warn;

/// `last / first` over the finite closes. Needs two closes and a positive first close.
pub fn leg_performance(closes: &[f64]) -> Option<f64> {
    let mut finite = closes.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    let last = finite.last()?;
    (first > 0.0).then(|| last / first)
}

/// Weighted mean performance of a basket. An empty basket is flat.
/// Returns the symbol that could not be measured on failure.
pub fn basket_performance<'a>(
    legs: &'a [BasketLeg],
    closes: &BTreeMap<String, Vec<f64>>,
) -> Result<f64, &'a str> {
    if legs.is_empty() {
        return Ok(1.0);
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for leg in legs {
        let performance = closes
            .get(&leg.symbol)
            .and_then(|series| leg_performance(series))
            .ok_or(leg.symbol.as_str())?;
        weighted += performance * leg.weight;
        total_weight += leg.weight;
    }
    Ok(weighted / total_weight)
}

pub fn score(cfg: &BasketChangeConfig, closes: &BTreeMap<String, Vec<f64>>, fallback: Score) -> SubScore {
    let baskets = basket_performance(&cfg.long, closes)
        .and_then(|long| basket_performance(&cfg.short, closes).map(|short| (long, short)));

    let (long, short) = match baskets {
        Ok(pair) => pair,
        Err(symbol) => {
            warn!(symbol, "Missing or unusable closes for basket leg");
            return crate::unavailable(fallback, &format!("need 2+ closes for {symbol}"));
        }
    };

    let gap_pct = (long - short) * 100.0;
    let evidence = if cfg.short.is_empty() {
        format!("{} {:+.1}% over the window", cfg.long_label, (long - 1.0) * 100.0)
    } else {
        format!(
            "{} {:+.1}% vs {} {:+.1}% (gap {:+.1} pts)",
            cfg.long_label,
            (long - 1.0) * 100.0,
            cfg.short_label,
            (short - 1.0) * 100.0,
            gap_pct
        )
    };

    SubScore::new(clamp_score(cfg.base + gap_pct * cfg.multiplier), evidence)
}
