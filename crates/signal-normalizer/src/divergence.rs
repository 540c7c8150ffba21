//! Divergence-to-score mapping for market-style signals.
//!
//! `divergence = reference_change - subject_change`, mapped linearly as
//! `base + divergence * multiplier`. Zero divergence sits exactly on the base
//! score; only outsized divergence reaches either end of the scale.

use index_core::scale::{clamp_score, fractional_change};
use index_core::{Bar, ChangeWindow, DivergenceConfig, Score, SubScore};

/// Fractional change over the window. Needs at least two bars.
pub fn percent_change(bars: &[Bar], window: ChangeWindow) -> Option<f64> {
    if bars.len() < 2 {
        return None;
    }
    let first = bars.first()?;
    let last = bars.last()?;
    match window {
        ChangeWindow::LastSession => fractional_change(last.open, last.close),
        ChangeWindow::FullWindow => fractional_change(first.open, last.close),
    }
}

pub fn divergence_score(divergence: f64, base: f64, multiplier: f64) -> Score {
    clamp_score(base + divergence * multiplier)
}

/// Score two already-computed fractional changes.
pub fn score_changes(cfg: &DivergenceConfig, reference_change: f64, subject_change: f64) -> SubScore {
    let divergence = reference_change - subject_change;
    let evidence = match &cfg.callout {
        Some(callout) if divergence * 100.0 > callout.notable_pts => callout.notable.clone(),
        Some(callout) => callout.calm.clone(),
        None => format!(
            "{} {:+.2}% vs {} {:+.2}% (divergence {:+.2} pts)",
            cfg.reference_label,
            reference_change * 100.0,
            cfg.subject_label,
            subject_change * 100.0,
            divergence * 100.0
        ),
    };
    SubScore::new(divergence_score(divergence, cfg.base, cfg.multiplier), evidence)
}

pub fn score_windows(
    cfg: &DivergenceConfig,
    reference: &[Bar],
    subject: &[Bar],
    fallback: Score,
) -> SubScore {
    let reference_change = percent_change(reference, cfg.window);
    let subject_change = percent_change(subject, cfg.window);

    match (reference_change, subject_change) {
        (Some(a), Some(b)) => score_changes(cfg, a, b),
        _ => {
            tracing::warn!(
                reference = %cfg.reference_label,
                subject = %cfg.subject_label,
                reference_bars = reference.len(),
                subject_bars = subject.len(),
                "Insufficient price history for divergence"
            );
            crate::unavailable(
                fallback,
                &format!(
                    "need 2+ sessions for {} and {}",
                    cfg.reference_label, cfg.subject_label
                ),
            )
        }
    }
}
