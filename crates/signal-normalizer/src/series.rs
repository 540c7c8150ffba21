use index_core::scale::{clamp_score, mean};
use index_core::{LinearConfig, MeanDeviationConfig, MeanRatioConfig, Score, SubScore};
use tracing::warn;

fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Latest value against the window mean, in percent, mapped as `base + pct * multiplier`.
pub fn mean_deviation(cfg: &MeanDeviationConfig, values: &[f64], fallback: Score) -> SubScore {
    let values = finite_values(values);
    let (Some(&latest), true) = (values.last(), values.len() >= 2) else {
        warn!(label = %cfg.label, points = values.len(), "Series too short for mean deviation");
        return crate::unavailable(fallback, &format!("need 2+ {} readings", cfg.label));
    };

    let average = mean(&values);
    if average.abs() < f64::EPSILON {
        return crate::unavailable(fallback, &format!("{} average is zero", cfg.label));
    }

    let pct = (latest - average) / average * 100.0;
    let evidence = if pct > cfg.notable_pct {
        format!(
            "{} diverging {:.1}% from {} day average.",
            cfg.label,
            pct,
            values.len()
        )
    } else {
        cfg.calm_evidence.clone()
    };

    SubScore::new(clamp_score(cfg.base + pct * cfg.multiplier), evidence)
}

/// Latest value as a multiple of the window mean.
pub fn mean_ratio(cfg: &MeanRatioConfig, values: &[f64], fallback: Score) -> SubScore {
    let values = finite_values(values);
    let (Some(&latest), true) = (values.last(), values.len() >= 2) else {
        warn!(label = %cfg.label, points = values.len(), "Series too short for mean ratio");
        return crate::unavailable(fallback, &format!("need 2+ {} readings", cfg.label));
    };

    let average = mean(&values);
    if average.abs() < f64::EPSILON {
        return crate::unavailable(fallback, &format!("{} average is zero", cfg.label));
    }

    let ratio = latest / average;
    SubScore::new(
        clamp_score(ratio * cfg.multiplier),
        format!("{} at {:.2}x its {} day average", cfg.label, ratio, values.len()),
    )
}

pub fn linear(cfg: &LinearConfig, value: f64, fallback: Score) -> SubScore {
    if !value.is_finite() {
        warn!(label = %cfg.label, "Non-finite reading");
        return crate::unavailable(fallback, &format!("{} reading is not a number", cfg.label));
    }
    SubScore::new(
        clamp_score((value - cfg.offset) * cfg.multiplier),
        format!("{}: {:.1}", cfg.label, value),
    )
}
