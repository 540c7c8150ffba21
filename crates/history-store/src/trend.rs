use index_core::{Score, TrendArrow, TrendResult};

/// Signed change from the previous reading. No previous reading means no change.
pub fn compute_trend(previous: Option<Score>, final_score: Score) -> TrendResult {
    let delta = previous.map_or(0, |prev| i32::from(final_score) - i32::from(prev));
    let arrow = TrendArrow::from_delta(delta);

    let description = match arrow {
        TrendArrow::Flat => "unchanged since last reading".to_string(),
        _ => format!("{delta:+} pts since last reading"),
    };

    TrendResult {
        delta,
        arrow,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_risk() {
        let trend = compute_trend(Some(34), 30);
        assert_eq!(trend.delta, -4);
        assert_eq!(trend.arrow, TrendArrow::Down);
        assert_eq!(trend.arrow.direction(), "falling");
        assert_eq!(trend.description, "-4 pts since last reading");
    }

    #[test]
    fn rising_risk() {
        let trend = compute_trend(Some(30), 72);
        assert_eq!(trend.delta, 42);
        assert_eq!(trend.arrow, TrendArrow::Up);
        assert_eq!(trend.description, "+42 pts since last reading");
    }

    #[test]
    fn empty_history_is_flat() {
        let trend = compute_trend(None, 88);
        assert_eq!(trend.delta, 0);
        assert_eq!(trend.arrow, TrendArrow::Flat);
        assert_eq!(trend.description, "unchanged since last reading");
    }

    #[test]
    fn equal_scores_are_flat() {
        assert_eq!(compute_trend(Some(50), 50).arrow, TrendArrow::Flat);
    }
}
