/// Trait for headline sentiment scorers.
///
/// Implementations return a polarity in `[-1.0, 1.0]` where negative means adverse news.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Scorer that treats every headline as neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralPolarity;

impl PolarityScorer for NeutralPolarity {
    fn polarity(&self, _text: &str) -> f64 {
        0.0
    }
}
