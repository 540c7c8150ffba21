//! Composite Index
//!
//! Weighted aggregation of per-source sub-scores into one bounded index value,
//! an optional cross-index amplifier, and classification into status bands.

pub mod aggregator;
pub mod bands;

pub use aggregator::{aggregate, amplifier_multiplier, weighted_score, WeightedBreakdown};
pub use bands::{classify, UNCLASSIFIED_COLOR, UNCLASSIFIED_LABEL};
