//! History Store
//!
//! Rolling window of daily index readings persisted as a JSON array, the
//! synthetic calm-baseline backfill used when that window is too short, and
//! the trend derived from the reading before today's.

pub mod store;
pub mod trend;
pub mod window;

pub use store::HistoryStore;
pub use trend::compute_trend;
pub use window::{ensure_minimum, needs_backfill, previous_score, synthesize_backfill, trim, upsert};
