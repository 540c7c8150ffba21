pub mod config;
pub mod pipeline;
pub mod report;
pub mod signals;

pub use config::RunnerConfig;
pub use pipeline::{run, PipelineContext, RunOutcome};
pub use report::DashboardPayload;
pub use signals::{load_signals, SignalSet};
