//! Replay orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{build_index, Pipeline, PipelineConfig};
pub use stats::{IndexSummary, PipelineStats};
