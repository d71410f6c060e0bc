//! Daily anomaly digest: fetch, render, deliver, clean up.

pub mod cli;
pub mod pipeline;

pub use cli::CliArgs;
pub use pipeline::{Pipeline, PipelineError, RunSummary};
