//! Custom error types for the metrics pipeline
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Per-line parse failures. Never fatal to the stream: the line is dropped
/// and counted in the skip counter.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("no recognizable timestamp in line and no received_at fallback supplied")]
    NoTimestamp,
}

/// Top-level pipeline errors. Capacity variants are the only hard failures
/// record()/apply() can surface; everything else in the pipeline degrades
/// per-line.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("bucket capacity exceeded: {live} live buckets (max {max})")]
    BucketCapacityExceeded { live: usize, max: usize },

    #[error("order table capacity exceeded: {tracked} tracked orders (max {max})")]
    OrderCapacityExceeded { tracked: usize, max: usize },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<String> for PipelineError {
    fn from(err: String) -> Self {
        PipelineError::Config(err)
    }
}

impl From<&str> for PipelineError {
    fn from(err: &str) -> Self {
        PipelineError::Config(err.to_string())
    }
}
