pub mod classifier;
pub mod context;
pub mod ingest;
pub mod parser;

pub use context::{IngestStats, MetricsPipeline, StatsSnapshot};

#[cfg(test)]
mod parser_tests;
