use crate::constants::{aggregation, ingest, query, replay};
use crate::error::PipelineError;
use serde::Deserialize;
use std::fs;

/// Where the raw log line stream comes from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Piped log output (e.g. `bot | gridwatch`).
    Stdin,
    /// Follow a log file the bot appends to.
    File,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Required when kind == file.
    pub path: Option<String>,
    #[serde(default = "default_follow_interval_ms")]
    pub follow_interval_ms: u64,
}

/// Policy for collapsing multi-sample buckets into one series point.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SamplePolicy {
    /// Last-sample-wins: the point reflects the newest sample in the bucket.
    Last,
    /// Arithmetic mean of all samples in the bucket.
    Mean,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_bucket_width_secs")]
    pub bucket_width_secs: i64,
    #[serde(default = "default_retention_secs")]
    pub retention_secs: i64,
    #[serde(default = "default_sample_policy")]
    pub sample_policy: SamplePolicy,
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_max_tracked_orders")]
    pub max_tracked_orders: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_replay_capacity")]
    pub capacity: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_range_secs")]
    pub default_range_secs: i64,
    #[serde(default = "default_deadline_ms")]
    pub query_deadline_ms: u64,
    /// Informational: the dashboard refresh interval this API is shaped for.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, PipelineError> {
        Self::load_from("config.yaml")
    }

    pub fn load_from(path: &str) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("failed to read {}: {}", path, e)))?;

        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("failed to parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.aggregator.bucket_width_secs <= 0 {
            return Err("aggregator.bucket_width_secs must be positive".into());
        }
        if self.aggregator.retention_secs < self.aggregator.bucket_width_secs {
            return Err("aggregator.retention_secs must cover at least one bucket".into());
        }
        if self.replay.capacity == 0 {
            return Err("replay.capacity must be at least 1".into());
        }
        if self.source.kind == SourceKind::File && self.source.path.is_none() {
            return Err("source.path is required when source.kind is file".into());
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                kind: SourceKind::Stdin,
                path: None,
                follow_interval_ms: default_follow_interval_ms(),
            },
            aggregator: AggregatorConfig::default(),
            tracker: TrackerConfig::default(),
            replay: ReplayConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: default_bucket_width_secs(),
            retention_secs: default_retention_secs(),
            sample_policy: default_sample_policy(),
            max_buckets: default_max_buckets(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracked_orders: default_max_tracked_orders(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: default_replay_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_range_secs: default_range_secs(),
            query_deadline_ms: default_deadline_ms(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_follow_interval_ms() -> u64 {
    ingest::DEFAULT_FOLLOW_INTERVAL_MS
}

fn default_bucket_width_secs() -> i64 {
    aggregation::DEFAULT_BUCKET_WIDTH_SECS
}

fn default_retention_secs() -> i64 {
    aggregation::DEFAULT_RETENTION_SECS
}

fn default_sample_policy() -> SamplePolicy {
    SamplePolicy::Last
}

fn default_max_buckets() -> usize {
    aggregation::DEFAULT_MAX_BUCKETS
}

fn default_max_tracked_orders() -> usize {
    aggregation::DEFAULT_MAX_TRACKED_ORDERS
}

fn default_replay_capacity() -> usize {
    replay::DEFAULT_CAPACITY
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_range_secs() -> i64 {
    query::DEFAULT_RANGE_SECS
}

fn default_deadline_ms() -> u64 {
    query::DEFAULT_DEADLINE_MS
}

fn default_poll_interval_secs() -> u64 {
    query::DEFAULT_POLL_INTERVAL_SECS
}
