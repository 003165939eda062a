use crate::config::{AggregatorConfig, SamplePolicy};
use crate::error::PipelineError;
use crate::events::{Signal, SignalKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::debug;

/// Time-windowed aggregator: fixed-width, non-overlapping buckets keyed by
/// `floor(unix_secs / width)`.
///
/// Error signals increment a bucket counter; account-value signals append to
/// the bucket's sample list. Buckets whose whole interval lies before
/// `high_water - retention` are evicted lazily: removed on the next write,
/// excluded from results on reads. The eviction clock is the newest event
/// timestamp observed (log time, not wall clock), so replaying a historical
/// log behaves the same as tailing a live one.
///
/// Writes take the per-map lock exclusively; queries share it. The two maps
/// have independent locks so account-value queries never wait on error-count
/// writes.
#[derive(Clone)]
pub struct Aggregator {
    error_buckets: Arc<RwLock<BTreeMap<i64, u64>>>,
    value_buckets: Arc<RwLock<BTreeMap<i64, Vec<f64>>>>,
    /// Newest event timestamp seen, in unix seconds.
    high_water: Arc<AtomicI64>,
    width_secs: i64,
    retention_secs: i64,
    max_buckets: usize,
    policy: SamplePolicy,
}

impl Aggregator {
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            error_buckets: Arc::new(RwLock::new(BTreeMap::new())),
            value_buckets: Arc::new(RwLock::new(BTreeMap::new())),
            high_water: Arc::new(AtomicI64::new(i64::MIN)),
            width_secs: config.bucket_width_secs,
            retention_secs: config.retention_secs,
            max_buckets: config.max_buckets,
            policy: config.sample_policy,
        }
    }

    /// Folds one signal into the bucket state. Only Error and AccountValue
    /// signals are aggregated here; anything else is a no-op.
    ///
    /// Fails hard only when the configured bucket ceiling is hit; the host's
    /// supervision layer owns that condition.
    pub fn record(&self, signal: &Signal) -> Result<(), PipelineError> {
        match signal {
            Signal::Error { timestamp } => {
                let idx = self.touch(timestamp.timestamp());
                let mut map = self.error_buckets.write().unwrap();
                Self::evict(&mut map, self.eviction_floor());
                if !map.contains_key(&idx) && map.len() >= self.max_buckets {
                    return Err(PipelineError::BucketCapacityExceeded {
                        live: map.len(),
                        max: self.max_buckets,
                    });
                }
                *map.entry(idx).or_insert(0) += 1;
                Ok(())
            }
            Signal::AccountValue { timestamp, value } => {
                let idx = self.touch(timestamp.timestamp());
                let mut map = self.value_buckets.write().unwrap();
                Self::evict(&mut map, self.eviction_floor());
                if !map.contains_key(&idx) && map.len() >= self.max_buckets {
                    return Err(PipelineError::BucketCapacityExceeded {
                        live: map.len(),
                        max: self.max_buckets,
                    });
                }
                map.entry(idx).or_default().push(*value);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Total count for a kind over buckets overlapping [from, to].
    pub fn query_count(&self, kind: SignalKind, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        let (lo, hi) = (self.bucket_index(from), self.bucket_index(to));
        let floor = self.eviction_floor().max(lo);
        if floor > hi {
            return 0;
        }
        match kind {
            SignalKind::Error => {
                let map = self.error_buckets.read().unwrap();
                map.range(floor..=hi).map(|(_, c)| *c).sum()
            }
            SignalKind::AccountValue => {
                let map = self.value_buckets.read().unwrap();
                map.range(floor..=hi).map(|(_, s)| s.len() as u64).sum()
            }
        }
    }

    /// One point per non-empty bucket in [from, to]. Error points carry the
    /// bucket count; account-value points collapse multi-sample buckets with
    /// the configured policy (default last-sample-wins).
    pub fn query_series(
        &self,
        kind: SignalKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<(DateTime<Utc>, f64)> {
        let (lo, hi) = (self.bucket_index(from), self.bucket_index(to));
        let floor = self.eviction_floor().max(lo);
        if floor > hi {
            return Vec::new();
        }
        let mut points = Vec::new();
        match kind {
            SignalKind::Error => {
                let map = self.error_buckets.read().unwrap();
                for (idx, count) in map.range(floor..=hi) {
                    if deadline_hit(deadline) {
                        break;
                    }
                    if let Some(ts) = self.bucket_start(*idx) {
                        points.push((ts, *count as f64));
                    }
                }
            }
            SignalKind::AccountValue => {
                let map = self.value_buckets.read().unwrap();
                for (idx, samples) in map.range(floor..=hi) {
                    if deadline_hit(deadline) {
                        break;
                    }
                    if samples.is_empty() {
                        continue;
                    }
                    let value = match self.policy {
                        SamplePolicy::Last => *samples.last().expect("non-empty"),
                        SamplePolicy::Mean => {
                            samples.iter().sum::<f64>() / samples.len() as f64
                        }
                    };
                    if let Some(ts) = self.bucket_start(*idx) {
                        points.push((ts, value));
                    }
                }
            }
        }
        points
    }

    /// Error counts re-bucketed to a caller-supplied width, supporting the
    /// dashboard's `count_over_time(...[1m])` semantics. Widths narrower than
    /// the base bucket are clamped up to it (base buckets cannot be split).
    pub fn error_count_series(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        bucket_width_secs: i64,
        deadline: Option<Instant>,
    ) -> Vec<(DateTime<Utc>, u64)> {
        let out_width = bucket_width_secs.max(self.width_secs);
        let (lo, hi) = (self.bucket_index(from), self.bucket_index(to));
        let floor = self.eviction_floor().max(lo);
        if floor > hi {
            return Vec::new();
        }

        let mut rebucketed: BTreeMap<i64, u64> = BTreeMap::new();
        {
            let map = self.error_buckets.read().unwrap();
            for (idx, count) in map.range(floor..=hi) {
                if deadline_hit(deadline) {
                    break;
                }
                let out_idx = (idx * self.width_secs).div_euclid(out_width);
                *rebucketed.entry(out_idx).or_insert(0) += count;
            }
        }

        rebucketed
            .into_iter()
            .filter_map(|(out_idx, count)| {
                DateTime::from_timestamp(out_idx * out_width, 0).map(|ts| (ts, count))
            })
            .collect()
    }

    fn bucket_index(&self, ts: DateTime<Utc>) -> i64 {
        ts.timestamp().div_euclid(self.width_secs)
    }

    fn bucket_start(&self, idx: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(idx * self.width_secs, 0)
    }

    /// Advances the eviction clock and returns the signal's bucket index.
    fn touch(&self, ts_secs: i64) -> i64 {
        self.high_water.fetch_max(ts_secs, Ordering::Relaxed);
        ts_secs.div_euclid(self.width_secs)
    }

    /// Smallest bucket index still inside the retention window. A bucket is
    /// retained while any part of its interval is newer than
    /// `high_water - retention`.
    fn eviction_floor(&self) -> i64 {
        let hw = self.high_water.load(Ordering::Relaxed);
        if hw == i64::MIN {
            return i64::MIN;
        }
        (hw - self.retention_secs).div_euclid(self.width_secs)
    }

    fn evict<T>(map: &mut BTreeMap<i64, T>, floor: i64) {
        if floor == i64::MIN {
            return;
        }
        if map.keys().next().is_some_and(|first| *first < floor) {
            let kept = map.split_off(&floor);
            let dropped = map.len();
            *map = kept;
            debug!(dropped, "evicted buckets past retention");
        }
    }
}

fn deadline_hit(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
