use crate::events::{OrderStatus, SignalKind};
use crate::metrics::aggregator::Aggregator;
use crate::metrics::replay::LineBuffer;
use crate::metrics::tracker::OrderStatusTracker;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Read-side surface over the pipeline's aggregate state, mirroring the
/// dashboard's panels one-for-one.
///
/// Every operation reads through per-structure shared locks; none of them
/// can block the ingestion path. Range queries take an optional caller
/// deadline and return whatever was gathered when it expires.
#[derive(Clone)]
pub struct QueryEngine {
    aggregator: Aggregator,
    tracker: OrderStatusTracker,
    error_lines: LineBuffer,
    order_lines: LineBuffer,
    uptime_anchor: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl QueryEngine {
    pub fn new(
        aggregator: Aggregator,
        tracker: OrderStatusTracker,
        error_lines: LineBuffer,
        order_lines: LineBuffer,
        uptime_anchor: Arc<RwLock<Option<DateTime<Utc>>>>,
    ) -> Self {
        Self {
            aggregator,
            tracker,
            error_lines,
            order_lines,
            uptime_anchor,
        }
    }

    /// Time since the most recent startup marker, or None if the bot was
    /// never seen starting. Always reflects the latest restart, never an
    /// earlier one.
    pub fn uptime_since_last_start(&self, now: DateTime<Utc>) -> Option<Duration> {
        let anchor = (*self.uptime_anchor.read().unwrap())?;
        Some(now - anchor)
    }

    /// Verbatim error lines in [from, to], replayed from the error ring
    /// buffer (the Error Logs panel).
    pub fn error_lines(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<String> {
        self.error_lines.range(from, to, deadline)
    }

    /// Account value series over [from, to], one point per non-empty bucket.
    pub fn account_value_series(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<(DateTime<Utc>, f64)> {
        self.aggregator
            .query_series(SignalKind::AccountValue, from, to, deadline)
    }

    /// Current order status distribution (the pie chart). Only statuses with
    /// live orders appear.
    pub fn order_status_distribution(&self) -> HashMap<OrderStatus, u64> {
        self.tracker.snapshot()
    }

    /// Error counts in caller-sized buckets over [from, to]
    /// (`count_over_time(...[1m])` semantics).
    pub fn error_count_series(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        bucket_width: Duration,
        deadline: Option<Instant>,
    ) -> Vec<(DateTime<Utc>, u64)> {
        self.aggregator
            .error_count_series(from, to, bucket_width.num_seconds().max(1), deadline)
    }

    /// Total error count over [from, to].
    pub fn error_count(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        self.aggregator.query_count(SignalKind::Error, from, to)
    }

    /// Substring-filtered verbatim order lines in [from, to], backing the
    /// "Order status: FILLED" / "Order status: OPEN" log panels.
    pub fn filtered_lines(
        &self,
        predicate_substring: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<String> {
        self.order_lines
            .range_filtered(predicate_substring, from, to, deadline)
    }
}
