use crate::config::AppConfig;
use crate::constants::markers;
use crate::error::PipelineError;
use crate::events::Signal;
use crate::metrics::aggregator::Aggregator;
use crate::metrics::replay::LineBuffer;
use crate::metrics::tracker::OrderStatusTracker;
use crate::pipeline::classifier;
use crate::pipeline::parser::LineParser;
use crate::query::QueryEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Ingest-side health counters, readable while ingestion runs.
#[derive(Clone, Default)]
pub struct IngestStats {
    lines_ingested: Arc<AtomicU64>,
    parse_failures: Arc<AtomicU64>,
    signals_emitted: Arc<AtomicU64>,
    classification_misses: Arc<AtomicU64>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub lines_ingested: u64,
    pub parse_failures: u64,
    pub signals_emitted: u64,
    pub classification_misses: u64,
}

impl IngestStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_ingested: self.lines_ingested.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            signals_emitted: self.signals_emitted.load(Ordering::Relaxed),
            classification_misses: self.classification_misses.load(Ordering::Relaxed),
        }
    }

    fn add_lines(&self, n: u64) {
        self.lines_ingested.fetch_add(n, Ordering::Relaxed);
    }

    fn add_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn add_signals(&self, n: u64) {
        self.signals_emitted.fetch_add(n, Ordering::Relaxed);
    }

    fn add_miss(&self) {
        self.classification_misses.fetch_add(1, Ordering::Relaxed);
    }
}

/// The whole extraction pipeline behind one injectable context object:
/// parser, classifier, aggregate state, replay buffers, uptime anchor.
///
/// One instance per pipeline; tests spin up as many independent instances as
/// they like. Cloning shares the underlying state (handles, not copies).
/// A single writer calls [`ingest_line`](Self::ingest_line) in strict arrival
/// order; any number of readers query through [`QueryEngine`].
#[derive(Clone)]
pub struct MetricsPipeline {
    parser: Arc<LineParser>,
    aggregator: Aggregator,
    tracker: OrderStatusTracker,
    error_lines: LineBuffer,
    order_lines: LineBuffer,
    uptime_anchor: Arc<RwLock<Option<DateTime<Utc>>>>,
    stats: IngestStats,
}

impl MetricsPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            parser: Arc::new(LineParser::new()),
            aggregator: Aggregator::new(&config.aggregator),
            tracker: OrderStatusTracker::new(config.tracker.max_tracked_orders),
            error_lines: LineBuffer::new(config.replay.capacity),
            order_lines: LineBuffer::new(config.replay.capacity),
            uptime_anchor: Arc::new(RwLock::new(None)),
            stats: IngestStats::default(),
        }
    }

    /// Runs one raw line through parse → classify → fold.
    ///
    /// Per-line parse failures drop the line, bump the skip counter, and
    /// return Ok — nothing per-line is fatal to the stream. The only Err this
    /// returns is resource exhaustion from the aggregate state, which is the
    /// host supervision layer's problem.
    pub fn ingest_line(
        &self,
        raw_line: &str,
        received_at: Option<DateTime<Utc>>,
    ) -> Result<(), PipelineError> {
        self.stats.add_lines(1);

        let event = match self.parser.parse(raw_line, received_at) {
            Ok(event) => event,
            Err(e) => {
                self.stats.add_parse_failure();
                debug!(error = %e, line = raw_line, "dropped unparseable line");
                return Ok(());
            }
        };

        let signals = classifier::classify(&event);
        self.stats.add_signals(signals.len() as u64);

        // A marker that matched without yielding its signal is a
        // classification miss: expected, counted, never an error.
        let value_hit = signals
            .iter()
            .any(|s| matches!(s, Signal::AccountValue { .. }));
        let order_hit = signals
            .iter()
            .any(|s| matches!(s, Signal::OrderStatusChange { .. }));
        if (raw_line.contains(markers::ACCOUNT_VALUE) && !value_hit)
            || (raw_line.contains(markers::ORDER_STATUS) && !order_hit)
        {
            self.stats.add_miss();
        }

        for signal in &signals {
            match signal {
                Signal::Startup { timestamp } => {
                    // Overwritten, not accumulated: time since last restart.
                    *self.uptime_anchor.write().unwrap() = Some(*timestamp);
                }
                Signal::Error { timestamp } => {
                    self.aggregator.record(signal)?;
                    self.error_lines.push(*timestamp, raw_line);
                }
                Signal::AccountValue { .. } => {
                    self.aggregator.record(signal)?;
                }
                Signal::OrderStatusChange { timestamp, .. } => {
                    self.tracker.apply(signal)?;
                    self.order_lines.push(*timestamp, raw_line);
                }
            }
        }

        Ok(())
    }

    /// Read-side handle over the shared aggregate state.
    pub fn query_engine(&self) -> QueryEngine {
        QueryEngine::new(
            self.aggregator.clone(),
            self.tracker.clone(),
            self.error_lines.clone(),
            self.order_lines.clone(),
            self.uptime_anchor.clone(),
        )
    }

    pub fn stats(&self) -> IngestStats {
        self.stats.clone()
    }
}
