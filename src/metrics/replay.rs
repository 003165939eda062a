use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Instant;

#[derive(Clone, Debug)]
struct StoredLine {
    timestamp: DateTime<Utc>,
    line: String,
}

/// Bounded, oldest-evicted-first store of verbatim raw lines for one signal
/// kind, backing the log-viewer-style panels (Error Logs, Open/Completed
/// Orders).
///
/// Lines are kept in arrival order. Range scans filter by the line's parsed
/// timestamp, so mild delivery jitter only costs a scan, never a wrong
/// result.
#[derive(Clone)]
pub struct LineBuffer {
    lines: Arc<RwLock<VecDeque<StoredLine>>>,
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    pub fn push(&self, timestamp: DateTime<Utc>, line: &str) {
        let mut lines = self.lines.write().unwrap();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(StoredLine {
            timestamp,
            line: line.to_string(),
        });
    }

    /// Lines whose timestamp falls in [from, to], verbatim.
    pub fn range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<String> {
        self.collect(from, to, deadline, |_| true)
    }

    /// Lines in [from, to] containing the given substring, verbatim.
    pub fn range_filtered(
        &self,
        substring: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Vec<String> {
        self.collect(from, to, deadline, |line| line.contains(substring))
    }

    pub fn len(&self) -> usize {
        self.lines.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().unwrap().is_empty()
    }

    fn collect(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        deadline: Option<Instant>,
        keep: impl Fn(&str) -> bool,
    ) -> Vec<String> {
        let lines = self.lines.read().unwrap();
        let mut out = Vec::new();
        for stored in lines.iter() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                // Partial result on deadline expiry, never a blocked caller.
                break;
            }
            if stored.timestamp >= from && stored.timestamp <= to && keep(&stored.line) {
                out.push(stored.line.clone());
            }
        }
        out
    }
}
