use crate::error::PipelineError;
use crate::events::{OrderStatus, Signal};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

struct TrackerInner {
    /// Exactly one status per known order id.
    statuses: HashMap<String, OrderStatus>,
    /// Kept in lockstep with `statuses` so snapshots are O(statuses), not
    /// O(orders).
    counts: HashMap<OrderStatus, u64>,
}

/// Best-effort real-time view of order status distribution.
///
/// Transitions decrement the prior status count and increment the new one;
/// an order never contributes to two statuses at once. Out-of-order arrivals
/// (a FILLED seen before its OPEN due to log delivery jitter) are applied
/// as-is with no reordering buffer — this is a documented limitation, not an
/// error; the tracker is a dashboard view, not an authoritative ledger.
#[derive(Clone)]
pub struct OrderStatusTracker {
    inner: Arc<RwLock<TrackerInner>>,
    max_tracked_orders: usize,
}

impl OrderStatusTracker {
    pub fn new(max_tracked_orders: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TrackerInner {
                statuses: HashMap::new(),
                counts: HashMap::new(),
            })),
            max_tracked_orders,
        }
    }

    /// Applies one status change. Fails hard only when the distinct-order
    /// ceiling is hit.
    pub fn apply(&self, signal: &Signal) -> Result<(), PipelineError> {
        let Signal::OrderStatusChange {
            order_id, status, ..
        } = signal
        else {
            return Ok(());
        };

        let mut inner = self.inner.write().unwrap();

        match inner.statuses.get(order_id).copied() {
            Some(prior) if prior == *status => {
                // Duplicate delivery of the same status; counts are already
                // right.
            }
            Some(prior) => {
                if let Some(count) = inner.counts.get_mut(&prior) {
                    *count = count.saturating_sub(1);
                }
                inner.statuses.insert(order_id.clone(), *status);
                *inner.counts.entry(*status).or_insert(0) += 1;
            }
            None => {
                if inner.statuses.len() >= self.max_tracked_orders {
                    let tracked = inner.statuses.len();
                    warn!(order_id = %order_id, tracked, "order table full, rejecting apply");
                    return Err(PipelineError::OrderCapacityExceeded {
                        tracked,
                        max: self.max_tracked_orders,
                    });
                }
                inner.statuses.insert(order_id.clone(), *status);
                *inner.counts.entry(*status).or_insert(0) += 1;
            }
        }

        Ok(())
    }

    /// Current distribution. Only statuses with a nonzero count appear.
    pub fn snapshot(&self) -> HashMap<OrderStatus, u64> {
        let inner = self.inner.read().unwrap();
        inner
            .counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(status, count)| (*status, *count))
            .collect()
    }

    /// Current status of one order, if it has been seen.
    pub fn status_of(&self, order_id: &str) -> Option<OrderStatus> {
        self.inner.read().unwrap().statuses.get(order_id).copied()
    }

    pub fn tracked_orders(&self) -> usize {
        self.inner.read().unwrap().statuses.len()
    }
}
