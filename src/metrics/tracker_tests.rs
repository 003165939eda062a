//! Unit tests for the OrderStatusTracker - categorical order state counts.

#[cfg(test)]
mod tracker_tests {
    use crate::error::PipelineError;
    use crate::events::{OrderStatus, Signal};
    use crate::metrics::tracker::OrderStatusTracker;
    use chrono::{TimeZone, Utc};

    fn change(order_id: &str, status: OrderStatus) -> Signal {
        Signal::OrderStatusChange {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            order_id: order_id.to_string(),
            status,
        }
    }

    #[test]
    fn test_new_order_increments_only_new_status() {
        let tracker = OrderStatusTracker::new(1000);
        tracker.apply(&change("42", OrderStatus::Open)).unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.get(&OrderStatus::Open), Some(&1));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_transition_moves_the_count() {
        let tracker = OrderStatusTracker::new(1000);
        tracker.apply(&change("42", OrderStatus::Open)).unwrap();
        tracker.apply(&change("42", OrderStatus::Filled)).unwrap();

        // OPEN decremented, FILLED incremented; the order is never counted
        // under two statuses.
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.get(&OrderStatus::Open), None);
        assert_eq!(snapshot.get(&OrderStatus::Filled), Some(&1));
    }

    #[test]
    fn test_snapshot_reflects_only_last_status() {
        let tracker = OrderStatusTracker::new(1000);
        tracker.apply(&change("7", OrderStatus::Open)).unwrap();
        tracker.apply(&change("7", OrderStatus::Filled)).unwrap();
        tracker.apply(&change("7", OrderStatus::Cancelled)).unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.get(&OrderStatus::Cancelled), Some(&1));
        assert_eq!(snapshot.values().sum::<u64>(), 1);
        assert_eq!(tracker.status_of("7"), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn test_counts_sum_to_distinct_order_ids() {
        let tracker = OrderStatusTracker::new(1000);
        for i in 0..10 {
            tracker
                .apply(&change(&format!("ord-{}", i), OrderStatus::Open))
                .unwrap();
        }
        for i in 0..4 {
            tracker
                .apply(&change(&format!("ord-{}", i), OrderStatus::Filled))
                .unwrap();
        }
        tracker.apply(&change("ord-9", OrderStatus::Rejected)).unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.values().sum::<u64>(), 10);
        assert_eq!(snapshot.get(&OrderStatus::Open), Some(&5));
        assert_eq!(snapshot.get(&OrderStatus::Filled), Some(&4));
        assert_eq!(snapshot.get(&OrderStatus::Rejected), Some(&1));
    }

    #[test]
    fn test_duplicate_status_is_idempotent() {
        let tracker = OrderStatusTracker::new(1000);
        tracker.apply(&change("42", OrderStatus::Open)).unwrap();
        tracker.apply(&change("42", OrderStatus::Open)).unwrap();

        assert_eq!(tracker.snapshot().get(&OrderStatus::Open), Some(&1));
    }

    #[test]
    fn test_out_of_order_arrival_is_applied_as_is() {
        // FILLED before its OPEN due to delivery jitter: no reordering
        // buffer, the last arrival wins.
        let tracker = OrderStatusTracker::new(1000);
        tracker.apply(&change("42", OrderStatus::Filled)).unwrap();
        tracker.apply(&change("42", OrderStatus::Open)).unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.get(&OrderStatus::Open), Some(&1));
        assert_eq!(snapshot.get(&OrderStatus::Filled), None);
    }

    #[test]
    fn test_unknown_ids_are_implicitly_absent() {
        let tracker = OrderStatusTracker::new(1000);
        assert_eq!(tracker.status_of("nope"), None);
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn test_capacity_exceeded_is_hard_failure() {
        let tracker = OrderStatusTracker::new(2);
        tracker.apply(&change("a", OrderStatus::Open)).unwrap();
        tracker.apply(&change("b", OrderStatus::Open)).unwrap();

        // Transitions on known ids still work at the ceiling.
        tracker.apply(&change("a", OrderStatus::Filled)).unwrap();

        let err = tracker.apply(&change("c", OrderStatus::Open)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::OrderCapacityExceeded { tracked: 2, max: 2 }
        ));
    }

    #[test]
    fn test_non_order_signals_are_ignored() {
        let tracker = OrderStatusTracker::new(1000);
        tracker
            .apply(&Signal::Error {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
            .unwrap();
        assert_eq!(tracker.tracked_orders(), 0);
    }
}
