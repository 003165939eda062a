//! Unit tests for the QueryEngine - the dashboard-facing read surface.

#[cfg(test)]
mod query_tests {
    use crate::config::AppConfig;
    use crate::events::OrderStatus;
    use crate::pipeline::MetricsPipeline;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn pipeline() -> MetricsPipeline {
        MetricsPipeline::new(&AppConfig::default())
    }

    #[test]
    fn test_uptime_unknown_before_any_startup() {
        let query = pipeline().query_engine();
        assert_eq!(query.uptime_since_last_start(ts(0)), None);
    }

    #[test]
    fn test_uptime_tracks_most_recent_startup_only() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        pipeline
            .ingest_line("2024-01-01T00:00:00Z INFO Bot started successfully", None)
            .unwrap();
        assert_eq!(
            query.uptime_since_last_start(ts(120)),
            Some(Duration::seconds(120))
        );

        // A restart overwrites the anchor; uptime is time since last
        // restart, not total lifetime.
        pipeline
            .ingest_line("2024-01-01T00:10:00Z INFO Bot started successfully", None)
            .unwrap();
        assert_eq!(
            query.uptime_since_last_start(ts(660)),
            Some(Duration::seconds(60))
        );
    }

    #[test]
    fn test_error_lines_replay_verbatim() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        let raw = "2024-01-01T00:00:05Z ERROR order submission failed";
        pipeline.ingest_line(raw, None).unwrap();
        pipeline
            .ingest_line("2024-01-01T00:00:06Z INFO all fine", None)
            .unwrap();

        let lines = query.error_lines(ts(0), ts(60), None);
        assert_eq!(lines, vec![raw.to_string()]);
    }

    #[test]
    fn test_filtered_lines_round_trip() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        let filled = "2024-01-01T00:01:00Z INFO Order status: FILLED id=42";
        pipeline
            .ingest_line("2024-01-01T00:00:10Z INFO Order status: OPEN id=42", None)
            .unwrap();
        pipeline.ingest_line(filled, None).unwrap();

        let lines = query.filtered_lines("Order status: FILLED", ts(0), ts(120), None);
        assert_eq!(lines, vec![filled.to_string()]);

        let open = query.filtered_lines("Order status: OPEN", ts(0), ts(120), None);
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn test_distribution_delegates_to_tracker() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        pipeline
            .ingest_line("2024-01-01T00:00:10Z INFO Order status: OPEN id=1", None)
            .unwrap();
        pipeline
            .ingest_line("2024-01-01T00:00:11Z INFO Order status: OPEN id=2", None)
            .unwrap();
        pipeline
            .ingest_line("2024-01-01T00:01:00Z INFO Order status: FILLED id=1", None)
            .unwrap();

        let dist = query.order_status_distribution();
        assert_eq!(dist.get(&OrderStatus::Open), Some(&1));
        assert_eq!(dist.get(&OrderStatus::Filled), Some(&1));
    }

    #[test]
    fn test_account_value_series_delegates_to_aggregator() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        pipeline
            .ingest_line("2024-01-01T00:00:30Z INFO Account value: 10000.0", None)
            .unwrap();
        pipeline
            .ingest_line("2024-01-01T00:01:30Z INFO Account value: 10100.0", None)
            .unwrap();

        let series = query.account_value_series(ts(0), ts(300), None);
        assert_eq!(series, vec![(ts(0), 10000.0), (ts(60), 10100.0)]);
    }

    #[test]
    fn test_error_count_series_with_caller_bucket_width() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        pipeline
            .ingest_line("2024-01-01T00:00:05Z ERROR one", None)
            .unwrap();
        pipeline
            .ingest_line("2024-01-01T00:00:50Z ERROR two", None)
            .unwrap();
        pipeline
            .ingest_line("2024-01-01T00:03:00Z ERROR three", None)
            .unwrap();

        let series = query.error_count_series(ts(0), ts(600), Duration::seconds(120), None);
        assert_eq!(series, vec![(ts(0), 2), (ts(120), 1)]);
    }

    #[test]
    fn test_expired_deadline_yields_partial_results() {
        let pipeline = pipeline();
        let query = pipeline.query_engine();

        pipeline
            .ingest_line("2024-01-01T00:00:05Z ERROR boom", None)
            .unwrap();

        let expired = std::time::Instant::now() - std::time::Duration::from_millis(1);
        assert!(query.error_lines(ts(0), ts(60), Some(expired)).is_empty());
        assert!(query
            .account_value_series(ts(0), ts(60), Some(expired))
            .is_empty());
    }
}
