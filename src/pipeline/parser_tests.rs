//! Unit tests for the LineParser - raw line to typed LogEvent conversion.

#[cfg(test)]
mod parser_tests {
    use crate::error::ParseError;
    use crate::events::LogLevel;
    use crate::pipeline::parser::LineParser;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let parser = LineParser::new();
        let event = parser
            .parse("2024-01-01T00:00:05Z ERROR something failed", None)
            .unwrap();

        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap()
        );
        assert_eq!(event.level, LogLevel::Error);
        assert!(!event.parse_degraded);
    }

    #[test]
    fn test_parse_python_logging_timestamp() {
        let parser = LineParser::new();
        let event = parser
            .parse(
                "2024-01-01 00:00:00,123 - GridTradingBot - INFO - Bot started successfully",
                None,
            )
            .unwrap();

        assert_eq!(event.timestamp.timestamp(), 1704067200);
        assert_eq!(event.timestamp.timestamp_subsec_millis(), 123);
        assert_eq!(event.level, LogLevel::Info);
    }

    #[test]
    fn test_missing_timestamp_uses_received_at() {
        let parser = LineParser::new();
        let received = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let event = parser.parse("INFO no timestamp here", Some(received)).unwrap();
        assert_eq!(event.timestamp, received);
    }

    #[test]
    fn test_missing_timestamp_without_fallback_fails() {
        let parser = LineParser::new();
        let result = parser.parse("INFO no timestamp here", None);
        assert_eq!(result.unwrap_err(), ParseError::NoTimestamp);
    }

    #[test]
    fn test_level_defaults_to_info() {
        let parser = LineParser::new();
        let event = parser.parse("2024-01-01T00:00:00Z just a message", None).unwrap();
        assert_eq!(event.level, LogLevel::Info);
    }

    #[test]
    fn test_warning_maps_to_warn() {
        let parser = LineParser::new();
        let event = parser
            .parse("2024-01-01 00:00:00,000 - bot - WARNING - careful", None)
            .unwrap();
        assert_eq!(event.level, LogLevel::Warn);
    }

    #[test]
    fn test_kv_token_extraction() {
        let parser = LineParser::new();
        let event = parser
            .parse("2024-01-01T00:00:10Z INFO Order status: OPEN id=42", None)
            .unwrap();

        assert_eq!(event.text_field(&["id"]).as_deref(), Some("42"));
        assert_eq!(event.text_field(&["order_status"]).as_deref(), Some("OPEN"));
    }

    #[test]
    fn test_colon_pair_extraction() {
        let parser = LineParser::new();
        let event = parser
            .parse(
                "2024-01-01 00:05:00,000 - bot - INFO - Account value: 10500.25",
                None,
            )
            .unwrap();

        assert_eq!(event.numeric_field(&["account_value"]), Some(10500.25));
    }

    #[test]
    fn test_json_fragment_extraction() {
        let parser = LineParser::new();
        let event = parser
            .parse(
                r#"2024-01-01T00:00:00Z INFO Account value {"value": 9800.5, "currency": "USDT"}"#,
                None,
            )
            .unwrap();

        assert_eq!(event.numeric_field(&["value"]), Some(9800.5));
        assert_eq!(event.text_field(&["currency"]).as_deref(), Some("USDT"));
        assert!(!event.parse_degraded);
    }

    #[test]
    fn test_malformed_json_fragment_is_non_fatal() {
        let parser = LineParser::new();
        let event = parser
            .parse("2024-01-01T00:00:00Z INFO Account value {value: broken", None)
            .unwrap();

        // Event still produced, degraded flag set, no fields from the blob.
        assert!(event.parse_degraded);
        assert_eq!(event.numeric_field(&["value"]), None);
    }

    #[test]
    fn test_raw_message_is_verbatim() {
        let parser = LineParser::new();
        let raw = "2024-01-01T00:01:00Z INFO Order status: FILLED id=42";
        let event = parser.parse(raw, None).unwrap();
        assert_eq!(event.raw_message, raw);
    }

    #[test]
    fn test_log_prefix_does_not_leak_into_colon_keys() {
        let parser = LineParser::new();
        let event = parser
            .parse("2024-01-01T00:00:10Z INFO Order status: FILLED id=7", None)
            .unwrap();

        // The key must be "order_status", not something dragging in the
        // level tag.
        assert_eq!(
            event.text_field(&["order_status"]).as_deref(),
            Some("FILLED")
        );
        assert!(!event.structured_fields.keys().any(|k| k.contains("info")));
    }
}
