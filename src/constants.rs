//! Application-wide constants and magic numbers
//!
//! Centralizes the textual markers the pipeline treats as a stable parsing
//! contract with the bot's log output, plus tunable defaults.

/// Stable textual markers recognized in the bot's log lines.
///
/// These are a parsing contract: the bot emits them verbatim and the
/// dashboard queries depend on them. Do not "clean up" the casing.
pub mod markers {
    /// Emitted once per process start; drives the uptime panel.
    pub const BOT_STARTED: &str = "Bot started successfully";

    /// Prefix of the periodic account valuation line.
    pub const ACCOUNT_VALUE: &str = "Account value";

    /// Prefix of order lifecycle lines.
    pub const ORDER_STATUS: &str = "Order status";

    /// Literal substrings the dashboard's filtered log panels match on.
    pub const ORDER_FILLED_LINE: &str = "Order status: FILLED";
    pub const ORDER_OPEN_LINE: &str = "Order status: OPEN";
}

/// Structured-field keys the classifier recognizes.
pub mod fields {
    /// Keys that may carry the numeric account valuation.
    pub const ACCOUNT_VALUE_KEYS: [&str; 3] = ["value", "account_value", "total_value"];

    /// Keys that may carry an order identifier.
    pub const ORDER_ID_KEYS: [&str; 2] = ["id", "order_id"];

    /// Keys that may carry an order status token.
    pub const ORDER_STATUS_KEYS: [&str; 2] = ["status", "order_status"];
}

/// Aggregation defaults (all overridable via config.yaml).
pub mod aggregation {
    /// Base bucket width, matching the dashboard's count_over_time(...[1m]).
    pub const DEFAULT_BUCKET_WIDTH_SECS: i64 = 60;

    /// Retention mirrors the dashboard's default 24h time range.
    pub const DEFAULT_RETENTION_SECS: i64 = 24 * 60 * 60;

    /// Hard ceiling on live buckets per signal kind before record() fails.
    pub const DEFAULT_MAX_BUCKETS: usize = 100_000;

    /// Hard ceiling on distinct tracked order ids before apply() fails.
    pub const DEFAULT_MAX_TRACKED_ORDERS: usize = 100_000;
}

/// Replay buffer defaults.
pub mod replay {
    /// Max raw lines retained per signal kind, oldest evicted first.
    pub const DEFAULT_CAPACITY: usize = 10_000;
}

/// Query API defaults.
pub mod query {
    /// Default lookback when a range query omits `from` (dashboard default).
    pub const DEFAULT_RANGE_SECS: i64 = 24 * 60 * 60;

    /// Per-query deadline; on expiry a partial result is returned.
    pub const DEFAULT_DEADLINE_MS: u64 = 2_000;

    /// Dashboard refresh interval the API is shaped for.
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
}

/// Ingestion defaults.
pub mod ingest {
    /// How long the file follower sleeps at EOF before re-polling.
    pub const DEFAULT_FOLLOW_INTERVAL_MS: u64 = 500;
}
