use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::ServerConfig;
use crate::pipeline::IngestStats;
use crate::query::QueryEngine;

pub struct AppState {
    pub query: QueryEngine,
    pub stats: IngestStats,
    pub server: ServerConfig,
}

pub async fn run_server(state: Arc<AppState>, bind_addr: &str) {
    let app = Router::new()
        .route("/uptime", get(get_uptime))
        .route("/errors", get(get_error_lines))
        .route("/series/account_value", get(get_account_value_series))
        .route("/series/errors", get(get_error_count_series))
        .route("/distribution", get(get_distribution))
        .route("/lines", get(get_filtered_lines))
        .route("/stats", get(get_stats))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await.unwrap();
    info!("Query API listening on {}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}

#[derive(Deserialize)]
struct RangeParams {
    /// RFC 3339; defaults to `to - default_range_secs` (dashboard's 24h).
    from: Option<String>,
    /// RFC 3339; defaults to now.
    to: Option<String>,
}

#[derive(Deserialize)]
struct ErrorSeriesParams {
    from: Option<String>,
    to: Option<String>,
    /// Bucket width in seconds; defaults to 60 (the dashboard's [1m]).
    bucket_secs: Option<i64>,
}

#[derive(Deserialize)]
struct FilterParams {
    contains: String,
    from: Option<String>,
    to: Option<String>,
}

async fn get_uptime(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.query.uptime_since_last_start(Utc::now());
    Json(json!({ "uptime_secs": uptime.map(|d| d.num_seconds()) }))
}

async fn get_error_lines(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> impl IntoResponse {
    let (from, to) = match resolve_range(&params.from, &params.to, &state.server) {
        Ok(range) => range,
        Err(resp) => return resp,
    };
    let lines = state
        .query
        .error_lines(from, to, Some(deadline(&state.server)));
    Json(json!({ "lines": lines })).into_response()
}

async fn get_account_value_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> impl IntoResponse {
    let (from, to) = match resolve_range(&params.from, &params.to, &state.server) {
        Ok(range) => range,
        Err(resp) => return resp,
    };
    let series = state
        .query
        .account_value_series(from, to, Some(deadline(&state.server)));
    let points: Vec<_> = series
        .into_iter()
        .map(|(ts, value)| json!({ "ts": ts.to_rfc3339(), "value": value }))
        .collect();
    Json(json!({ "series": points })).into_response()
}

async fn get_error_count_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ErrorSeriesParams>,
) -> impl IntoResponse {
    let (from, to) = match resolve_range(&params.from, &params.to, &state.server) {
        Ok(range) => range,
        Err(resp) => return resp,
    };
    let width = Duration::seconds(params.bucket_secs.unwrap_or(60).max(1));
    let series = state
        .query
        .error_count_series(from, to, width, Some(deadline(&state.server)));
    let points: Vec<_> = series
        .into_iter()
        .map(|(ts, count)| json!({ "ts": ts.to_rfc3339(), "count": count }))
        .collect();
    Json(json!({ "series": points })).into_response()
}

async fn get_distribution(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.query.order_status_distribution();
    let counts: serde_json::Map<String, serde_json::Value> = snapshot
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), json!(count)))
        .collect();
    Json(serde_json::Value::Object(counts))
}

async fn get_filtered_lines(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> impl IntoResponse {
    let (from, to) = match resolve_range(&params.from, &params.to, &state.server) {
        Ok(range) => range,
        Err(resp) => return resp,
    };
    let lines = state
        .query
        .filtered_lines(&params.contains, from, to, Some(deadline(&state.server)));
    Json(json!({ "lines": lines })).into_response()
}

async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!(state.stats.snapshot()))
}

fn deadline(server: &ServerConfig) -> Instant {
    Instant::now() + std::time::Duration::from_millis(server.query_deadline_ms)
}

fn resolve_range(
    from: &Option<String>,
    to: &Option<String>,
    server: &ServerConfig,
) -> Result<(DateTime<Utc>, DateTime<Utc>), axum::response::Response> {
    let to = match to {
        Some(raw) => parse_ts(raw)?,
        None => Utc::now(),
    };
    let from = match from {
        Some(raw) => parse_ts(raw)?,
        None => to - Duration::seconds(server.default_range_secs),
    };
    if from > to {
        return Err((
            axum::http::StatusCode::BAD_REQUEST,
            "from must not be after to".to_string(),
        )
            .into_response());
    }
    Ok((from, to))
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, axum::response::Response> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            (
                axum::http::StatusCode::BAD_REQUEST,
                format!("invalid RFC 3339 timestamp {:?}: {}", raw, e),
            )
                .into_response()
        })
}
