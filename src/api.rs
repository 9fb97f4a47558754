//! HTTP query API
//!
//! A thin axum surface over the core: the current-state snapshot and the
//! three history endpoints. Query parameters are matched case-insensitively
//! and the query mode is decided here, once, from parameter presence. Every
//! reply carries permissive CORS headers for browser dashboards.

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::app::App;
use crate::history::query::{self, HistoryQuery};
use crate::history::store::DailySummary;

/// Builds the API router over the shared context.
pub fn router(app: App) -> Router {
    Router::new()
        .route(
            "/api/v2/weather",
            get(current_weather)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v2/history/temperature",
            get(history_temperature)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v2/history/humidity",
            get(history_humidity)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v2/history/rain",
            get(history_rain)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .fallback(unknown_endpoint)
        .with_state(app)
}

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

fn reply_json(status: StatusCode, body: serde_json::Value) -> Response {
    (status, CORS_HEADERS, Json(body)).into_response()
}

/// Browser preflight: CORS headers only.
async fn preflight() -> Response {
    (StatusCode::NO_CONTENT, CORS_HEADERS).into_response()
}

async fn method_not_allowed() -> Response {
    reply_json(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({"error": "method not allowed"}),
    )
}

async fn unknown_endpoint() -> Response {
    reply_json(StatusCode::NOT_FOUND, json!({"error": "unknown endpoint"}))
}

async fn current_weather(State(app): State<App>) -> Response {
    let now = chrono::Utc::now().timestamp();
    reply_json(StatusCode::OK, app.snapshot_json(now))
}

async fn history_temperature(
    State(app): State<App>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let rows = fetch_rows(&app, &query_from(&params));
    reply_json(
        StatusCode::OK,
        json!({ "days": query::project_temperature(&rows) }),
    )
}

async fn history_humidity(
    State(app): State<App>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let rows = fetch_rows(&app, &query_from(&params));
    reply_json(
        StatusCode::OK,
        json!({ "days": query::project_humidity(&rows) }),
    )
}

async fn history_rain(
    State(app): State<App>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let rows = fetch_rows(&app, &query_from(&params));
    reply_json(StatusCode::OK, json!({ "days": query::project_rain(&rows) }))
}

/// Case-insensitive lookup of a query parameter.
fn find_ci<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn query_from(params: &[(String, String)]) -> HistoryQuery {
    HistoryQuery::from_params(
        find_ci(params, "days"),
        find_ci(params, "limit"),
        find_ci(params, "offset"),
    )
}

/// Reads history rows; an unavailable or failing store degrades to an
/// empty result set rather than an error response.
fn fetch_rows(app: &App, query: &HistoryQuery) -> Vec<DailySummary> {
    let now = chrono::Utc::now().timestamp();
    match &app.store {
        Some(store) => store.query_days(query, now).unwrap_or_else(|e| {
            warn!(error = %e, "history query failed");
            Vec::new()
        }),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_find_ci_matches_any_case() {
        let p = params(&[("DaYs", "7"), ("LIMIT", "3")]);
        assert_eq!(find_ci(&p, "days"), Some("7"));
        assert_eq!(find_ci(&p, "limit"), Some("3"));
        assert_eq!(find_ci(&p, "offset"), None);
    }

    #[test]
    fn test_query_from_mixed_case_params() {
        let p = params(&[("Days", "7"), ("Limit", "1"), ("OFFSET", "0")]);
        assert_eq!(
            query_from(&p),
            HistoryQuery::Paged {
                days: 7,
                limit: 1,
                offset: 0
            }
        );
    }

    #[test]
    fn test_query_from_no_params_is_simple() {
        assert_eq!(query_from(&[]), HistoryQuery::Simple);
    }

    #[test]
    fn test_query_from_unrelated_params_is_simple() {
        let p = params(&[("format", "json")]);
        assert_eq!(query_from(&p), HistoryQuery::Simple);
    }
}
