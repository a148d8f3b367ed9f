use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use core_types::{CycleWindow, LeaderboardEntry};
use serde::Serialize;

use crate::state::{AppState, RefreshStatus};

pub(crate) const PREV_ERROR_BODY: &str = "Failed to fetch previous leaderboard data.";

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/leaderboard/top14", get(leaderboard_current))
        .route("/leaderboard/prev", get(leaderboard_prev))
        .layer(middleware::from_fn(cors_headers))
        .with_state(state)
}

async fn cors_headers(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    res
}

#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
    ts_ms: i64,
    window: Option<CycleWindow>,
    entries: usize,
    refresh: RefreshStatus,
}

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    let snapshot = state.cache.snapshot();
    Json(HealthResp {
        status: "ok",
        ts_ms: Utc::now().timestamp_millis(),
        window: snapshot.window,
        entries: snapshot.entries.len(),
        refresh: state.cache.status(),
    })
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}

async fn leaderboard_current(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.cache.entries())
}

async fn leaderboard_prev(State(state): State<AppState>) -> Response {
    match state.query.get_previous_now().await {
        Ok(entries) => Json(entries).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": PREV_ERROR_BODY})),
        )
            .into_response(),
    }
}
