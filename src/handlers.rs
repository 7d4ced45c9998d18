//! HTTP handlers for the genres API.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::engine::{GenreEngine, GenreReport};
use crate::error::AppError;
use crate::genres::GenreCounts;
use crate::views;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GenreEngine>,
}

impl AppState {
    pub fn new(engine: GenreEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Query string as ordered key/value pairs; repeated keys are kept.
type QueryPairs = Vec<(String, String)>;

/// First value of `name`, ignoring any repeats.
fn first_param<'a>(pairs: &'a QueryPairs, name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// API response for a genre lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenresResponse {
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "GenreCounts::is_empty")]
    pub genre_counts: GenreCounts,
    #[serde(skip_serializing_if = "is_zero")]
    pub failed_tracks: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl From<GenreReport> for GenresResponse {
    fn from(report: GenreReport) -> Self {
        Self {
            genres: report.genres,
            genre_counts: report.counts,
            failed_tracks: report.failed_tracks,
        }
    }
}

/// True when the preferred media type of the `Accept` header is `text/html`.
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|media| media.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("text/html"))
}

async fn lookup(state: &AppState, url: Option<&str>) -> Result<GenreReport, AppError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("No 'url' query parameter".into()))?;

    Ok(state.engine.resolve_genres(url).await?)
}

/// GET /api/genres - Genres of a track, playlist or shortlink.
pub async fn genres(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Response {
    let html = wants_html(&headers);

    let result = match &query {
        Ok(Query(pairs)) => lookup(&state, first_param(pairs, "url")).await,
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    };

    match result {
        Ok(report) if html => {
            let url = query
                .as_ref()
                .ok()
                .and_then(|Query(pairs)| first_param(pairs, "url"))
                .unwrap_or_default()
                .trim();
            Html(views::genres_page(url, &report)).into_response()
        }
        Ok(report) => (StatusCode::OK, Json(GenresResponse::from(report))).into_response(),
        Err(err) if html => {
            let status = err.status();
            (status, Html(views::error_page(status, &err.message()))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// GET /live - Process is up.
pub async fn live() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /ready - Catalog credentials are still accepted.
pub async fn ready(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state
        .engine
        .catalog()
        .check_readiness()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;

    Ok(StatusCode::OK)
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/api/genres", get(genres))
}
