//! HTTP API serving the scraped stories.
//!
//! # Routes
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | `200 text/plain` status message |
//! | `GET /getTimeStories` | `200 application/json` array of `{"title", "link"}` |
//!
//! # Failures
//!
//! Failures are returned as `{"error": "<message>"}`:
//! - Upstream fetch failed: `502`
//! - Page fetched but no stories found: `502`
//! - Anything else: `500`
//!
//! Every call to `/getTimeStories` does exactly one fetch and one extraction.
//! Nothing is cached between requests.

use crate::models::Story;
use crate::scrapers::fetch::{FetchError, fetch_html};
use crate::scrapers::time::{BASE_URL, MAX_STORIES, parse_latest_stories};
use crate::utils::truncate_for_log;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Span, error, info, instrument, warn};

/// Plain-text body served at `/`.
pub const STATUS_MESSAGE: &str =
    "Server is running. Go to /getTimeStories to fetch the latest 6 Time.com stories in JSON.";

/// Per-process state handed to every handler.
///
/// Cloning is cheap: [`Client`] is reference counted internally.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared HTTP client (user agent and timeout already applied).
    pub client: Client,
    /// Page to scrape. Always [`BASE_URL`] outside of tests.
    pub page_url: String,
}

impl AppState {
    /// State that scrapes the live Time.com homepage.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            page_url: BASE_URL.to_string(),
        }
    }
}

/// Errors surfaced to API callers.
///
/// Fetch failures and empty pages both map to `502`; they stay separate
/// variants so the message and the log line say which one happened.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to fetch Time.com: {0}")]
    Fetch(#[from] FetchError),

    #[error("No stories found. Page structure may have changed.")]
    NoStories,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fetch(_) | ApiError::NoStories => StatusCode::BAD_GATEWAY,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Fetch(e) => warn!(%status, error = %e, "Upstream fetch failed"),
            ApiError::NoStories => warn!(%status, "Upstream page yielded no stories"),
            ApiError::Unexpected(e) => error!(%status, error = %e, "Unexpected failure"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/getTimeStories", get(get_time_stories))
        .with_state(state)
}

/// Serve the API on `listener` until Ctrl-C is received.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Server running on http://{addr}/getTimeStories");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("Ctrl-C received; shutting down");
}

async fn root() -> &'static str {
    STATUS_MESSAGE
}

#[instrument(level = "info", skip_all)]
async fn get_time_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let t0 = Instant::now();
    let stories = scrape(&state).await?;
    info!(
        count = stories.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Served Time stories"
    );
    Ok(Json(stories))
}

/// Fetch and extract, applying the empty-result policy.
///
/// Extraction is CPU-bound regex work, so it runs on the blocking pool; a
/// panic there becomes [`ApiError::Unexpected`] instead of taking the
/// connection down.
#[instrument(level = "info", skip_all, fields(page_url = %state.page_url))]
pub async fn scrape(state: &AppState) -> Result<Vec<Story>, ApiError> {
    let html = fetch_html(&state.client, &state.page_url).await?;

    let span = Span::current();
    let stories = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let stories = parse_latest_stories(&html, MAX_STORIES);
            if stories.is_empty() {
                warn!(
                    bytes = html.len(),
                    preview = %truncate_for_log(&html, 300),
                    "No stories extracted from page"
                );
            }
            stories
        })
    })
    .await
    .map_err(|e| ApiError::Unexpected(e.to_string()))?;

    if stories.is_empty() {
        return Err(ApiError::NoStories);
    }
    Ok(stories)
}
