//! Homepage fetcher.
//!
//! Performs a single GET with an identifying user agent and a fixed timeout,
//! then decodes the body using the charset declared in `Content-Type`
//! (UTF-8 when absent). Undecodable byte sequences become U+FFFD instead of
//! failing the fetch.
//!
//! There is no retry policy: every failure goes straight back to the caller
//! as a [`FetchError`].

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{CONTENT_TYPE, HeaderMap, ToStrError};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// User agent sent with every request, so the origin does not treat us as an
/// anonymous script.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; TimeLatestStoriesBot/1.0)";

/// Upper bound on a whole request, connect to last body byte.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything that can go wrong while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("unreadable Content-Type header: {0}")]
    InvalidContentType(#[from] ToStrError),

    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
}

/// Build the shared HTTP client with [`USER_AGENT`] and [`FETCH_TIMEOUT`].
pub fn build_client() -> Result<Client, FetchError> {
    build_client_with_timeout(FETCH_TIMEOUT)
}

pub(crate) fn build_client_with_timeout(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(FetchError::Client)
}

/// Fetch `url` and return its body as text.
///
/// # Errors
///
/// - [`FetchError::Request`] on DNS, connect, TLS or timeout failures
/// - [`FetchError::Status`] when the final response is not 2xx
/// - [`FetchError::InvalidContentType`] / [`FetchError::UnknownCharset`] when
///   the declared charset cannot be honoured
/// - [`FetchError::Body`] when the body stream breaks mid-read
#[instrument(level = "info", skip(client))]
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, FetchError> {
    let t0 = Instant::now();
    let resp = client.get(url).send().await.map_err(FetchError::Request)?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%status, "Upstream returned a non-success status");
        return Err(FetchError::Status {
            status,
            url: url.to_string(),
        });
    }

    let encoding = response_encoding(resp.headers())?;
    let bytes = resp.bytes().await.map_err(FetchError::Body)?;
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            charset = encoding.name(),
            "Body contained undecodable bytes; replaced with U+FFFD"
        );
    }

    info!(
        bytes = bytes.len(),
        charset = encoding.name(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Fetched page"
    );
    Ok(text.into_owned())
}

fn response_encoding(headers: &HeaderMap) -> Result<&'static Encoding, FetchError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        debug!("No Content-Type header; assuming UTF-8");
        return Ok(UTF_8);
    };
    match charset_from_content_type(value.to_str()?) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| FetchError::UnknownCharset(label.to_string())),
        None => Ok(UTF_8),
    }
}

/// Pull the `charset` parameter out of a `Content-Type` value.
///
/// The parameter name is matched case-insensitively and surrounding quotes
/// are removed. Returns `None` when no non-empty charset is declared.
pub fn charset_from_content_type(value: &str) -> Option<&str> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches('"').trim();
        (!val.is_empty()).then_some(val)
    })
}
