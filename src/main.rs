//! # Time Stories
//!
//! A small JSON API that scrapes the Time.com homepage and returns the latest
//! six article headlines with their links.
//!
//! ## Usage
//!
//! ```sh
//! time_stories --port 5000
//! curl http://127.0.0.1:5000/getTimeStories
//! ```
//!
//! ## Architecture
//!
//! Each request runs the same short pipeline:
//! 1. **Fetching**: One GET of `https://time.com` (15s timeout, no retries)
//! 2. **Extracting**: Regex scan for article anchors, filtered, cleaned and de-duplicated
//! 3. **Serving**: The stories are returned as JSON, or a `{"error": ...}` body on failure

use clap::Parser;
use std::error::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod models;
mod scrapers;
mod utils;

use api::AppState;
use cli::Cli;
use scrapers::fetch::build_client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let state = AppState::new(build_client()?);

    if args.once {
        return run_once(&state).await;
    }

    let bind_addr = args.bind_addr();
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%bind_addr, error = %e, "Failed to bind listener");
            return Err(e.into());
        }
    };

    api::serve(listener, state).await?;
    info!("Server stopped");
    Ok(())
}

/// Scrape once and print the stories to stdout.
async fn run_once(state: &AppState) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    let stories = api::scrape(state).await?;
    println!("{}", serde_json::to_string_pretty(&stories)?);

    let elapsed = start_time.elapsed();
    info!(
        count = stories.len(),
        millis = elapsed.as_millis() as u64,
        "Scrape complete"
    );
    Ok(())
}
