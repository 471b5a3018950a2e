//! Command-line interface definitions for the Time stories server.
//!
//! Only the listener address is configurable, and only through flags. The
//! scraped site, story cap and fetch timeout are compiled in, and no
//! environment variables are read (apart from `RUST_LOG` for log filtering).

use clap::Parser;

/// Command-line arguments for the Time stories server.
///
/// # Examples
///
/// ```sh
/// # Serve on the default 127.0.0.1:5000
/// time_stories
///
/// # Listen on all interfaces, port 8080
/// time_stories --host 0.0.0.0 --port 8080
///
/// # Scrape once and print the JSON
/// time_stories --once
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Scrape the homepage once, print the stories as JSON and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
