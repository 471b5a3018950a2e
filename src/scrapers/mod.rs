//! Fetching and scraping of the Time.com homepage.
//!
//! Scraping is split into two steps that run back to back for each request:
//!
//! 1. **Fetching** ([`fetch`]): One GET of the homepage, decoded to text
//! 2. **Extracting** ([`time`]): Regex scan of that text for article anchors
//!
//! | Module | Role | Notes |
//! |--------|------|-------|
//! | [`fetch`] | HTTP GET + charset decoding | Fixed user agent, 15s timeout, no retries |
//! | [`time`] | Anchor scan, filtering, cleanup | Pure function of the HTML |
//!
//! Neither step keeps state between calls.

pub mod fetch;
pub mod time;
