//! Data models for scraped stories.
//!
//! This module defines the two shapes that flow through the pipeline:
//! - [`RawAnchor`]: One anchor match borrowed straight out of the page HTML
//! - [`Story`]: A cleaned, validated story as served by the JSON API

use serde::{Deserialize, Serialize};

/// A single story as returned by `GET /getTimeStories`.
///
/// Stories are built during one extraction run and never mutated afterwards.
/// Within a run every `link` is unique.
///
/// # Fields
///
/// * `title` - Headline text with markup stripped and whitespace collapsed
/// * `link` - Absolute article URL on the scraped site
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Story {
    /// The cleaned headline.
    pub title: String,
    /// The absolute article URL.
    pub link: String,
}

/// An anchor as found in the source HTML, before any normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAnchor<'a> {
    /// The raw `href` attribute value.
    pub href: &'a str,
    /// Everything between the opening and closing tag, markup included.
    pub text: &'a str,
}
