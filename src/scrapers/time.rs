//! Time.com homepage scraper.
//!
//! Article links are found by scanning the raw homepage HTML with a regex
//! rather than building a DOM. An anchor becomes a [`Story`] only if:
//!
//! 1. Its href, once made absolute, stays on [`BASE_URL`]
//! 2. The href has a slash-delimited numeric segment of 7+ digits (Time's
//!    article IDs, e.g. `https://time.com/7012345/some-slug/`)
//! 3. Its inner text is non-empty after markup, entities and whitespace are
//!    cleaned up
//! 4. No earlier anchor in the page already produced the same link
//!
//! Scanning stops as soon as the requested number of stories is collected.
//!
//! The anchor regex captures inner text non-greedily, so nested or broken
//! markup can yield odd partial matches. That matches how the page has always
//! been scraped and is left as is.

use crate::models::{RawAnchor, Story};
use crate::utils::{collapse_whitespace, strip_tags, unescape_html};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

/// Site root. Links must start with this to count as on-site.
pub const BASE_URL: &str = "https://time.com";

/// How many stories the API returns.
pub const MAX_STORIES: usize = 6;

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a[^>]+href=["'](?P<href>[^"']+)["'][^>]*>(?P<text>.*?)</a>"#).unwrap()
});

static ARTICLE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d{7,}/").unwrap());

/// Every anchor with an href in `html`, in document order.
pub fn anchors(html: &str) -> impl Iterator<Item = RawAnchor<'_>> {
    ANCHOR_RE.captures_iter(html).filter_map(|caps| {
        Some(RawAnchor {
            href: caps.name("href")?.as_str(),
            text: caps.name("text")?.as_str(),
        })
    })
}

/// Make `href` absolute.
///
/// - `//host/path` gets an `https:` scheme
/// - `/path` is appended to the origin of `base`, with `.` and `..`
///   segments resolved
/// - anything else is returned unchanged
///
/// Href characters are never re-encoded: spaces, non-ASCII text and
/// backslashes come through exactly as written in the page.
pub fn normalize_link(href: &str, base: &Url) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        let path_end = href.find(['?', '#']).unwrap_or(href.len());
        let (path, tail) = href.split_at(path_end);
        format!(
            "{}{}{tail}",
            base.origin().ascii_serialization(),
            remove_dot_segments(path)
        )
    } else {
        href.to_string()
    }
}

/// Resolve `.` and `..` in an absolute path. `..` never climbs above the root.
fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut resolved: Vec<&str> = Vec::with_capacity(segments.len());
    for segment in &segments {
        match *segment {
            ".." => {
                resolved.pop();
            }
            "." => {}
            other => resolved.push(other),
        }
    }
    // A trailing dot segment still names a directory.
    if matches!(segments.last(), Some(&".") | Some(&"..")) {
        resolved.push("");
    }

    let joined = resolved.join("/");
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Whether an absolute link is an on-site article link.
pub fn is_article_link(link: &str, base: &str) -> bool {
    link.starts_with(base) && ARTICLE_ID_RE.is_match(link)
}

/// Turn an anchor's inner HTML into a headline.
///
/// Tags are stripped, entities decoded, and whitespace trimmed and collapsed.
/// Returns `None` when nothing readable is left.
pub fn clean_title(text: &str) -> Option<String> {
    let stripped = strip_tags(text);
    let decoded = unescape_html(&stripped);
    let title = collapse_whitespace(&decoded);
    (!title.is_empty()).then_some(title)
}

fn to_story(anchor: RawAnchor<'_>, base: &str, base_url: &Url) -> Option<Story> {
    let link = normalize_link(anchor.href, base_url);
    if !is_article_link(&link, base) {
        return None;
    }
    let title = clean_title(anchor.text)?;
    Some(Story { title, link })
}

/// Extract up to `max_items` stories from `html`, treating `base` as the site root.
///
/// Order follows first appearance in the document. Duplicate links keep the
/// first occurrence's title. A `base` that is not a valid URL yields no
/// stories.
pub fn parse_stories(html: &str, base: &str, max_items: usize) -> Vec<Story> {
    let Ok(base_url) = Url::parse(base) else {
        warn!(base, "Base URL does not parse; nothing can be extracted");
        return Vec::new();
    };

    let stories: Vec<Story> = anchors(html)
        .filter_map(|anchor| to_story(anchor, base, &base_url))
        .unique_by(|story| story.link.clone())
        .take(max_items)
        .collect();
    debug!(base, count = stories.len(), max_items, "Extracted stories");
    stories
}

/// Extract up to `max_items` stories from a Time.com page.
pub fn parse_latest_stories(html: &str, max_items: usize) -> Vec<Story> {
    parse_stories(html, BASE_URL, max_items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn test_anchors_captures_href_and_text() {
        let html = r#"<A class="x" HREF='/1234567/a/'>One</A><a href="/b">Two
        lines</a><a name="top">skip</a>"#;
        let found: Vec<_> = anchors(html).collect();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].href, "/1234567/a/");
        assert_eq!(found[0].text, "One");
        assert_eq!(found[1].href, "/b");
        assert!(found[1].text.contains('\n'));
    }

    #[test]
    fn test_anchors_inner_text_is_non_greedy() {
        let html = r#"<a href="/1">first</a> middle <a href="/2">second</a>"#;
        let texts: Vec<_> = anchors(html).map(|a| a.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(
            normalize_link("//time.com/9999999/x/", &base()),
            "https://time.com/9999999/x/"
        );
        assert_eq!(
            normalize_link("/1234567/my-article/", &base()),
            "https://time.com/1234567/my-article/"
        );
        assert_eq!(
            normalize_link("https://other-domain.com/1234567/", &base()),
            "https://other-domain.com/1234567/"
        );
        assert_eq!(normalize_link("section/world", &base()), "section/world");
        assert_eq!(normalize_link("/", &base()), "https://time.com/");
    }

    #[test]
    fn test_normalize_link_keeps_href_characters() {
        assert_eq!(
            normalize_link("/1234567/café story/", &base()),
            "https://time.com/1234567/café story/"
        );
        assert_eq!(
            normalize_link("/1234567/caf%C3%A9/", &base()),
            "https://time.com/1234567/caf%C3%A9/"
        );
        assert_eq!(
            normalize_link("/\\evil.com/7654321/", &base()),
            "https://time.com/\\evil.com/7654321/"
        );
    }

    #[test]
    fn test_normalize_link_resolves_dot_segments() {
        assert_eq!(normalize_link("/a//b/../c", &base()), "https://time.com/a//c");
        assert_eq!(normalize_link("/../x", &base()), "https://time.com/x");
        assert_eq!(normalize_link("/a/./b/.", &base()), "https://time.com/a/b/");
        assert_eq!(normalize_link("/a/..", &base()), "https://time.com/");
        // Query and fragment are left alone.
        assert_eq!(
            normalize_link("/a/b?x=/../#f", &base()),
            "https://time.com/a/b?x=/../#f"
        );
    }

    #[test]
    fn test_parse_latest_stories_non_ascii_hrefs_stay_distinct() {
        let html = r#"
            <a href="/1234567/café/">Accented</a>
            <a href="/1234567/caf%C3%A9/">Encoded</a>
            <a href="/\evil.com/7654321/">Backslash</a>
        "#;
        let stories = parse_latest_stories(html, MAX_STORIES);
        let links: Vec<_> = stories.iter().map(|s| s.link.as_str()).collect();

        assert_eq!(
            links,
            vec![
                "https://time.com/1234567/café/",
                "https://time.com/1234567/caf%C3%A9/",
                "https://time.com/\\evil.com/7654321/",
            ]
        );
    }

    #[test]
    fn test_is_article_link() {
        assert!(is_article_link("https://time.com/1234567/slug/", BASE_URL));
        assert!(is_article_link("https://time.com/x/12345678/", BASE_URL));
        assert!(!is_article_link("https://time.com/123456/slug/", BASE_URL));
        assert!(!is_article_link("https://time.com/section/world/", BASE_URL));
        // The digits have to be a whole segment, closed by a slash.
        assert!(!is_article_link("https://time.com/1234567", BASE_URL));
        assert!(!is_article_link("https://other-domain.com/1234567/", BASE_URL));
        assert!(!is_article_link("http://time.com/1234567/", BASE_URL));
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(
            clean_title("Hello&nbsp;<b>World</b>").as_deref(),
            Some("Hello World")
        );
        assert_eq!(
            clean_title("\n  <span\nclass=\"h\">Tom &amp; Jerry</span>\t\n").as_deref(),
            Some("Tom & Jerry")
        );
        assert_eq!(clean_title("<img src=\"a.png\">"), None);
        assert_eq!(
            clean_title("Rock &amp roll <i>at&#128;5</i>").as_deref(),
            Some("Rock & roll at€5")
        );
        assert_eq!(clean_title("caf&eacute").as_deref(), Some("café"));
        assert_eq!(clean_title("   &nbsp; "), None);
    }

    #[test]
    fn test_parse_latest_stories_example_anchor() {
        let html = r#"<a href="/1234567/my-article/">Hello&nbsp;<b>World</b></a>"#;
        let stories = parse_latest_stories(html, MAX_STORIES);

        assert_eq!(
            stories,
            vec![Story {
                title: "Hello World".to_string(),
                link: "https://time.com/1234567/my-article/".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_latest_stories_protocol_relative() {
        let html = r#"<a href="//time.com/9999999/x/">X marks the spot</a>"#;
        let stories = parse_latest_stories(html, MAX_STORIES);

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].link, "https://time.com/9999999/x/");
    }

    #[test]
    fn test_parse_latest_stories_dedup_keeps_first() {
        let html = r#"
            <a href="/1234567/story/"><img src="thumb.jpg"></a>
            <a href="/1234567/story/">First title</a>
            <a href="https://time.com/1234567/story/">Second title</a>
        "#;
        let stories = parse_latest_stories(html, MAX_STORIES);

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "First title");
    }

    #[test]
    fn test_parse_latest_stories_skips_offsite_and_navigation() {
        let html = r#"
            <a href="https://other-domain.com/1234567/">Elsewhere</a>
            <a href="/section/politics/">Politics</a>
            <a href="/subscribe">Subscribe</a>
            <a href="mailto:tips@time.com">Tips</a>
        "#;
        assert!(parse_latest_stories(html, MAX_STORIES).is_empty());
    }

    #[test]
    fn test_parse_latest_stories_caps_and_preserves_order() {
        let html: String = (0..10)
            .map(|i| format!(r#"<li><a href="/{}/story-{i}/">Story {i}</a></li>"#, 7000000 + i))
            .collect();
        let stories = parse_latest_stories(&html, MAX_STORIES);

        assert_eq!(stories.len(), MAX_STORIES);
        for (i, story) in stories.iter().enumerate() {
            assert_eq!(story.title, format!("Story {i}"));
            assert_eq!(story.link, format!("https://time.com/{}/story-{i}/", 7000000 + i));
        }
    }

    #[test]
    fn test_parse_latest_stories_zero_cap() {
        let html = r#"<a href="/1234567/a/">A</a>"#;
        assert!(parse_latest_stories(html, 0).is_empty());
    }

    #[test]
    fn test_parse_stories_is_deterministic_and_well_formed() {
        let html = r#"
            <header><a href="/">TIME</a></header>
            <a href='/7011111/one/'>  One
               story </a>
            <a href="//time.com/7022222/two/"><h3>Two&amp;more</h3></a>
            <a href="/7011111/one/">Duplicate</a>
            <a href="/7033333/three/"></a>
            <a href="https://time.com/7044444/four/">Four</a>
        "#;
        let first = parse_latest_stories(html, MAX_STORIES);
        let second = parse_latest_stories(html, MAX_STORIES);
        assert_eq!(first, second);

        let titles: Vec<_> = first.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["One story", "Two&more", "Four"]);

        let links: std::collections::HashSet<_> = first.iter().map(|s| &s.link).collect();
        assert_eq!(links.len(), first.len());
        for story in &first {
            assert_eq!(story.title, story.title.trim());
            assert!(!story.title.contains("  "));
            assert!(is_article_link(&story.link, BASE_URL));
        }
    }

    #[test]
    fn test_parse_stories_with_other_base() {
        let html = r#"<a href="/1234567/a/">On site</a><a href="https://time.com/7654321/b/">Off</a>"#;
        let stories = parse_stories(html, "https://example.org", MAX_STORIES);

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].link, "https://example.org/1234567/a/");
    }
}
