//! Text helpers shared by the extractor and logging.
//!
//! - Markup stripping and whitespace normalization for headline text
//! - String truncation for log previews

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static CHARREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\x0C <&#;]{1,32};?)").unwrap()
});

/// Named references HTML5 still honours without a trailing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren", "deg",
    "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34", "gt",
    "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Remove every `<...>` tag from `s`, including tags that span lines.
///
/// Text between tags is kept verbatim; entities are not decoded here.
pub fn strip_tags(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

/// Decode character references the way an HTML5 parser does in text.
///
/// On top of the exact `&name;` table from `html-escape` this handles:
/// - legacy names without `;` (`&amp roll`, `caf&eacute`), longest match wins
/// - numeric references in the 0x80..=0x9F range, read as windows-1252
/// - NUL, surrogates and out-of-range numbers, which become U+FFFD
/// - noncharacters and control codes, which are dropped
///
/// Unknown references are left as written.
pub fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    CHARREF_RE
        .replace_all(s, |caps: &regex::Captures<'_>| decode_charref(&caps[1]))
        .into_owned()
}

fn decode_charref(reference: &str) -> String {
    if let Some(number) = reference.strip_prefix('#') {
        let number = number.trim_end_matches(';');
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };
        return decode_numeric(code.ok());
    }

    if let Some(decoded) = decode_named(reference) {
        return decoded;
    }
    // Longest legacy name that prefixes the reference, the rest kept verbatim.
    for end in (2..reference.len()).rev() {
        if !reference.is_char_boundary(end) {
            continue;
        }
        let (name, rest) = reference.split_at(end);
        if LEGACY_ENTITIES.contains(&name) {
            if let Some(decoded) = decode_named(name) {
                return decoded + rest;
            }
        }
    }
    format!("&{reference}")
}

/// `name;` through the full entity table, or a bare legacy `name`.
fn decode_named(reference: &str) -> Option<String> {
    let full = match reference.strip_suffix(';') {
        Some(_) => format!("&{reference}"),
        None if LEGACY_ENTITIES.contains(&reference) => format!("&{reference};"),
        None => return None,
    };
    match html_escape::decode_html_entities(&full) {
        std::borrow::Cow::Owned(decoded) => Some(decoded),
        std::borrow::Cow::Borrowed(_) => None,
    }
}

fn decode_numeric(code: Option<u32>) -> String {
    const REPLACEMENT: &str = "\u{FFFD}";
    let Some(code) = code else {
        // Too many digits for any code point.
        return REPLACEMENT.to_string();
    };
    let remapped = match code {
        0x00 => '\u{FFFD}',
        0x0D => '\r',
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        // Unassigned in windows-1252: kept as the C1 control itself.
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => char::from_u32(code).unwrap_or('\u{FFFD}'),
        0xD800..=0xDFFF | 0x11_0000.. => return REPLACEMENT.to_string(),
        0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF => {
            return String::new();
        }
        _ if code & 0xFFFE == 0xFFFE => return String::new(),
        _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
    };
    remapped.to_string()
}

/// Collapse every run of whitespace to a single space and trim both ends.
///
/// Uses Unicode whitespace, so a decoded `&nbsp;` (U+00A0) counts as well.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Hello\n\t World "), "Hello World");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to the nearest
/// char boundary) with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise a truncated version with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}
