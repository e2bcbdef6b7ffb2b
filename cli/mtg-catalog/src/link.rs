//! Parsing of `Link` response headers used for depaging.
//!
//! The catalog announces further pages as RFC 5988 style links:
//!
//! ```text
//! Link: <https://api.magicthegathering.io/v1/cards?page=2>; rel="next", <...?page=42>; rel="last"
//! ```
//!
//! Parsing is deliberately lenient, segments that don't look like
//! `<url>; rel="relation"` are skipped.

use std::sync::LazyLock;

use reqwest::header::{HeaderMap, LINK};

static LINK_SEGMENT: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"<([^>]*)>\s*;\s*rel\s*=\s*"([^"]*)""#)
        .expect("link segment regex is valid")
});

/// Return the target of the first `rel="next"` link in a header value.
pub fn parse_next(value: &str) -> Option<&str> {
    value.split(',').find_map(|segment| {
        let captures = LINK_SEGMENT.captures(segment)?;
        let rel = captures.get(2)?.as_str();
        if rel != "next" {
            return None;
        }
        captures.get(1).map(|target| target.as_str().trim())
    })
}

/// Return the first `rel="next"` link across all `Link` headers,
/// in the order the headers were received.
///
/// Header values that are not valid UTF-8 are ignored.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(parse_next)
        .map(ToString::to_string)
}
