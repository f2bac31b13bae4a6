use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractionError;

// Canonical site and its short-link domain.
static POST_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://(?:www\.)?(?:xiaohongshu\.com|xhslink\.com)/[^\s<>"']+"#).unwrap()
});

/// Find the first post link in arbitrary text, e.g. a pasted share message.
///
/// Trailing `.` and `,` belong to the surrounding sentence and are dropped.
/// Later links in the text are ignored.
pub fn locate_post_url(text: &str) -> Result<&str, ExtractionError> {
    POST_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',']))
        .find(|candidate| has_path(candidate))
        .ok_or(ExtractionError::NoUrlFound)
}

// A match like "https://xhslink.com/.," trims down to a bare host.
fn has_path(candidate: &str) -> bool {
    candidate
        .split_once("://")
        .and_then(|(_, rest)| rest.split_once('/'))
        .is_some_and(|(_, path)| !path.is_empty())
}
