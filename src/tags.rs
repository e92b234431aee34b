//! Tag parsing and normalization.
//!
//! Tags arrive as free text ("Alpha, beta ,, gamma"). They are stored on the
//! task as a canonical comma-joined string and, separately, in the `tags`
//! table where the first-seen casing of each tag is kept for suggestions.

use std::collections::HashSet;

/// Separator used when joining tags back into a stored string.
pub const TAG_SEPARATOR: &str = ", ";

/// Split a raw tag string on commas, trimming whitespace and dropping empty
/// segments. Order is preserved; duplicates are not removed.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Case-insensitive identity of a tag.
pub fn tag_key(tag: &str) -> String {
    tag.to_lowercase()
}

/// Remove case-insensitive duplicates, keeping the first occurrence.
pub fn dedupe_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(tag_key(t))).collect()
}

/// Normalize a raw tag string for storage on a task.
/// Returns `None` when no tags remain after parsing.
pub fn normalize_tags(raw: Option<&str>) -> Option<String> {
    let tags = dedupe_tags(parse_tags(raw));
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(TAG_SEPARATOR))
    }
}

/// Sort tags ascending by case-insensitive key.
pub fn sort_tags(tags: &mut [String]) {
    tags.sort_by(|a, b| tag_key(a).cmp(&tag_key(b)).then_with(|| a.cmp(b)));
}
