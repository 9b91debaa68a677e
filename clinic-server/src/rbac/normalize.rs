//! Route pattern normalization
//!
//! Every route that reaches the permission registry or the checker goes
//! through [`normalize_route`], so filesystem patterns (`[id]`), router
//! patterns (`{id}`) and request URLs all land on the same `:id` form.

/// Rewrite a single path segment into its `:param` form
///
/// `[id]`, `[...slug]`, `[[...slug]]`, `{id}` and `{*rest}` become `:id`,
/// `:slug` and `:rest`; anything else is returned unchanged.
pub fn normalize_segment(segment: &str) -> String {
    let inner = if let Some(s) = segment
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
    {
        s
    } else if let Some(s) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        s
    } else if let Some(s) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        s
    } else {
        return segment.to_string();
    };

    let name = inner.trim_start_matches("...").trim_start_matches('*');
    if name.is_empty() {
        return segment.to_string();
    }
    format!(":{name}")
}

/// Canonical form of a route path
///
/// Drops the query string and fragment, rewrites parameter segments to
/// `:name`, and collapses duplicate and trailing slashes. The root stays `/`.
pub fn normalize_route(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());

    let segments: Vec<String> = path[..end]
        .split('/')
        .filter(|s| !s.is_empty())
        .map(normalize_segment)
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}
