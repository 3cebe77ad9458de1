// Path normalization: folds identifier segments into a placeholder so that
// /users/42 and /users/43 describe the same endpoint.

use crate::error::SkipReason;
use regex::Regex;
use std::sync::LazyLock;

/// Token substituted for numeric and long hex path segments
pub const ID_PLACEHOLDER: &str = "{id}";

/// Grouping key used when a normalized path has no segments
pub const ROOT_SEGMENT: &str = "/";

static ID_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9a-fA-F]{8,}|[0-9]+)$").expect("valid id regex"));

static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("valid slash regex"));

/// Normalize a URL (or bare path) into a canonical endpoint path.
///
/// Scheme and authority are dropped, the query string is stripped, every
/// segment that is purely decimal or hex of 8+ characters becomes `{id}`,
/// slash runs collapse and one trailing slash is removed. Never fails:
/// odd input comes back as a best-effort path.
pub fn normalize(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let path = if url.contains("://") {
        match url.splitn(4, '/').nth(3) {
            Some(rest) => format!("/{}", rest),
            None => ROOT_SEGMENT.to_string(),
        }
    } else {
        url.to_string()
    };

    let path = path.split_once('?').map_or(path.as_str(), |(p, _)| p);

    let folded = path
        .split('/')
        .map(|segment| {
            if ID_SEGMENT.is_match(segment) {
                ID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    let mut normalized = SLASH_RUN.replace_all(&folded, "/").into_owned();
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// First non-empty segment of a normalized path, or `/` for the root
pub fn top_segment(normalized: &str) -> &str {
    normalized
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(ROOT_SEGMENT)
}

/// Split a raw URL into its host (scheme and authority) and raw path.
///
/// The path keeps its query string and is never rewritten, since the site
/// map mirrors what was actually requested. Scheme-less input such as
/// `api.example.com/users` uses the first component as host.
pub fn split_host_path(url: &str) -> Result<(&str, &str), SkipReason> {
    if url.is_empty() {
        return Err(SkipReason::EmptyUrl);
    }

    let authority_start = url.find("://").map(|idx| idx + 3).unwrap_or(0);
    let rest = &url[authority_start..];
    let authority_len = rest.find('/').unwrap_or(rest.len());

    if authority_len == 0 {
        return Err(SkipReason::MissingHost);
    }

    let host_end = authority_start + authority_len;
    let path = match &url[host_end..] {
        "" => ROOT_SEGMENT,
        path => path,
    };

    Ok((&url[..host_end], path))
}

/// Authority component of a URL (`api.example.com:8443` for
/// `https://api.example.com:8443/v1`). `None` when there is no scheme.
pub fn authority(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    Some(rest.split('/').next().unwrap_or(rest))
}
