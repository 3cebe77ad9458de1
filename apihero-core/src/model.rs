use serde::{Deserialize, Serialize};
use std::fmt;

fn default_method() -> String {
    "GET".to_string()
}

/// One request as handed over by a record source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Whether the full request payload is available. Requests without one
    /// show up in the site map but never in an export.
    #[serde(default)]
    pub has_body: bool,
}

impl CapturedRequest {
    pub fn new(url: impl Into<String>, method: impl Into<String>, has_body: bool) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            has_body,
        }
    }

    /// Build a request from an already separated host and path
    pub fn from_parts(host: &str, path: &str, method: &str, has_body: bool) -> Self {
        Self::new(format!("{}{}", host, path), method, has_body)
    }
}

/// One position in a source snapshot: a decoded request, or an entry the
/// source could read but not decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntry {
    Request(CapturedRequest),
    Invalid {
        /// The entry as found in the source, for diagnostics
        raw: String,
        detail: String,
    },
}

impl From<CapturedRequest> for SourceEntry {
    fn from(request: CapturedRequest) -> Self {
        SourceEntry::Request(request)
    }
}

/// Position of a request within its source snapshot. Record identity is
/// this position and nothing else: two captures of the same URL are two
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A captured request whose URL split cleanly into host and path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: RecordId,
    pub url: String,
    /// Scheme and authority, e.g. `https://api.example.com`
    pub host: String,
    /// Raw path as requested, query string included
    pub path: String,
    pub method: String,
    pub has_body: bool,
}
