use std::fmt;

/// A `host:port` relay address, normalized (trimmed, no trailing slash).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Normalizes a raw candidate; returns `None` unless it looks like `host:port`.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_end_matches('/');
        if cleaned.is_empty() || !cleaned.contains(':') || cleaned.contains(char::is_whitespace) {
            return None;
        }
        Some(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root URL used by the liveness check.
    pub fn root_url(&self) -> String {
        format!("http://{}/", self.0)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
