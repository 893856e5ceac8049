//! Scan target definitions

use serde::{Deserialize, Serialize};
use url::{Origin, Url};

/// A validated absolute URL to scan.
///
/// Obtain one through [`crate::UrlValidator::validate`]. The wrapped URL
/// cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target {
    url: Url,
}

impl Target {
    pub(crate) fn new(url: Url) -> Self {
        Self { url }
    }

    /// Wrap a URL without applying the target policy.
    ///
    /// For trusted callers only, such as test harnesses pointing the engine
    /// at a server on the loopback interface.
    pub fn unchecked(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Scheme, host and port of the target
    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Whether `other` shares scheme, host and port with the target
    pub fn is_same_origin(&self, other: &Url) -> bool {
        self.url.origin() == other.origin()
    }

    /// Target URL without query, fragment or trailing slash, for building
    /// probe paths (`base_url() + "/.env"`)
    pub fn base_url(&self) -> String {
        let mut base = self.url.clone();
        base.set_query(None);
        base.set_fragment(None);
        base.as_str().trim_end_matches('/').to_string()
    }

    /// Join a path onto [`Target::base_url`]
    pub fn join_path(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
