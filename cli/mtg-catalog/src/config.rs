//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://api.magicthegathering.io/v1/";
pub const DEFAULT_STANDARD_URL: &str = "https://whatsinstandard.com/api/v5/sets.json";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for catalog client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    ///
    /// Resource paths (`cards`, `sets`, ...) are joined onto this URL,
    /// a trailing slash is added if missing.
    pub catalog_url: String,
    /// URL of the format-window service listing sets and their standard
    /// legality dates.
    pub standard_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// User agent sent with every request, reqwest's default if unset.
    pub user_agent: Option<String>,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
    /// Deadline for a whole request including reading the body.
    /// `None` disables the deadline.
    pub timeout: Option<Duration>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            standard_url: DEFAULT_STANDARD_URL.to_string(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}
