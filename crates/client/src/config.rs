//! Connection settings for [`HttpTransport`](crate::HttpTransport).

use crate::http::ConcurrencyLimitConfig;
use crate::{TransportError, TransportResult};
use tracing::debug;
use url::Url;

/// Environment variable holding the API root, e.g. `https://api.example.com/v1/`.
pub const BASE_URL_ENV: &str = "DOCGRAPH_BASE_URL";
/// Environment variable overriding the `User-Agent` header.
pub const USER_AGENT_ENV: &str = "DOCGRAPH_USER_AGENT";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root every request path is joined onto. Always ends in `/`.
    pub base_url: Url,
    pub user_agent: String,
    pub concurrency: Option<ConcurrencyLimitConfig>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> TransportResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            user_agent: default_user_agent(),
            concurrency: None,
        })
    }

    /// Build configuration from the environment.
    ///
    /// Reads [`BASE_URL_ENV`] (falling back to `http://localhost:8080/`),
    /// [`USER_AGENT_ENV`], and the concurrency limit variables documented on
    /// [`ConcurrencyLimitConfig::from_env`].
    ///
    /// ```bash
    /// export DOCGRAPH_BASE_URL=https://api.example.com/v1
    /// export DOCGRAPH_CONCURRENCY_LIMIT_READ=10
    /// ```
    pub fn from_env() -> TransportResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let user_agent = std::env::var(USER_AGENT_ENV).unwrap_or_else(|_| default_user_agent());

        debug!("client configured from environment: base_url={}", base_url);

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            user_agent,
            concurrency: ConcurrencyLimitConfig::from_env(),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_concurrency_limit(mut self, config: ConcurrencyLimitConfig) -> Self {
        self.concurrency = Some(config);
        self
    }

    /// Resolve a request path against the base url. Segments are expected
    /// to be percent-encoded already; `.` and `..` are rejected since URL
    /// resolution would collapse them into a different endpoint.
    pub fn url_for(&self, path: &str) -> TransportResult<Url> {
        let path = path.trim_start_matches('/');
        if path.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(TransportError::Other(format!(
                "path '{}' contains a dot segment and cannot be addressed",
                path
            )));
        }
        Ok(self.base_url.join(path)?)
    }
}

fn default_user_agent() -> String {
    format!("docgraph/{}", env!("CARGO_PKG_VERSION"))
}

// Url::join drops the last path segment unless the base ends in a slash.
fn normalize_base_url(raw: &str) -> TransportResult<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(TransportError::Other(format!(
            "base url cannot carry a path: {}",
            raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
