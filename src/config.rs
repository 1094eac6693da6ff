//! Client configuration
//!
//! Defaults suit a local development server; every knob can be overridden
//! from the environment or through the builder-style setters.

use crate::{Error, ErrorContext, Result};
use std::env;
use url::Url;

/// Path every submission is posted to.
pub const PRONOUNCE_PATH: &str = "/pronounce";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Connection settings for the pronounce server.
///
/// There is intentionally no request timeout here: a submission waits for
/// as long as the server takes to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub proxy_url: Option<String>,
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy_url: None,
            pool_max_idle_per_host: 8,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PRONOUNCE_BASE_URL`, `PRONOUNCE_PROXY_URL`
    /// and `PRONOUNCE_POOL_MAX_IDLE_PER_HOST`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("PRONOUNCE_BASE_URL").unwrap_or(defaults.base_url),
            proxy_url: env::var("PRONOUNCE_PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            pool_max_idle_per_host: env::var("PRONOUNCE_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Parsed base URL. Fails when the configured value is not an absolute http(s) URL.
    pub fn base(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::configuration_with_context(
                format!("Unsupported URL scheme: {}", other),
                ErrorContext::new().with_field_path("base_url"),
            )),
        }
    }

    /// Absolute URL of the submission endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.base()?;
        base.join(PRONOUNCE_PATH).map_err(|e| {
            Error::configuration_with_context(
                format!("Cannot build endpoint URL: {}", e),
                ErrorContext::new().with_field_path("base_url"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_replaces_base_path() {
        let cfg = ClientConfig::default().with_base_url("http://localhost:8080/app/");
        assert_eq!(
            cfg.endpoint().unwrap().as_str(),
            "http://localhost:8080/pronounce"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        let cfg = ClientConfig::default().with_base_url("ftp://example.com");
        assert!(matches!(cfg.base(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn rejects_relative_base() {
        let cfg = ClientConfig::default().with_base_url("/pronounce");
        assert!(cfg.endpoint().is_err());
    }
}
