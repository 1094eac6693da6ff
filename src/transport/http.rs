use super::{RawResponse, SubmitTransport, TransportError};
use crate::config::ClientConfig;
use crate::form::FormPayload;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Proxy;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// reqwest-backed transport.
///
/// Submissions carry no extra headers, no query string and no timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base()?;
        let endpoint = config.endpoint()?;

        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve a media URL the way a page resolves `src`: absolute URLs pass
    /// through, relative ones are joined onto the server base.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base_url.join(url).map_err(|e| {
            Error::validation_with_context(
                format!("Unresolvable media URL: {}", e),
                ErrorContext::new()
                    .with_details(url.to_string())
                    .with_source("transport"),
            )
        })
    }

    /// GET a media resource. Non-success statuses are errors here, unlike submissions.
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        let url = self.resolve(url)?;
        debug!(url = %url, "fetching media");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::runtime_with_context(
                format!("Media request failed with HTTP {}", status.as_u16()),
                ErrorContext::new()
                    .with_details(url.to_string())
                    .with_source("transport"),
            ));
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }
}

#[async_trait]
impl SubmitTransport for HttpTransport {
    async fn submit(&self, payload: FormPayload) -> Result<RawResponse> {
        let fields = payload.len();
        let form = payload.into_multipart()?;
        debug!(endpoint = %self.endpoint, fields, "posting form");

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        Ok(RawResponse { status, body })
    }
}
