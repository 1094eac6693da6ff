//! Network transport for form submissions.

pub mod http;

pub use http::HttpTransport;

use crate::form::FormPayload;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Status and body of a submission response, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one form payload to the pronounce endpoint.
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    async fn submit(&self, payload: FormPayload) -> Result<RawResponse>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
