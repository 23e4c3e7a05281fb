//! Request transport boundary.
//!
//! The coordinator and client only know [`Transport`]: an opaque capability
//! that turns a [`RequestDescriptor`] into a [`Response`] or a network error.
//! [`ReqwestTransport`] is the production binding; tests may substitute their
//! own implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AuthError;
use crate::types::{RequestDescriptor, Response};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Sends a described request and returns the complete response.
///
/// Timeouts are the transport's concern; a timed-out call surfaces as
/// [`AuthError::Http`] like any other network failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, AuthError>;
}

/// [`Transport`] over a shared [`reqwest::Client`].
///
/// Paths in descriptors are joined onto the configured base URL. Non-2xx
/// statuses are returned as ordinary responses, not errors; classification
/// belongs to the caller.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying [`reqwest::Client`] for raw HTTP requests.
    ///
    /// Requests made through it bypass credential attachment and refresh
    /// recovery entirely.
    pub fn http(&self) -> &Client {
        &self.http
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, AuthError> {
        let url = format!("{}{}", self.base_url, request.path());

        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Response::new(status, headers, body))
    }
}
