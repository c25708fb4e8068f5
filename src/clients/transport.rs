//! The transport seam.
//!
//! A [`Transport`] performs one network exchange for a prepared request. The
//! gateway wraps it in the retry executor; transports themselves never retry.
//!
//! [`ReqwestTransport`] is the default implementation. It uses rustls, and
//! decompresses gzip and deflate response bodies transparently.

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::clients::errors::TransportError;
use crate::clients::http_request::{CompletionMode, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::GatewayConfig;
use crate::error::ConfigError;

/// Performs a single HTTP exchange.
///
/// The request already carries the merged default and request headers.
/// Implementations add the content headers of `request.content` themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// The default transport, backed by a [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Builds a client from the transport-related parts of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Transport`] if the client cannot be created
    /// (for example when the TLS backend fails to initialize).
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .gzip(true)
            .deflate(true);

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config.user_agent() {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build().map_err(|e| ConfigError::Transport {
            reason: e.to_string(),
        })?;

        tracing::debug!("Constructed HTTP transport");
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let uri = request.uri.as_str();

        let mut headers = HeaderMap::new();
        request.headers.apply_to(&mut headers);

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), request.uri.clone());
        if let Some(content) = &request.content {
            content.headers().apply_to(&mut headers);
            builder = builder.body(content.body().to_vec());
        }

        let response = builder
            .headers(headers)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(uri, &e))?;

        match request.completion {
            CompletionMode::HeadersRead => Ok(HttpResponse::pending(response)),
            CompletionMode::ContentRead => {
                let status = response.status().as_u16();
                let response_headers = HttpResponse::collect_headers(response.headers());
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::from_reqwest(uri, &e))?;
                Ok(HttpResponse::new(status, response_headers, body.to_vec()))
            }
        }
    }
}
