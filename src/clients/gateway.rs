//! The HTTP gateway façade.
//!
//! [`HttpGateway`] owns one transport, wraps every send in the retry
//! executor, and exposes two operation sets over the same path:
//!
//! - raw operations (`get`, `post`, `put`, `delete`, `send`, ...) return the
//!   transport's response or an [`HttpError`]
//! - outcome operations (`get_outcome`, ..., `send_outcome`) never fail and
//!   return an [`OpResult`] instead
//!
//! # Shared state
//!
//! One gateway may serve many concurrent calls. Two things are shared between
//! them:
//!
//! - the transport, constructed lazily on first use under a [`OnceCell`], so at
//!   most one is ever built
//! - the default header set, behind an [`RwLock`]. Mutations take the write
//!   lock; each call copies the set under the read lock before its first
//!   attempt. This lock is the only synchronization point between calls.
//!
//! Retry state, prepared content and cancellation are owned by each call.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::clients::content::HttpContent;
use crate::clients::errors::HttpError;
use crate::clients::headers::HeaderSet;
use crate::clients::http_request::{CompletionMode, HttpMethod, HttpRequest, IntoRequestUri};
use crate::clients::http_response::HttpResponse;
use crate::clients::outcome::OpResult;
use crate::clients::retry::{RetryExecutor, RetryObserver, TracingObserver};
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::GatewayConfig;
use crate::error::ConfigError;

type TransportFactory =
    Box<dyn Fn(&GatewayConfig) -> Result<Arc<dyn Transport>, ConfigError> + Send + Sync>;

/// A resilient HTTP client.
///
/// # Thread Safety
///
/// `HttpGateway` is `Send + Sync`; share it across tasks with an [`Arc`].
///
/// # Example
///
/// ```rust,ignore
/// use resilient_http::HttpGateway;
/// use resilient_http::clients::{prepare_content, read_response_content};
///
/// let gateway = HttpGateway::new();
/// gateway.add_request_header("Ocp-Apim-Subscription-Key", "my-key")?;
///
/// let mut response = gateway.get("https://example.com/items").await?;
/// println!("{}", read_response_content(&mut response, true).await?);
///
/// let content = prepare_content(r#"{"name":"widget"}"#, "application/json")?;
/// let result = gateway.post_outcome("https://example.com/items", content).await;
/// assert!(result.succeeded);
/// ```
pub struct HttpGateway {
    config: GatewayConfig,
    executor: RetryExecutor,
    default_headers: RwLock<HeaderSet>,
    transport: OnceCell<Arc<dyn Transport>>,
    transport_factory: TransportFactory,
}

// Verify HttpGateway is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpGateway>();
};

impl fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("default_headers", &self.default_headers)
            .field("transport_initialized", &self.transport.initialized())
            .finish_non_exhaustive()
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpGateway {
    /// Creates a gateway with the default configuration, the reqwest
    /// transport and the tracing observer.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a gateway from `config` with the reqwest transport and the
    /// tracing observer.
    #[must_use]
    pub fn with_config(config: GatewayConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Creates a new builder for constructing an `HttpGateway`.
    #[must_use]
    pub fn builder() -> HttpGatewayBuilder {
        HttpGatewayBuilder::new()
    }

    /// Returns the configuration the gateway was built with.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the transport, constructing it on first use.
    ///
    /// Concurrent first calls construct at most one transport.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] if the transport cannot be constructed.
    /// A later call will try again.
    pub async fn transport(&self) -> Result<&Arc<dyn Transport>, HttpError> {
        let transport = self
            .transport
            .get_or_try_init(|| async { (self.transport_factory)(&self.config) })
            .await?;
        Ok(transport)
    }

    // ------------------------------------------------------------------
    // Default request headers
    // ------------------------------------------------------------------

    /// Sets a header sent with every subsequent request, replacing any
    /// existing value. Blank names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] if the name or value is not a
    /// valid header.
    pub fn add_request_header(&self, name: &str, value: &str) -> Result<(), HttpError> {
        self.write_headers().add(name, value)?;
        Ok(())
    }

    /// Stops sending a default header. Blank or absent names are a no-op.
    pub fn remove_request_header(&self, name: &str) {
        self.write_headers().remove(name);
    }

    /// Removes every default header.
    pub fn remove_all_request_headers(&self) {
        self.write_headers().clear();
    }

    /// Returns a copy of the current default headers.
    #[must_use]
    pub fn default_headers(&self) -> HeaderSet {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_headers(&self) -> std::sync::RwLockWriteGuard<'_, HeaderSet> {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Raw operations
    // ------------------------------------------------------------------

    /// Sends `request` through the retry executor.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.send_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Sends `request` through the retry executor, aborting when `cancel`
    /// fires.
    ///
    /// Responses are returned whatever their status; only retryable statuses
    /// are retried.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - the request fails validation (`InvalidRequest`)
    /// - the transport cannot be constructed (`Config`)
    /// - the caller cancelled (`Cancelled`)
    /// - the last attempt failed at the transport level (`Transport`)
    pub async fn send_with_cancellation(
        &self,
        mut request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        request.verify()?;
        let transport = self.transport().await?;
        request.headers = request.effective_headers(&self.default_headers());

        let request = &request;
        self.executor
            .execute(&request.uri, cancel, || transport.send(request))
            .await
    }

    /// Sends a GET request, reading the whole body.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn get(&self, uri: impl IntoRequestUri) -> Result<HttpResponse, HttpError> {
        self.get_with_completion(uri, CompletionMode::ContentRead)
            .await
    }

    /// Sends a GET request with the given completion mode.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn get_with_completion(
        &self,
        uri: impl IntoRequestUri,
        completion: CompletionMode,
    ) -> Result<HttpResponse, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Get, uri)
            .completion(completion)
            .build()?;
        self.send(request).await
    }

    /// Sends a POST request with `content`.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn post(
        &self,
        uri: impl IntoRequestUri,
        content: HttpContent,
    ) -> Result<HttpResponse, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Post, uri)
            .content(content)
            .build()?;
        self.send(request).await
    }

    /// Sends a PUT request with `content`.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn put(
        &self,
        uri: impl IntoRequestUri,
        content: HttpContent,
    ) -> Result<HttpResponse, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Put, uri)
            .content(content)
            .build()?;
        self.send(request).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`send_with_cancellation`](Self::send_with_cancellation).
    pub async fn delete(&self, uri: impl IntoRequestUri) -> Result<HttpResponse, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Delete, uri).build()?;
        self.send(request).await
    }

    // ------------------------------------------------------------------
    // Outcome operations
    // ------------------------------------------------------------------

    /// Sends `request` and folds the result into an [`OpResult`].
    pub async fn send_outcome(&self, request: HttpRequest) -> OpResult {
        self.send(request).await.into()
    }

    /// Sends `request`, aborting when `cancel` fires, and folds the result
    /// into an [`OpResult`].
    pub async fn send_outcome_with_cancellation(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> OpResult {
        self.send_with_cancellation(request, cancel).await.into()
    }

    /// GET, as an [`OpResult`].
    pub async fn get_outcome(&self, uri: impl IntoRequestUri) -> OpResult {
        self.get(uri).await.into()
    }

    /// GET with the given completion mode, as an [`OpResult`].
    pub async fn get_outcome_with_completion(
        &self,
        uri: impl IntoRequestUri,
        completion: CompletionMode,
    ) -> OpResult {
        self.get_with_completion(uri, completion).await.into()
    }

    /// POST, as an [`OpResult`].
    pub async fn post_outcome(&self, uri: impl IntoRequestUri, content: HttpContent) -> OpResult {
        self.post(uri, content).await.into()
    }

    /// PUT, as an [`OpResult`].
    pub async fn put_outcome(&self, uri: impl IntoRequestUri, content: HttpContent) -> OpResult {
        self.put(uri, content).await.into()
    }

    /// DELETE, as an [`OpResult`].
    pub async fn delete_outcome(&self, uri: impl IntoRequestUri) -> OpResult {
        self.delete(uri).await.into()
    }
}

/// Builder for constructing [`HttpGateway`] instances.
///
/// # Defaults
///
/// - `config`: [`GatewayConfig::default`]
/// - `observer`: [`TracingObserver`]
/// - transport: a [`ReqwestTransport`] built lazily from the config
pub struct HttpGatewayBuilder {
    config: GatewayConfig,
    observer: Arc<dyn RetryObserver>,
    transport_factory: TransportFactory,
}

impl fmt::Debug for HttpGatewayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGatewayBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HttpGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpGatewayBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
            observer: Arc::new(TracingObserver),
            transport_factory: Box::new(|config| {
                let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config)?);
                Ok(transport)
            }),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the diagnostic sink notified on every retry.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Uses `transport` instead of the reqwest transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport_factory = Box::new(move |_| Ok(Arc::clone(&transport)));
        self
    }

    /// Uses `factory` to construct the transport on first use.
    #[must_use]
    pub fn transport_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&GatewayConfig) -> Result<Arc<dyn Transport>, ConfigError> + Send + Sync + 'static,
    {
        self.transport_factory = Box::new(factory);
        self
    }

    /// Builds the [`HttpGateway`]. The transport is not constructed yet.
    #[must_use]
    pub fn build(self) -> HttpGateway {
        HttpGateway {
            executor: RetryExecutor::new(self.config.retry_policy(), self.observer),
            default_headers: RwLock::new(self.config.default_headers().clone()),
            config: self.config,
            transport: OnceCell::new(),
            transport_factory: self.transport_factory,
        }
    }
}
