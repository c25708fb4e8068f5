//! HTTP client types for resilient request execution.
//!
//! This module provides the gateway façade and the pieces it is built from:
//! request and response types, content preparation, the retry executor and
//! the transport seam.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`HttpGateway`]: The async façade with raw and outcome operations
//! - [`HttpRequest`]: A request to be sent through the gateway
//! - [`HttpResponse`]: A response received from the transport
//! - [`HttpContent`]: A prepared request body with its content headers
//! - [`OpResult`]: The non-throwing outcome envelope
//! - [`RetryExecutor`]: The bounded exponential-backoff retry loop
//! - [`Transport`]: The single-exchange transport seam
//!
//! # Example
//!
//! ```rust,ignore
//! use resilient_http::clients::{prepare_content, HttpGateway, HttpMethod, HttpRequest};
//!
//! let gateway = HttpGateway::new();
//!
//! let request = HttpRequest::builder(HttpMethod::Post, "https://example.com/items")
//!     .content(prepare_content(r#"{"name":"widget"}"#, "application/json")?)
//!     .build()?;
//!
//! let response = gateway.send(request).await?;
//! ```
//!
//! # Retry Behavior
//!
//! Every operation runs through the same retry loop:
//!
//! - **Connect failures, timeouts, transport aborts**: retried
//! - **408 and 5xx responses**: retried
//! - **Other responses (including 429)**: returned immediately
//! - **Malformed requests and unreadable bodies**: returned immediately
//!
//! Retry `k` (starting at 1) waits `backoff_unit * exponent^k`. With the
//! defaults that is 2, 4 and 8 seconds for up to 3 retries.

mod content;
mod errors;
mod gateway;
mod headers;
mod http_request;
mod http_response;
mod outcome;
mod retry;
mod transport;

pub use content::{
    convert_request_body, format_json, prepare_content, read_response_content, serialize,
    HttpContent,
};
pub use errors::{ContentError, HttpError, InvalidHttpRequestError, TransportError};
pub use gateway::{HttpGateway, HttpGatewayBuilder};
pub use headers::{HeaderSet, InvalidHeaderError};
pub use http_request::{CompletionMode, HttpMethod, HttpRequest, HttpRequestBuilder, IntoRequestUri};
pub use http_response::{HttpResponse, ResponseBody};
pub use outcome::OpResult;
pub use retry::{
    classify, classify_error, classify_status, is_retryable_status, FailureClass, NoopObserver,
    RetryCause, RetryContext, RetryEvent, RetryExecutor, RetryObserver, RetryPolicy,
    TracingObserver, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_EXPONENT,
};
pub use transport::{ReqwestTransport, Transport};

pub use reqwest::Url;
pub use tokio_util::sync::CancellationToken;
