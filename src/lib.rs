//! # Resilient HTTP
//!
//! An async HTTP gateway that wraps every call in bounded exponential-backoff
//! retries, manages default request headers, and prepares JSON request and
//! response content.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`GatewayConfig`] and [`GatewayConfigBuilder`]
//! - The [`HttpGateway`] façade with GET, POST, PUT and DELETE operations
//! - A raw surface returning [`HttpResponse`] or [`HttpError`]
//! - An outcome surface returning an [`OpResult`] envelope that never fails
//! - Default header management shared by all calls on a gateway
//! - Content helpers for preparing request bodies and reading JSON responses
//! - Per-call cancellation through a [`CancellationToken`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use resilient_http::{GatewayConfig, HttpGateway};
//!
//! let config = GatewayConfig::builder()
//!     .max_retries(3)
//!     .retry_exponent(2)
//!     .request_timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! let gateway = HttpGateway::with_config(config);
//! gateway.add_request_header("Accept", "application/json").unwrap();
//! ```
//!
//! ## Making Requests
//!
//! ```rust,ignore
//! use resilient_http::HttpGateway;
//! use resilient_http::clients::{prepare_content, read_response_content};
//!
//! let gateway = HttpGateway::new();
//!
//! // Raw surface: responses of any status, errors for transport failures
//! let mut response = gateway.get("https://example.com/items").await?;
//! let pretty = read_response_content(&mut response, true).await?;
//!
//! // Outcome surface: never fails
//! let content = prepare_content(r#"{"name":"widget"}"#, "application/json")?;
//! let result = gateway.post_outcome("https://example.com/items", content).await;
//! if !result.succeeded {
//!     println!("Request failed: {}", result.message);
//! }
//! ```
//!
//! ## Observing Retries
//!
//! By default each retry is logged through `tracing` at error level. Supply
//! any closure to receive the events instead:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use resilient_http::HttpGateway;
//! use resilient_http::clients::RetryEvent;
//!
//! let gateway = HttpGateway::builder()
//!     .observer(Arc::new(|event: &RetryEvent<'_>| {
//!         eprintln!("retry {} of {}: {}", event.attempt, event.uri, event.cause);
//!     }))
//!     .build();
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: Headers and URIs are validated before sending
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime

pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    CancellationToken, CompletionMode, ContentError, HttpContent, HttpError, HttpGateway,
    HttpGatewayBuilder, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    InvalidHttpRequestError, OpResult, RetryPolicy, TransportError,
};
