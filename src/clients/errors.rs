//! HTTP-specific error types for the gateway.
//!
//! This module contains error types for HTTP operations: transport failures,
//! content handling failures, request validation failures, and the unified
//! [`HttpError`] returned by the raw verb surface.
//!
//! # Error Handling
//!
//! The gateway uses specific error types for different failure scenarios:
//!
//! - [`TransportError`]: The underlying transport could not complete an exchange
//! - [`ContentError`]: A request body could not be prepared or a response body
//!   could not be read or formatted
//! - [`InvalidHttpRequestError`]: A request failed validation before sending
//! - [`HttpError`]: Unified error type encompassing all of the above, plus
//!   caller cancellation
//!
//! Non-success HTTP status codes are *not* errors at this layer. A `404` or a
//! `503` that survived every retry is returned to the caller as a normal
//! [`HttpResponse`](crate::clients::HttpResponse).
//!
//! # Example
//!
//! ```rust,ignore
//! use resilient_http::clients::{HttpError, TransportError};
//!
//! match gateway.get("https://example.com/items").await {
//!     Ok(response) => println!("Status {}", response.status),
//!     Err(HttpError::Cancelled) => println!("Cancelled by caller"),
//!     Err(HttpError::Transport(TransportError::Timeout { .. })) => {
//!         println!("Timed out after all retries");
//!     }
//!     Err(e) => println!("Request failed: {e}"),
//! }
//! ```

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

use crate::clients::headers::InvalidHeaderError;
use crate::error::ConfigError;

/// A failure raised by the transport while performing one exchange.
///
/// The retry layer classifies these into transient and terminal failures;
/// see [`classify`](crate::clients::classify).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange did not complete within the transport's timeout.
    #[error("Request to {uri} timed out")]
    Timeout {
        /// The target URI of the exchange.
        uri: String,
    },

    /// A connection to the remote host could not be established or was reset.
    #[error("Connection to {uri} failed: {reason}")]
    Connect {
        /// The target URI of the exchange.
        uri: String,
        /// Description of the connection failure.
        reason: String,
    },

    /// The exchange was aborted by the transport itself, not by the caller.
    ///
    /// The reqwest transport reports this when hyper cancels a request on
    /// its own, for example when a pooled connection goes away before the
    /// request is dispatched.
    #[error("Request to {uri} was aborted by the transport")]
    Aborted {
        /// The target URI of the exchange.
        uri: String,
    },

    /// Any other transport failure (redirect loops, protocol errors, ...).
    #[error("Request to {uri} failed: {reason}")]
    Request {
        /// The target URI of the exchange.
        uri: String,
        /// Description of the failure.
        reason: String,
    },

    /// The response body could not be read from the transport.
    #[error("Failed to read response body: {reason}")]
    Body {
        /// Description of the failure.
        reason: String,
    },
}

impl TransportError {
    /// Maps a reqwest error onto the transport taxonomy.
    ///
    /// A connection the peer closed or reset mid-exchange is reported as
    /// [`Connect`](Self::Connect), whether it happened while sending the
    /// request or while reading the body. A request hyper cancelled on its
    /// own is reported as [`Aborted`](Self::Aborted). Redirect and builder
    /// failures stay [`Request`](Self::Request).
    #[must_use]
    pub fn from_reqwest(uri: &str, error: &reqwest::Error) -> Self {
        let uri = uri.to_string();
        if error.is_timeout() {
            return Self::Timeout { uri };
        }
        if error.is_connect() {
            return Self::Connect {
                uri,
                reason: error.to_string(),
            };
        }
        if error.is_redirect() || error.is_builder() {
            return Self::Request {
                uri,
                reason: error.to_string(),
            };
        }

        match error.source().and_then(interruption) {
            Some(Interruption::Dropped) => Self::Connect {
                uri,
                reason: error.to_string(),
            },
            Some(Interruption::Cancelled) => Self::Aborted { uri },
            None if error.is_body() || error.is_decode() => Self::Body {
                reason: error.to_string(),
            },
            None => Self::Request {
                uri,
                reason: error.to_string(),
            },
        }
    }
}

/// How an exchange was cut short underneath reqwest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interruption {
    /// The peer closed or reset the connection.
    Dropped,
    /// hyper cancelled the request before it completed.
    Cancelled,
}

/// Walks `error` and its sources looking for a dropped connection.
fn interruption(error: &(dyn StdError + 'static)) -> Option<Interruption> {
    let mut current = Some(error);
    while let Some(cause) = current {
        if let Some(hyper_error) = cause.downcast_ref::<hyper::Error>() {
            if hyper_error.is_incomplete_message() || hyper_error.is_closed() {
                return Some(Interruption::Dropped);
            }
            if hyper_error.is_canceled() {
                return Some(Interruption::Cancelled);
            }
        }
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return Some(Interruption::Dropped);
            }
        }
        current = cause.source();
    }
    None
}

/// Error returned when request content or response content cannot be handled.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Formatted JSON was requested but the body is not valid JSON.
    #[error("Response content is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The media type cannot be used as a `Content-Type` header value.
    #[error("Invalid media type '{media_type}'.")]
    InvalidMediaType {
        /// The media type that was provided.
        media_type: String,
    },

    /// A content header name or value is not a valid HTTP token.
    #[error("Invalid content header '{name}'.")]
    InvalidHeader {
        /// The header name that was provided.
        name: String,
    },

    /// A value could not be serialized to JSON.
    #[error("Failed to serialize value: {reason}")]
    Serialize {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The response body could not be read.
    #[error(transparent)]
    Body(#[from] TransportError),
}

/// Error returned when an HTTP request fails validation.
///
/// This error is raised before a request is sent if it fails validation
/// checks, such as a POST or PUT without content.
///
/// # Example
///
/// ```rust
/// use resilient_http::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::MissingContent {
///     method: "POST".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Cannot use POST without specifying content.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST or PUT request was made without content.
    #[error("Cannot use {method} without specifying content.")]
    MissingContent {
        /// The HTTP method that requires content.
        method: String,
    },

    /// The target URI could not be parsed.
    #[error("Invalid request URI '{uri}': {reason}")]
    InvalidUri {
        /// The URI that was provided.
        uri: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A header name or value is not a valid HTTP token.
    #[error("Invalid request header '{name}'.")]
    InvalidHeader {
        /// The header name that was provided.
        name: String,
    },
}

impl From<InvalidHeaderError> for ContentError {
    fn from(error: InvalidHeaderError) -> Self {
        Self::InvalidHeader { name: error.name }
    }
}

impl From<InvalidHeaderError> for InvalidHttpRequestError {
    fn from(error: InvalidHeaderError) -> Self {
        Self::InvalidHeader { name: error.name }
    }
}

impl From<InvalidHeaderError> for HttpError {
    fn from(error: InvalidHeaderError) -> Self {
        Self::InvalidRequest(error.into())
    }
}

/// Unified error type for all HTTP-related errors.
///
/// The raw verb operations on [`HttpGateway`](crate::HttpGateway) return this
/// type. The outcome operations capture it inside an
/// [`OpResult`](crate::clients::OpResult) instead.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The transport failed, and either the failure was terminal or every
    /// retry was exhausted.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller cancelled the call.
    #[error("The request was cancelled by the caller.")]
    Cancelled,

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Content handling failed.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The gateway could not be configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
