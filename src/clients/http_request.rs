//! HTTP request types for the gateway.
//!
//! This module provides the [`HttpRequest`] type and its builder. A request is
//! built per call and is not retained after the call completes; the retry loop
//! re-sends the same request value on every attempt.

use std::fmt;

use reqwest::Url;

use crate::clients::content::HttpContent;
use crate::clients::errors::InvalidHttpRequestError;
use crate::clients::headers::HeaderSet;

/// HTTP methods supported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns the matching reqwest method.
    #[must_use]
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// When a send is considered complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompletionMode {
    /// The whole response body is read before the response is returned.
    #[default]
    ContentRead,
    /// The response is returned as soon as the headers arrive; the body is
    /// read on demand.
    HeadersRead,
}

/// Conversion into a parsed request URI.
///
/// Implemented for string forms (parsed on conversion) and for an already
/// parsed [`Url`].
pub trait IntoRequestUri {
    /// Parses or passes through the URI.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::InvalidUri`] if the string is not an
    /// absolute URI.
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError>;
}

impl IntoRequestUri for Url {
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError> {
        Ok(self)
    }
}

impl IntoRequestUri for &Url {
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError> {
        Ok(self.clone())
    }
}

impl IntoRequestUri for &str {
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError> {
        Url::parse(self).map_err(|e| InvalidHttpRequestError::InvalidUri {
            uri: self.to_string(),
            reason: e.to_string(),
        })
    }
}

impl IntoRequestUri for String {
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError> {
        self.as_str().into_request_uri()
    }
}

impl IntoRequestUri for &String {
    fn into_request_uri(self) -> Result<Url, InvalidHttpRequestError> {
        self.as_str().into_request_uri()
    }
}

/// An HTTP request to be sent through the gateway.
///
/// Use [`HttpRequest::builder`] to construct requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use resilient_http::clients::{prepare_content, HttpMethod, HttpRequest};
///
/// let get_request = HttpRequest::builder(HttpMethod::Get, "https://example.com/items")
///     .build()
///     .unwrap();
///
/// let post_request = HttpRequest::builder(HttpMethod::Post, "https://example.com/items")
///     .content(prepare_content(r#"{"name":"widget"}"#, "application/json").unwrap())
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub method: HttpMethod,
    /// The absolute target URI.
    pub uri: Url,
    /// Request-scoped headers. These win over the gateway's default headers.
    pub headers: HeaderSet,
    /// The request body, if any.
    pub content: Option<HttpContent>,
    /// When the send is considered complete.
    pub completion: CompletionMode,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, uri: impl IntoRequestUri) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, uri)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::MissingContent`] if the method is
    /// `Post` or `Put` and no content is set.
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if matches!(self.method, HttpMethod::Post | HttpMethod::Put) && self.content.is_none() {
            return Err(InvalidHttpRequestError::MissingContent {
                method: self.method.to_string(),
            });
        }
        Ok(())
    }

    /// Returns the headers to put on the wire: `defaults` overlaid with this
    /// request's own headers.
    #[must_use]
    pub fn effective_headers(&self, defaults: &HeaderSet) -> HeaderSet {
        let mut merged = defaults.clone();
        merged.overlay(&self.headers);
        merged
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: HttpMethod,
    uri: Result<Url, InvalidHttpRequestError>,
    headers: HeaderSet,
    content: Option<HttpContent>,
    completion: CompletionMode,
    error: Option<InvalidHttpRequestError>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, uri: impl IntoRequestUri) -> Self {
        Self {
            method,
            uri: uri.into_request_uri(),
            headers: HeaderSet::new(),
            content: None,
            completion: CompletionMode::default(),
            error: None,
        }
    }

    /// Adds a request-scoped header, replacing any earlier value.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Err(e) = self.headers.add(name, value) {
            self.error.get_or_insert(e.into());
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn content(mut self, content: HttpContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the completion mode.
    #[must_use]
    pub const fn completion(mut self, completion: CompletionMode) -> Self {
        self.completion = completion;
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the URI failed to parse, a
    /// header was invalid, or the request fails [`HttpRequest::verify`].
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let uri = self.uri?;
        if let Some(error) = self.error {
            return Err(error);
        }
        let request = HttpRequest {
            method: self.method,
            uri,
            headers: self.headers,
            content: self.content,
            completion: self.completion,
        };
        request.verify()?;
        Ok(request)
    }
}
