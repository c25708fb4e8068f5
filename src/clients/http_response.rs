//! HTTP response types for the gateway.
//!
//! This module provides the [`HttpResponse`] type returned by every raw verb
//! operation, and [`ResponseBody`], which is either fully buffered or still
//! pending on the transport (see [`CompletionMode`](crate::clients::CompletionMode)).
//!
//! The gateway never caches a response; once returned it is owned by the caller.

use std::collections::HashMap;

use crate::clients::errors::TransportError;

/// The body of an [`HttpResponse`].
#[derive(Debug)]
pub enum ResponseBody {
    /// The body has been read in full.
    Buffered(Vec<u8>),
    /// Only the headers have been received; the body is still on the wire.
    Pending(reqwest::Response),
}

impl ResponseBody {
    /// Returns `true` if the body has not been read yet.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns the bytes of a buffered body, or `None` while still pending.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Buffered(bytes) => Some(bytes),
            Self::Pending(_) => None,
        }
    }

    /// Reads a pending body to the end. A buffered body is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Body`] if the transport fails while the body
    /// is being read. The body is left empty in that case.
    pub async fn materialize(&mut self) -> Result<(), TransportError> {
        let bytes = match std::mem::replace(self, Self::Buffered(Vec::new())) {
            Self::Buffered(bytes) => bytes,
            Self::Pending(response) => response
                .bytes()
                .await
                .map_err(|e| TransportError::Body {
                    reason: e.to_string(),
                })?
                .to_vec(),
        };
        *self = Self::Buffered(bytes);
        Ok(())
    }

    /// Reads the body as UTF-8 text. Invalid sequences are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Body`] if a pending body cannot be read.
    pub async fn text(&mut self) -> Result<String, TransportError> {
        self.materialize().await?;
        let bytes = self.as_bytes().unwrap_or_default();
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// An HTTP response received through the gateway.
///
/// Contains the response status code, reason phrase, headers and body.
/// Header names are lowercased; a header may carry multiple values.
#[derive(Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The reason phrase for the status code, if one is known.
    pub reason: Option<String>,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The response body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Creates a response with a buffered body.
    ///
    /// The reason phrase is the canonical one for `status`.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, Vec<String>>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            status,
            reason: canonical_reason(status),
            headers,
            body: ResponseBody::Buffered(body.into()),
        }
    }

    /// Wraps a reqwest response whose body has not been read yet.
    #[must_use]
    pub fn pending(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        Self {
            status,
            reason: canonical_reason(status),
            headers: Self::collect_headers(response.headers()),
            body: ResponseBody::Pending(response),
        }
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the reason phrase, or an empty string if none is known.
    #[must_use]
    pub fn reason_phrase(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }

    /// Returns the first value of the header `name`, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Converts a reqwest header map into a lowercase-keyed multi-value map.
    #[must_use]
    pub fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

fn canonical_reason(status: u16) -> Option<String> {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = HttpResponse::new(code, HashMap::new(), "");
            assert!(
                response.is_success(),
                "Expected is_success() to be true for code {code}"
            );
        }
    }

    #[test]
    fn test_is_success_returns_false_outside_2xx() {
        for code in [199, 301, 304, 400, 404, 408, 429, 500, 503] {
            let response = HttpResponse::new(code, HashMap::new(), "");
            assert!(!response.is_success(), "code {code}");
        }
    }

    #[test]
    fn test_reason_phrase_is_canonical() {
        assert_eq!(HttpResponse::new(404, HashMap::new(), "").reason_phrase(), "Not Found");
        assert_eq!(
            HttpResponse::new(503, HashMap::new(), "").reason_phrase(),
            "Service Unavailable"
        );
        assert_eq!(HttpResponse::new(599, HashMap::new(), "").reason_phrase(), "");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["abc-123".to_string()]);

        let response = HttpResponse::new(200, headers, "");
        assert_eq!(response.header("X-Request-Id"), Some("abc-123"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_collect_headers_keeps_multiple_values() {
        let mut map = reqwest::header::HeaderMap::new();
        map.append("set-cookie", "a=1".parse().unwrap());
        map.append("set-cookie", "b=2".parse().unwrap());

        let headers = HttpResponse::collect_headers(&map);
        assert_eq!(headers.get("set-cookie").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_buffered_body_text() {
        let mut response = HttpResponse::new(200, HashMap::new(), "héllo");
        assert!(!response.body.is_pending());
        assert_eq!(response.body.text().await.unwrap(), "héllo");
    }
}
