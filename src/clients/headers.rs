//! Header management for outgoing requests.
//!
//! [`HeaderSet`] backs both the gateway's default request headers and the
//! per-content headers of a single [`HttpContent`](crate::clients::HttpContent).
//! All mutations are idempotent:
//!
//! - adding a header replaces every existing value for that name
//! - removing an absent header is a no-op
//! - blank names are ignored
//!
//! Header names are case-insensitive; `Accept` and `accept` are the same header.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

/// A header name or value that is not a valid HTTP token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid header '{name}'.")]
pub struct InvalidHeaderError {
    /// The header name that was provided.
    pub name: String,
}

/// A set of HTTP headers with replace-on-add semantics.
///
/// # Example
///
/// ```rust
/// use resilient_http::clients::HeaderSet;
///
/// let mut headers = HeaderSet::new();
/// headers.add("X-Api-Key", "first").unwrap();
/// headers.add("x-api-key", "second").unwrap();
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("X-API-KEY"), Some("second"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct HeaderSet {
    headers: HeaderMap,
}

impl HeaderSet {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing values for `name`.
    ///
    /// Blank names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHeaderError`] if the name is not a valid header token
    /// or the value contains characters not allowed in a header value.
    pub fn add(&mut self, name: &str, value: &str) -> Result<(), InvalidHeaderError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let invalid = || InvalidHeaderError {
            name: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

        // insert() drops every previous value for the name
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Removes `name`. Blank or absent names are a no-op.
    pub fn remove(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.headers.remove(name);
    }

    /// Removes every header.
    pub fn clear(&mut self) {
        self.headers.clear();
    }

    /// Returns the value of `name`, if present and visible ASCII.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.keys_len()
    }

    /// Returns `true` if the set holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns the underlying header map.
    #[must_use]
    pub const fn as_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Copies every header of `other` into this set, replacing headers with
    /// the same name.
    pub fn overlay(&mut self, other: &Self) {
        other.apply_to(&mut self.headers);
    }

    /// Copies every header in this set onto `target`, overwriting headers
    /// with the same name.
    pub fn apply_to(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }
}
