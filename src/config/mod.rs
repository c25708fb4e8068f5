//! Configuration types for the gateway.
//!
//! This module provides [`GatewayConfig`], the per-gateway settings, and
//! [`GatewayConfigBuilder`] for constructing it.
//!
//! # Defaults
//!
//! - `max_retries`: 3
//! - `retry_exponent`: 2
//! - `backoff_unit`: 1 second, so retry `k` waits `2^k` seconds
//! - `request_timeout`: none (the transport's own default applies)
//! - `user_agent`: none
//! - `default_headers`: empty
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use resilient_http::GatewayConfig;
//!
//! let config = GatewayConfig::builder()
//!     .max_retries(5)
//!     .retry_exponent(3)
//!     .request_timeout(Duration::from_secs(30))
//!     .default_header("Ocp-Apim-Subscription-Key", "my-key")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_retries(), 5);
//! ```

use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::clients::{
    HeaderSet, RetryPolicy, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_EXPONENT,
};
use crate::error::ConfigError;

/// Configuration for an [`HttpGateway`](crate::HttpGateway).
///
/// The diagnostic sink is not part of this value; it is injected on the
/// gateway builder.
///
/// # Thread Safety
///
/// `GatewayConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    max_retries: u32,
    retry_exponent: u32,
    backoff_unit: Duration,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: HeaderSet,
}

impl GatewayConfig {
    /// Creates a new builder for constructing a `GatewayConfig`.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the backoff exponent.
    #[must_use]
    pub const fn retry_exponent(&self) -> u32 {
        self.retry_exponent
    }

    /// Returns the backoff unit.
    #[must_use]
    pub const fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Returns the per-attempt transport timeout, if configured.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns the user agent, if configured.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns the initial default headers.
    #[must_use]
    pub const fn default_headers(&self) -> &HeaderSet {
        &self.default_headers
    }

    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_exponent).with_backoff_unit(self.backoff_unit)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_exponent: DEFAULT_RETRY_EXPONENT,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            request_timeout: None,
            user_agent: None,
            default_headers: HeaderSet::new(),
        }
    }
}

// Verify GatewayConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GatewayConfig>();
};

/// Builder for constructing [`GatewayConfig`] instances.
///
/// Every field is optional; see the [module docs](self) for defaults.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    max_retries: Option<u32>,
    retry_exponent: Option<u32>,
    backoff_unit: Option<Duration>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: Vec<(String, String)>,
}

impl GatewayConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the backoff exponent.
    #[must_use]
    pub const fn retry_exponent(mut self, retry_exponent: u32) -> Self {
        self.retry_exponent = Some(retry_exponent);
        self
    }

    /// Sets the backoff unit.
    #[must_use]
    pub const fn backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = Some(backoff_unit);
        self
    }

    /// Sets the per-attempt transport timeout.
    #[must_use]
    pub const fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    /// Sets the `User-Agent` the default transport sends.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a default header. A later header with the same name wins.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if a default header is not a
    /// valid HTTP header, or [`ConfigError::InvalidUserAgent`] if the user
    /// agent cannot be sent as a header value.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let mut default_headers = HeaderSet::new();
        for (name, value) in &self.default_headers {
            default_headers.add(name, value)?;
        }

        if let Some(user_agent) = &self.user_agent {
            HeaderValue::from_str(user_agent).map_err(|_| ConfigError::InvalidUserAgent {
                user_agent: user_agent.clone(),
            })?;
        }

        Ok(GatewayConfig {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_exponent: self.retry_exponent.unwrap_or(DEFAULT_RETRY_EXPONENT),
            backoff_unit: self.backoff_unit.unwrap_or(DEFAULT_BACKOFF_UNIT),
            request_timeout: self.request_timeout,
            user_agent: self.user_agent,
            default_headers,
        })
    }
}
