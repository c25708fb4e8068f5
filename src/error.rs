//! Error types for gateway configuration.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use resilient_http::{ConfigError, GatewayConfig};
//!
//! let result = GatewayConfig::builder()
//!     .default_header("bad header", "value")
//!     .build();
//! assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
//! ```

use thiserror::Error;

use crate::clients::InvalidHeaderError;

/// Errors that can occur while configuring a gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A default header name or value is not a valid HTTP token.
    #[error("Invalid default header '{name}'. Header names must be valid HTTP tokens and values must be visible ASCII.")]
    InvalidHeader {
        /// The invalid header name that was provided.
        name: String,
    },

    /// The user agent cannot be used as a header value.
    #[error("Invalid user agent '{user_agent}'.")]
    InvalidUserAgent {
        /// The invalid user agent that was provided.
        user_agent: String,
    },

    /// The default transport could not be constructed.
    #[error("Failed to construct HTTP transport: {reason}")]
    Transport {
        /// Why construction failed.
        reason: String,
    },
}

impl From<InvalidHeaderError> for ConfigError {
    fn from(error: InvalidHeaderError) -> Self {
        Self::InvalidHeader { name: error.name }
    }
}
