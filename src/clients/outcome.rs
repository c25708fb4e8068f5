//! The non-throwing outcome envelope.
//!
//! The `*_outcome` operations on [`HttpGateway`](crate::HttpGateway) share the
//! retry and transport path of the raw operations but never return `Err`.
//! Every response and every failure is folded into an [`OpResult`].

use crate::clients::content::read_body_content;
use crate::clients::errors::{ContentError, HttpError};
use crate::clients::http_response::{HttpResponse, ResponseBody};

/// The result of an outcome operation.
///
/// Exactly one of `output` and `error` is set.
///
/// # Example
///
/// ```rust,ignore
/// let mut result = gateway.get_outcome("https://example.com/items").await;
/// if result.succeeded {
///     println!("{}", result.output_text(true).await?);
/// } else {
///     println!("Request failed: {}", result.message);
/// }
/// ```
#[derive(Debug)]
pub struct OpResult {
    /// `true` if a response with a 2xx status was received.
    pub succeeded: bool,
    /// The response status code, if a response was received.
    pub status: Option<u16>,
    /// The reason phrase of the response, or the error description.
    pub message: String,
    /// The response body, if a response was received.
    pub output: Option<ResponseBody>,
    /// The failure, if no response was received.
    pub error: Option<HttpError>,
}

impl OpResult {
    /// Wraps a received response. The body moves into `output`.
    #[must_use]
    pub fn from_response(response: HttpResponse) -> Self {
        Self {
            succeeded: response.is_success(),
            status: Some(response.status),
            message: response.reason_phrase().to_string(),
            output: Some(response.body),
            error: None,
        }
    }

    /// Wraps a failure.
    #[must_use]
    pub fn from_error(error: HttpError) -> Self {
        Self {
            succeeded: false,
            status: None,
            message: error.to_string(),
            output: None,
            error: Some(error),
        }
    }

    /// Folds a raw result into an envelope.
    #[must_use]
    pub fn from_result(result: Result<HttpResponse, HttpError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(error) => Self::from_error(error),
        }
    }

    /// Reads the captured body as text, optionally as indented JSON.
    ///
    /// Yields an empty string if there is no output, or if formatting was
    /// requested and the body is blank.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MalformedJson`] if formatting was requested and
    /// the body is not JSON, or [`ContentError::Body`] if a pending body
    /// cannot be read.
    pub async fn output_text(&mut self, as_formatted_json: bool) -> Result<String, ContentError> {
        match self.output.as_mut() {
            Some(body) => read_body_content(body, as_formatted_json).await,
            None => Ok(String::new()),
        }
    }
}

impl From<Result<HttpResponse, HttpError>> for OpResult {
    fn from(result: Result<HttpResponse, HttpError>) -> Self {
        Self::from_result(result)
    }
}
