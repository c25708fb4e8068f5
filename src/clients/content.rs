//! Request and response content helpers.
//!
//! - [`prepare_content`] builds a UTF-8 request body tagged with a media type
//! - [`read_response_content`] reads a response body as a string, optionally
//!   re-serialized as indented JSON
//! - [`serialize`] turns any `Serialize` value into a JSON string
//! - [`convert_request_body`] turns a flat JSON object into a key/value map
//!
//! Parsed JSON is held as a [`serde_json::Value`], which is enough to
//! re-serialize without a fixed schema.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clients::errors::ContentError;
use crate::clients::headers::HeaderSet;
use crate::clients::http_response::{HttpResponse, ResponseBody};

const CONTENT_TYPE: &str = "Content-Type";

/// A prepared request body with its own headers.
///
/// Created by [`prepare_content`]. The `Content-Type` header carries the media
/// type and a `charset=utf-8` parameter.
#[derive(Clone, Debug)]
pub struct HttpContent {
    body: Vec<u8>,
    media_type: String,
    headers: HeaderSet,
}

impl HttpContent {
    /// Returns the encoded body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the media type the content was prepared with.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the content headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Sets a content header, replacing any existing value. Blank names are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidHeader`] if the name or value is not a
    /// valid header token.
    pub fn add_content_header(&mut self, name: &str, value: &str) -> Result<(), ContentError> {
        self.headers.add(name, value)?;
        Ok(())
    }

    /// Removes a content header. Blank or absent names are a no-op.
    pub fn remove_content_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Removes every content header, including `Content-Type`.
    pub fn remove_all_content_headers(&mut self) {
        self.headers.clear();
    }
}

/// Encodes `body` as UTF-8 and tags it with `media_type`.
///
/// The body is not checked against the media type's grammar.
///
/// # Errors
///
/// Returns [`ContentError::InvalidMediaType`] if `media_type` cannot be used
/// as a header value.
///
/// # Example
///
/// ```rust
/// use resilient_http::clients::prepare_content;
///
/// let content = prepare_content(r#"{"a":1}"#, "application/json").unwrap();
/// assert_eq!(
///     content.headers().get("content-type"),
///     Some("application/json; charset=utf-8")
/// );
/// ```
pub fn prepare_content(body: &str, media_type: &str) -> Result<HttpContent, ContentError> {
    let media_type = media_type.trim();
    let mut headers = HeaderSet::new();
    if !media_type.is_empty() {
        headers
            .add(CONTENT_TYPE, &format!("{media_type}; charset=utf-8"))
            .map_err(|_| ContentError::InvalidMediaType {
                media_type: media_type.to_string(),
            })?;
    }

    Ok(HttpContent {
        body: body.as_bytes().to_vec(),
        media_type: media_type.to_string(),
        headers,
    })
}

/// Reads the response body as a string.
///
/// Without `as_formatted_json` the text is returned unchanged. With it, a
/// non-blank body is parsed as JSON and re-serialized with indentation, and a
/// blank body yields an empty string. A pending body is read from the
/// transport first.
///
/// # Errors
///
/// Returns [`ContentError::MalformedJson`] if formatting was requested and the
/// body is not JSON, or [`ContentError::Body`] if the body cannot be read.
pub async fn read_response_content(
    response: &mut HttpResponse,
    as_formatted_json: bool,
) -> Result<String, ContentError> {
    read_body_content(&mut response.body, as_formatted_json).await
}

/// Reads `body` as [`read_response_content`] does.
pub(crate) async fn read_body_content(
    body: &mut ResponseBody,
    as_formatted_json: bool,
) -> Result<String, ContentError> {
    let text = body.text().await?;
    if !as_formatted_json {
        return Ok(text);
    }
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    format_json(&text)
}

/// Parses `text` as JSON and returns it indented.
///
/// # Errors
///
/// Returns [`ContentError::MalformedJson`] if `text` is not JSON.
pub fn format_json(text: &str) -> Result<String, ContentError> {
    let value: Value = serde_json::from_str(text)?;
    serde_json::to_string_pretty(&value).map_err(|e| ContentError::Serialize {
        reason: e.to_string(),
    })
}

/// Serializes `value` to JSON, indented when `pretty` is set.
///
/// A value that serializes to JSON `null` (such as `None`) yields an empty
/// string rather than `"null"`.
///
/// # Errors
///
/// Returns [`ContentError::Serialize`] if the value cannot be represented as
/// JSON (for example a map with non-string keys).
///
/// # Example
///
/// ```rust
/// use resilient_http::clients::serialize;
///
/// assert_eq!(serialize(&Some(vec![1, 2]), false).unwrap(), "[1,2]");
/// assert_eq!(serialize(&None::<i32>, false).unwrap(), "");
/// ```
pub fn serialize<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ContentError> {
    let to_error = |e: serde_json::Error| ContentError::Serialize {
        reason: e.to_string(),
    };
    let value = serde_json::to_value(value).map_err(to_error)?;
    if value.is_null() {
        return Ok(String::new());
    }
    if pretty {
        serde_json::to_string_pretty(&value).map_err(to_error)
    } else {
        serde_json::to_string(&value).map_err(to_error)
    }
}

/// Converts a flat JSON object body into a map of keys to values.
///
/// Returns `Ok(None)` if the body is blank or is valid JSON but not an object.
///
/// # Errors
///
/// Returns [`ContentError::MalformedJson`] if the body is not JSON.
pub fn convert_request_body(body: &str) -> Result<Option<Map<String, Value>>, ContentError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(body)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_prepare_content_encodes_utf8_and_tags_media_type() {
        let content = prepare_content("<p>café</p>", "application/xml").unwrap();
        assert_eq!(content.body(), "<p>café</p>".as_bytes());
        assert_eq!(content.media_type(), "application/xml");
        assert_eq!(
            content.headers().get("Content-Type"),
            Some("application/xml; charset=utf-8")
        );
    }

    #[test]
    fn test_prepare_content_does_not_validate_body() {
        let content = prepare_content("not json at all", "application/json").unwrap();
        assert_eq!(content.body(), b"not json at all");
    }

    #[test]
    fn test_prepare_content_rejects_invalid_media_type() {
        let result = prepare_content("{}", "application/\njson");
        assert!(matches!(result, Err(ContentError::InvalidMediaType { .. })));
    }

    #[test]
    fn test_content_headers_replace_and_remove() {
        let mut content = prepare_content("{}", "application/json").unwrap();
        content.add_content_header("Content-Language", "en").unwrap();
        content.add_content_header("content-language", "fr").unwrap();
        assert_eq!(content.headers().get("Content-Language"), Some("fr"));
        assert_eq!(content.headers().len(), 2);

        content.remove_content_header("X-Absent");
        assert_eq!(content.headers().len(), 2);

        content.remove_content_header("Content-Language");
        assert!(!content.headers().contains("content-language"));

        content.remove_all_content_headers();
        assert!(content.headers().is_empty());
    }

    #[tokio::test]
    async fn test_read_formatted_json() {
        let mut response = HttpResponse::new(200, HashMap::new(), r#"{"a":1}"#);
        let text = read_response_content(&mut response, true).await.unwrap();

        assert!(text.contains('\n'));
        assert!(text.contains("\"a\": 1"));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_read_raw_text_is_unchanged() {
        let mut response = HttpResponse::new(200, HashMap::new(), r#"{"a":1}"#);
        let text = read_response_content(&mut response, false).await.unwrap();
        assert_eq!(text, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_read_empty_body_is_empty_regardless_of_flag() {
        let mut response = HttpResponse::new(204, HashMap::new(), "");
        assert_eq!(read_response_content(&mut response, true).await.unwrap(), "");

        let mut response = HttpResponse::new(200, HashMap::new(), "   ");
        assert_eq!(read_response_content(&mut response, true).await.unwrap(), "");
        let mut response = HttpResponse::new(204, HashMap::new(), "");
        assert_eq!(read_response_content(&mut response, false).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_whitespace_body_unformatted_is_unchanged() {
        let mut response = HttpResponse::new(200, HashMap::new(), " \n ");
        assert_eq!(read_response_content(&mut response, false).await.unwrap(), " \n ");
    }

    #[tokio::test]
    async fn test_read_non_json_as_formatted_is_malformed() {
        let mut response = HttpResponse::new(200, HashMap::new(), "<html></html>");
        let result = read_response_content(&mut response, true).await;
        assert!(matches!(result, Err(ContentError::MalformedJson(_))));
    }

    #[test]
    fn test_serialize_null_is_empty() {
        assert_eq!(serialize(&Value::Null, true).unwrap(), "");
        assert_eq!(serialize(&None::<String>, false).unwrap(), "");
    }

    #[test]
    fn test_serialize_compact_and_pretty() {
        let value = json!({"name": "widget", "tags": ["a"]});
        assert_eq!(
            serialize(&value, false).unwrap(),
            r#"{"name":"widget","tags":["a"]}"#
        );
        let pretty = serialize(&value, true).unwrap();
        assert!(pretty.contains("\n  \"name\": \"widget\""));
    }

    #[test]
    fn test_serialize_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(
            serialize(&map, false),
            Err(ContentError::Serialize { .. })
        ));
    }

    #[test]
    fn test_convert_request_body() {
        let map = convert_request_body(r#"{"id": 7, "name": "x", "ok": true}"#)
            .unwrap()
            .unwrap();
        assert_eq!(map.get("id"), Some(&json!(7)));
        assert_eq!(map.get("name"), Some(&json!("x")));
        assert_eq!(map.get("ok"), Some(&json!(true)));

        assert!(convert_request_body("[1,2]").unwrap().is_none());
        assert!(convert_request_body("").unwrap().is_none());
        assert!(matches!(
            convert_request_body("{oops"),
            Err(ContentError::MalformedJson(_))
        ));
    }
}
