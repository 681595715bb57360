//! Request decoding for action-dispatched endpoints
//!
//! Each API is a single route. GET requests name their operation in the
//! `action` query parameter; POST and PUT requests carry it in the JSON
//! body next to the operation's own fields.

use axum::{
    body::Bytes,
    extract::Query,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
struct ActionQuery {
    action: Option<String>,
}

/// JSON body fields left after the `action` discriminator is read
#[derive(Debug)]
pub struct Payload(Value);

impl Payload {
    /// Decode into the operation's request record
    pub fn into_request<T: DeserializeOwned>(self) -> Result<T, AppError> {
        serde_json::from_value(self.0)
            .map_err(|e| AppError::validation(format!("Invalid request: {}", e)))
    }
}

/// Parse a request body into its `action` and payload; an empty body
/// counts as `{}`
pub fn parse_body(body: &Bytes) -> Result<(Option<String>, Payload), AppError> {
    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| AppError::validation(format!("Malformed JSON body: {}", e)))?
    };

    if !payload.is_object() {
        return Err(AppError::validation("Request body must be a JSON object"));
    }

    let action = payload
        .get("action")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok((action, Payload(payload)))
}

/// The `action` query parameter, if any
pub fn query_action(uri: &Uri) -> Result<Option<String>, AppError> {
    let Query(query) = Query::<ActionQuery>::try_from_uri(uri)
        .map_err(|e| AppError::validation(e.body_text()))?;
    Ok(query.action)
}

/// Decode the query string into the operation's request record
pub fn query<T: DeserializeOwned>(uri: &Uri) -> Result<T, AppError> {
    Query::<T>::try_from_uri(uri)
        .map(|Query(value)| value)
        .map_err(|e| AppError::validation(e.body_text()))
}

pub fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn with_status<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn test_body_action_and_payload() {
        let body = Bytes::from_static(br#"{"action":"create","name":"x","count":3}"#);
        let (action, payload) = parse_body(&body).unwrap();
        assert_eq!(action.as_deref(), Some("create"));
        let sample: Sample = payload.into_request().unwrap();
        assert_eq!(sample.name, "x");
        assert_eq!(sample.count, 3);
    }

    #[test]
    fn test_empty_body_has_no_action() {
        let (action, _) = parse_body(&Bytes::new()).unwrap();
        assert_eq!(action, None);
    }

    #[test]
    fn test_malformed_body_is_validation_error() {
        let err = parse_body(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = parse_body(&Bytes::from_static(b"[1,2]")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let (_, payload) = parse_body(&Bytes::from_static(br#"{"action":"create"}"#)).unwrap();
        let err = payload.into_request::<Sample>().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("name")));
    }

    #[test]
    fn test_query_decoding() {
        let uri: Uri = "/exchange?action=sample&name=abc&count=7".parse().unwrap();
        assert_eq!(query_action(&uri).unwrap().as_deref(), Some("sample"));
        let sample: Sample = query(&uri).unwrap();
        assert_eq!(sample.name, "abc");
        assert_eq!(sample.count, 7);

        let bare: Uri = "/exchange".parse().unwrap();
        assert_eq!(query_action(&bare).unwrap(), None);
    }
}
