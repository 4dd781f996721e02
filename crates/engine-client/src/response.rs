//! Decoding single-shot responses.
//!
//! The status is classified before the body is handed back: 4xx and 5xx
//! become [`EngineError::ClientError`] / [`EngineError::ServerError`] with the
//! body attached, since the engine explains itself there.

use bytes::{Bytes, BytesMut};
use engine::{EngineError, StatusClass};
use futures_util::StreamExt;
use serde_json::Value;

use crate::transport::HttpResponse;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    Raw(String),
}

impl Decoded {
    /// Returns the JSON value; a raw body is wrapped as a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Raw(text) => Value::String(text),
        }
    }

    /// Returns the body text; a JSON body is re-serialised.
    pub fn into_text(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Raw(text) => text,
        }
    }
}

/// Reads the whole body into one buffer.
///
/// A body announced as zero-length is empty without polling the stream:
/// some transports never signal completion for bodiless responses such as
/// `204 No Content`.
pub async fn collect_body(response: HttpResponse) -> Result<(u16, Bytes), EngineError> {
    let status = response.status;
    if response.content_length == Some(0) {
        return Ok((status, Bytes::new()));
    }

    let mut buffer = BytesMut::new();
    let mut body = response.body;
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok((status, buffer.freeze()))
}

/// Fails with the classified error when `status` is a 4xx/5xx code.
pub fn check_status(status: u16, body: &[u8]) -> Result<(), EngineError> {
    match EngineError::from_status(status, String::from_utf8_lossy(body)) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Consumes the response and produces the decoded body or the classified
/// failure.
pub async fn decode(response: HttpResponse, expect_json: bool) -> Result<Decoded, EngineError> {
    let (status, body) = collect_body(response).await?;
    check_status(status, &body)?;

    if !expect_json {
        return Ok(Decoded::Raw(String::from_utf8_lossy(&body).into_owned()));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Decoded::Json(Value::Null));
    }
    serde_json::from_slice(&body)
        .map(Decoded::Json)
        .map_err(|e| EngineError::InvalidResponse {
            message: format!("status {status} body is not JSON: {e}"),
        })
}

/// Passes a streaming response through when its status is not an error;
/// otherwise buffers the body into the classified error.
pub async fn ensure_success(response: HttpResponse) -> Result<HttpResponse, EngineError> {
    if StatusClass::of(response.status) == StatusClass::Success {
        return Ok(response);
    }
    let (status, body) = collect_body(response).await?;
    check_status(status, &body)?;
    // `check_status` classifies with `StatusClass::of`, so it has failed above.
    Err(EngineError::InvalidResponse {
        message: format!("status {status} is neither a success nor a failure"),
    })
}
