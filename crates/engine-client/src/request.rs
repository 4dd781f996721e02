//! Building and submitting engine requests.
//!
//! A [`RequestSpec`] describes one logical operation (method, path suffix,
//! query, body). The [`Dispatcher`] qualifies it with the endpoint and API
//! version and submits it through the [`Transport`]: one outbound request per
//! call, never retried.

use std::sync::Arc;

use bytes::Bytes;
use engine::{ApiVersion, EngineError, Endpoint};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::Serialize;
use tracing::debug;

use crate::transport::{HttpResponse, PreparedRequest, Transport};

// ---------------------------------------------------------------------------
// Query values
// ---------------------------------------------------------------------------

/// Conversion of an argument into a query value. `None` means "leave the
/// parameter out".
pub trait QueryValue {
    fn into_query_value(self) -> Option<String>;
}

impl QueryValue for bool {
    fn into_query_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl QueryValue for i64 {
    fn into_query_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl QueryValue for u32 {
    fn into_query_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl QueryValue for &str {
    fn into_query_value(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl QueryValue for String {
    fn into_query_value(self) -> Option<String> {
        Some(self)
    }
}

impl<T: QueryValue> QueryValue for Option<T> {
    fn into_query_value(self) -> Option<String> {
        self.and_then(QueryValue::into_query_value)
    }
}

/// A boolean rendered as `1`/`0`, the form the attach and remove endpoints use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl QueryValue for Flag {
    fn into_query_value(self) -> Option<String> {
        Some(if self.0 { "1" } else { "0" }.to_string())
    }
}

// ---------------------------------------------------------------------------
// RequestSpec
// ---------------------------------------------------------------------------

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Serialised JSON text.
    Json(Bytes),
    /// Opaque bytes with their content type (e.g. a tar archive).
    Raw {
        bytes: Bytes,
        content_type: HeaderValue,
    },
}

/// One logical operation, before it is bound to an endpoint.
///
/// Built fresh for every call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(String, Option<String>)>,
    headers: HeaderMap,
    body: RequestBody,
    expect_json: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            expect_json: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a query parameter. Absent values are recorded and stripped at
    /// dispatch time.
    pub fn query(mut self, key: impl Into<String>, value: impl QueryValue) -> Self {
        self.query.push((key.into(), value.into_query_value()));
        self
    }

    /// Serialises `body` as the JSON request body.
    ///
    /// Fails immediately, before any I/O, if the value cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, EngineError> {
        let text = serde_json::to_vec(body).map_err(|e| EngineError::InvalidRequest {
            message: format!("request body for '{}' is not JSON-encodable: {e}", self.path),
        })?;
        self.body = RequestBody::Json(Bytes::from(text));
        Ok(self)
    }

    /// Uses `bytes` verbatim as the request body.
    pub fn raw(mut self, bytes: impl Into<Bytes>, content_type: HeaderValue) -> Self {
        self.body = RequestBody::Raw {
            bytes: bytes.into(),
            content_type,
        };
        self
    }

    /// Whether the response body is parsed as JSON (default) or returned raw.
    pub fn expect_json(mut self, expect_json: bool) -> Self {
        self.expect_json = expect_json;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn expects_json(&self) -> bool {
        self.expect_json
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Binds request specs to an endpoint and API version and submits them.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: Endpoint,
    version: ApiVersion,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(endpoint: Endpoint, version: ApiVersion, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            version,
            transport,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Qualifies `spec` into a wire-ready request.
    ///
    /// Query parameters without a value, or with an empty one, are dropped.
    pub fn prepare(&self, spec: RequestSpec) -> PreparedRequest {
        let query: Vec<(String, String)> = spec
            .query
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
            .collect();

        let mut path_and_query = format!(
            "/{}/{}",
            self.version.path_segment(),
            spec.path.trim_start_matches('/')
        );
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect();
            path_and_query.push('?');
            path_and_query.push_str(&encoded.join("&"));
        }

        let mut headers = spec.headers;
        let body = match spec.body {
            RequestBody::Empty => None,
            RequestBody::Json(text) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(text)
            }
            RequestBody::Raw {
                bytes,
                content_type,
            } => {
                headers.insert(CONTENT_TYPE, content_type);
                Some(bytes)
            }
        };

        PreparedRequest {
            method: spec.method,
            url: format!("{}{}", self.endpoint, path_and_query),
            path_and_query,
            query,
            headers,
            body,
        }
    }

    /// Submits `spec` and returns once the response head has arrived.
    pub async fn dispatch(&self, spec: RequestSpec) -> Result<HttpResponse, EngineError> {
        let request = self.prepare(spec);
        debug!(method = %request.method, url = %request.url, "dispatching engine request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status, "engine responded");
        Ok(response)
    }
}
