use axum::http::{Method, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing_error::SpanTrace;

/// Base URL of one place the backing service might be listening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CandidateAddress(pub String);

impl CandidateAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins a backend path (and optional raw query, without `?`) onto this base.
    pub fn join(&self, path: &str, query: Option<&str>) -> String {
        let base = self.0.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}/{}?{}", base, path, q),
            None => format!("{}/{}", base, path),
        }
    }
}

impl fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Methods the generic forwarding route accepts.
pub fn is_forwardable(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ]
    .contains(method)
}

/// A request to be replayed against every candidate until one connects.
/// The body is captured once; `Bytes` clones share the same buffer.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

impl ForwardedRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Result<Self> {
        if !is_forwardable(&method) {
            return Err(GatewayError::MethodNotAllowed(method).into());
        }
        Ok(Self {
            method,
            path: path.into(),
            query: None,
            content_type: None,
            body: None,
        })
    }

    /// JSON POST used by the generation-specific routes.
    pub fn post_json(path: impl Into<String>, payload: &serde_json::Value) -> Result<Self> {
        let body = serde_json::to_vec(payload)?;
        Ok(Self::new(Method::POST, path)?
            .with_content_type(Some(crate::constants::DEFAULT_JSON_CONTENT_TYPE.to_string()))
            .with_body(Some(Bytes::from(body))))
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type.filter(|c| !c.is_empty());
        self
    }

    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    pub fn is_bodyless(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or(crate::constants::DEFAULT_JSON_CONTENT_TYPE)
    }
}

/// Result of parsing a payload that claims to be JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Parsed(serde_json::Value),
    Malformed(String),
}

impl ParsedBody {
    /// Empty input parses to `{}`.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Parsed(serde_json::json!({}));
        }
        match serde_json::from_str(raw) {
            Ok(value) => Self::Parsed(value),
            Err(_) => Self::Malformed(raw.to_string()),
        }
    }

    /// Malformed payloads become `{"error": raw}` so callers always get an object.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Parsed(value) => value,
            Self::Malformed(raw) if raw.is_empty() => {
                serde_json::json!({ "error": "Invalid JSON response from backend." })
            }
            Self::Malformed(raw) => serde_json::json!({ "error": raw }),
        }
    }
}

/// Classified upstream body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Structured(ParsedBody),
    Opaque { content_type: String, text: String },
}

/// A candidate completed the exchange. Any status, including 4xx/5xx.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub candidate: CandidateAddress,
    pub status: StatusCode,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// JSON view of the body; opaque text is wrapped like a malformed payload.
    pub fn json(&self) -> serde_json::Value {
        match &self.body {
            UpstreamBody::Structured(parsed) => parsed.clone().into_value(),
            UpstreamBody::Opaque { text, .. } => ParsedBody::parse(text).into_value(),
        }
    }

    /// `detail`, then `error`, then the route-specific fallback message.
    pub fn error_message(&self, fallback: String) -> serde_json::Value {
        let data = self.json();
        ["detail", "error"]
            .iter()
            .filter_map(|key| data.get(*key))
            .find(|v| is_truthy(v))
            .cloned()
            .unwrap_or(serde_json::Value::String(fallback))
    }
}

/// A candidate could not be reached at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFailure {
    pub candidate: CandidateAddress,
    pub message: String,
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.candidate, self.message)
    }
}

#[derive(Debug, Clone)]
pub enum UpstreamOutcome {
    Success(UpstreamResponse),
    NetworkFailure(NetworkFailure),
}

/// Per-candidate transport failures, in attempt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkErrorLog(pub Vec<NetworkFailure>);

impl NetworkErrorLog {
    pub fn push(&mut self, failure: NetworkFailure) {
        self.0.push(failure);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.iter().map(|f| f.to_string()).collect()
    }
}

impl fmt::Display for NetworkErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("connection failed");
        }
        f.write_str(&self.entries().join(" | "))
    }
}

/// Where a generated image came from.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedArtifact {
    Proxied {
        path: Option<String>,
        image_url: Option<String>,
        fallback: bool,
        fallback_reason: Option<String>,
    },
    DirectGeneration {
        data_url: String,
    },
    Placeholder {
        url: String,
        reason: String,
    },
}

pub const DIRECT_GENERATION_NOTE: &str =
    "Generated via direct Gemini call because backend was unreachable.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl From<GeneratedArtifact> for ImageResponse {
    fn from(artifact: GeneratedArtifact) -> Self {
        match artifact {
            GeneratedArtifact::Proxied {
                path,
                image_url,
                fallback,
                fallback_reason,
            } => Self {
                path,
                image_url,
                fallback,
                fallback_reason,
            },
            GeneratedArtifact::DirectGeneration { data_url } => Self {
                path: None,
                image_url: Some(data_url),
                fallback: false,
                fallback_reason: Some(DIRECT_GENERATION_NOTE.to_string()),
            },
            GeneratedArtifact::Placeholder { url, reason } => Self {
                path: None,
                image_url: Some(url),
                fallback: true,
                fallback_reason: Some(reason),
            },
        }
    }
}

/// Fixed-shape audience targeting proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudienceSuggestions {
    pub goals: Vec<String>,
    pub audience_age_range: [u32; 2],
    pub audience_gender: String,
    pub audience_interests: Vec<String>,
    pub audience_region: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// Inbound body of the audience-suggestion route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub background_info: Option<String>,
}

impl PersonaProfile {
    /// All three fields present and non-empty.
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        Some((
            present(&self.name)?,
            present(&self.tone)?,
            present(&self.background_info)?,
        ))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// JS-style truthiness, used where payload fields are "present or defaulted".
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Method {0} is not forwarded")]
    MethodNotAllowed(Method),

    #[error("Upstream error (status {0}): {1}")]
    Upstream(StatusCode, String),

    #[error("Backend API unreachable ({0})")]
    Exhausted(NetworkErrorLog),

    #[error("Secondary generation failed: {0}")]
    Secondary(String),
}

impl axum::response::IntoResponse for ObservedError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.inner {
            GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            GatewayError::MethodNotAllowed(_) => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED")
            }
            GatewayError::Upstream(s, _) => (*s, "UPSTREAM_ERROR"),
            GatewayError::Exhausted(_) => (StatusCode::BAD_GATEWAY, "BACKEND_UNREACHABLE"),
            GatewayError::Network(_) => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
            GatewayError::Secondary(_) => (StatusCode::BAD_GATEWAY, "SECONDARY_ERROR"),
            GatewayError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
        };
        (
            status,
            axum::Json(serde_json::json!({
                "error": self.inner.to_string(),
                "code": code,
            })),
        )
            .into_response()
    }
}

#[derive(Debug)]
pub struct ObservedError {
    pub inner: GatewayError,
    pub span_trace: SpanTrace,
}

impl std::fmt::Display for ObservedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n\nSpan Trace:\n{}", self.inner, self.span_trace)
    }
}

impl std::error::Error for ObservedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl<E> From<E> for ObservedError
where
    E: Into<GatewayError>,
{
    fn from(error: E) -> Self {
        Self {
            inner: error.into(),
            span_trace: SpanTrace::capture(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObservedError>;
