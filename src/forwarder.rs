use crate::constants::DEFAULT_TEXT_CONTENT_TYPE;
use crate::str_utils::error_chain;
use crate::types::*;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

/// Performs exactly one call against one candidate.
///
/// Only transport problems (DNS, refused connection, reset while reading the
/// body) come back as [`UpstreamOutcome::NetworkFailure`]. Any HTTP status is a
/// [`UpstreamOutcome::Success`].
pub async fn forward_once(
    client: &reqwest::Client,
    candidate: &CandidateAddress,
    request: &ForwardedRequest,
) -> UpstreamOutcome {
    let url = candidate.join(&request.path, request.query.as_deref());

    let mut builder = client
        .request(request.method.clone(), &url)
        .header(CONTENT_TYPE, request.content_type_or_default());

    if !request.is_bodyless() {
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
    }

    let response = match builder.send().await {
        Ok(r) => r,
        Err(e) => return failure(candidate, &e),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    // Always buffer the whole body before classifying it.
    let raw = match response.text().await {
        Ok(text) => text,
        Err(e) => return failure(candidate, &e),
    };

    tracing::debug!(
        "[⚙️  -> 🗄️ ] {} {} -> {} ({} bytes)",
        request.method,
        url,
        status,
        raw.len()
    );

    UpstreamOutcome::Success(UpstreamResponse {
        candidate: candidate.clone(),
        status,
        body: classify_body(content_type.as_deref(), raw),
    })
}

fn failure(candidate: &CandidateAddress, err: &reqwest::Error) -> UpstreamOutcome {
    UpstreamOutcome::NetworkFailure(NetworkFailure {
        candidate: candidate.clone(),
        message: error_chain(err),
    })
}

/// Declared JSON is parsed (or wrapped on failure); anything else passes
/// through as text with its original content type.
pub fn classify_body(content_type: Option<&str>, raw: String) -> UpstreamBody {
    match content_type {
        Some(ct) if ct.contains("application/json") => UpstreamBody::Structured(ParsedBody::parse(&raw)),
        Some(ct) if !ct.is_empty() => UpstreamBody::Opaque {
            content_type: ct.to_string(),
            text: raw,
        },
        _ => UpstreamBody::Opaque {
            content_type: DEFAULT_TEXT_CONTENT_TYPE.to_string(),
            text: raw,
        },
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        match self.body {
            UpstreamBody::Structured(parsed) => {
                (self.status, axum::Json(parsed.into_value())).into_response()
            }
            UpstreamBody::Opaque { content_type, text } => {
                (self.status, [(CONTENT_TYPE, content_type)], text).into_response()
            }
        }
    }
}
