use crate::constants::*;
use crate::failover::FailoverOutcome;
use crate::logging::request_id_middleware;
use crate::main_helper::AppState;
use crate::types::*;
use crate::{health, synthetic};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const BACKEND_PROXY_PREFIX: &str = "/api/backend";

pub fn router(state: Arc<AppState>, max_body_size: usize) -> Router {
    Router::new()
        .route("/api/backend/*path", any(forward_handler))
        .route("/api/generate-image", post(generate_image_handler))
        .route(
            "/api/generate-audience-suggestions",
            post(audience_suggestions_handler),
        )
        .route("/api/sorcerer-init", post(sorcerer_init_handler))
        .route("/health", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn error_body(status: StatusCode, error: impl Into<Value>) -> Response {
    (status, Json(json!({ "error": error.into() }))).into_response()
}

/// Generic passthrough. Upstream statuses and bodies are relayed verbatim;
/// only total exhaustion is answered by the gateway itself.
#[tracing::instrument(name = "gateway.forward", skip_all, fields(method = %method, path = %uri.path()))]
pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(BACKEND_PROXY_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    let request = match ForwardedRequest::new(method, path) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    let bodyless = request.is_bodyless();
    let request = request
        .with_query(uri.query().map(str::to_string))
        .with_content_type(
            headers
                .get(CONTENT_TYPE)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        )
        .with_body(if bodyless { None } else { Some(body) });

    match state.dispatch(&request).await {
        FailoverOutcome::Delivered { response, .. } => response.into_response(),
        FailoverOutcome::Exhausted(log) => error_body(
            StatusCode::BAD_GATEWAY,
            GatewayError::Exhausted(log).to_string(),
        ),
    }
}

/// Backend first, then a direct Gemini call, then a placeholder avatar.
#[tracing::instrument(name = "gateway.generate_image", skip_all)]
pub async fn generate_image_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Avatar route could not read request body: {}", e);
            return placeholder_response(synthetic::error_placeholder(
                &e.to_string(),
                chrono::Utc::now(),
            ));
        }
    };

    let prompt = match payload.get("prompt").and_then(Value::as_str) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return error_body(StatusCode::BAD_REQUEST, "Missing required field: prompt"),
    };

    let request = match ForwardedRequest::post_json(BACKEND_GENERATE_IMAGE_PATH, &json!({ "prompt": prompt })) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Avatar route failed to build backend request: {}", e);
            return placeholder_response(synthetic::error_placeholder(
                &e.inner.to_string(),
                chrono::Utc::now(),
            ));
        }
    };

    let log = match state.dispatch(&request).await {
        FailoverOutcome::Delivered { response, .. } => return relay_image(response),
        FailoverOutcome::Exhausted(log) => log,
    };

    if let Some(gemini) = &state.secondary {
        match gemini.generate_image(&prompt).await {
            Ok(data_url) => {
                tracing::info!("[⚙️  -> ✨] Portrait generated directly by Gemini");
                return placeholder_response(GeneratedArtifact::DirectGeneration { data_url });
            }
            Err(e) => tracing::warn!("[⚙️  -> ✨] Direct Gemini image generation failed: {}", e.inner),
        }
    }

    tracing::warn!("[⚙️  -> 🧩] Serving placeholder avatar");
    placeholder_response(synthetic::image_placeholder(&prompt, &log))
}

fn placeholder_response(artifact: GeneratedArtifact) -> Response {
    (StatusCode::OK, Json(ImageResponse::from(artifact))).into_response()
}

fn relay_image(response: UpstreamResponse) -> Response {
    if !response.status.is_success() {
        let message = response.error_message(format!(
            "Failed to generate image from backend (status {}).",
            response.status.as_u16()
        ));
        return error_body(response.status, message);
    }

    let data = response.json();
    let path = data.get("path").and_then(Value::as_str).map(str::to_string);
    let image_url = path
        .as_deref()
        .filter(|p| p.starts_with('/'))
        .map(|p| format!("{}{}", response.candidate.as_str().trim_end_matches('/'), p));

    let artifact = GeneratedArtifact::Proxied {
        path,
        image_url,
        fallback: data.get("fallback").map(is_truthy).unwrap_or(false),
        fallback_reason: data
            .get("fallback_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    (StatusCode::OK, Json(ImageResponse::from(artifact))).into_response()
}

const MISSING_PROFILE_FIELDS: &str = "Missing required fields: name, tone, background_info";

/// Backend first, then the hosted text model, then keyword heuristics.
#[tracing::instrument(name = "gateway.audience_suggestions", skip_all)]
pub async fn audience_suggestions_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let profile: PersonaProfile = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(_) => return error_body(StatusCode::BAD_REQUEST, MISSING_PROFILE_FIELDS),
    };
    let Some((name, tone, background_info)) = profile.complete() else {
        return error_body(StatusCode::BAD_REQUEST, MISSING_PROFILE_FIELDS);
    };

    let payload = json!({ "name": name, "tone": tone, "background_info": background_info });
    match ForwardedRequest::post_json(BACKEND_AUDIENCE_SUGGESTIONS_PATH, &payload) {
        Ok(request) => match state.dispatch(&request).await {
            FailoverOutcome::Delivered { response, .. } => {
                if !response.status.is_success() {
                    let message = response.error_message(format!(
                        "Failed to generate audience suggestions from backend (status {}).",
                        response.status.as_u16()
                    ));
                    return error_body(response.status, message);
                }
                match serde_json::from_value::<AudienceSuggestions>(response.json()) {
                    Ok(suggestions) => return Json(suggestions).into_response(),
                    Err(e) => tracing::warn!(
                        "Backend {} returned unusable suggestions: {}",
                        response.candidate,
                        e
                    ),
                }
            }
            FailoverOutcome::Exhausted(_) => {}
        },
        Err(e) => tracing::error!("Failed to build suggestion request: {}", e.inner),
    }

    match &state.secondary {
        Some(gemini) => match gemini.suggest_audience(name, tone, background_info).await {
            Ok(suggestions) => return Json(suggestions).into_response(),
            Err(e) => tracing::warn!("[⚙️  -> ✨] Gemini suggestion call failed: {}", e.inner),
        },
        None => tracing::info!("GEMINI_API_KEY not found, using heuristic suggestions"),
    }

    Json(synthetic::heuristic_suggestions(name, tone, background_info)).into_response()
}

/// Persona creation. A reachable backend's answer is final; with no backend
/// at all the caller gets a local-only record instead.
#[tracing::instrument(name = "gateway.sorcerer_init", skip_all)]
pub async fn sorcerer_init_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Init route could not read request body: {}", e);
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Launch route failed before reaching backend.",
            );
        }
    };

    let request = match ForwardedRequest::post_json(BACKEND_INIT_PATH, &payload) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match state.dispatch(&request).await {
        FailoverOutcome::Delivered { response, .. } => {
            if response.status.is_success() {
                (response.status, Json(response.json())).into_response()
            } else {
                let message = response.error_message(format!(
                    "Backend {} failed with status {}.",
                    BACKEND_INIT_PATH,
                    response.status.as_u16()
                ));
                error_body(response.status, message)
            }
        }
        FailoverOutcome::Exhausted(log) => {
            let persona = synthetic::local_persona(&payload, &log, chrono::Utc::now());
            tracing::warn!(
                "[⚙️  -> 🧩] Created local-only persona {} ({})",
                persona.id,
                persona.name
            );
            Json(persona).into_response()
        }
    }
}
