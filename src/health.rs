use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use crate::AppState;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub candidates: Vec<String>,
    pub secondary: &'static str,
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

/// Reports configuration only. Candidates are not probed: reachability is
/// decided per request by the failover walk.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let candidates = state
        .config
        .candidates()
        .into_iter()
        .map(|c| c.0)
        .collect();

    Json(ReadinessResponse {
        status: "ready",
        candidates,
        secondary: if state.secondary.is_some() { "enabled" } else { "disabled" },
    })
}
