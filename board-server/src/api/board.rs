//! REST endpoints: current board state and liveness.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::models::AssignmentEntry;

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub rooms: Vec<AssignmentEntry>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub viewers: usize,
    pub version: Option<u64>,
}

/// Current board state, or JSON `null` before the first snapshot.
pub async fn get_board(State(state): State<AppState>) -> Json<Option<BoardResponse>> {
    let snapshot = state.hub.current_snapshot().await;
    Json(snapshot.map(|s| BoardResponse {
        version: s.version,
        captured_at: s.captured_at,
        rooms: s.entries.into_values().collect(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let version = state.hub.current_snapshot().await.map(|s| s.version);
    Json(HealthResponse {
        status: "ok",
        viewers: state.hub.viewer_count().await,
        version,
    })
}
