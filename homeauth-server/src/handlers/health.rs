use axum::{Json, extract::State};
use homeauth_core::sync::SyncStats;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Absent when the sync channel is disabled.
    pub sync: Option<SyncStats>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sync: state.sync.as_ref().map(|queue| queue.stats()),
    })
}
