//! Admin routes
//!
//! Health and remote-storage diagnostics endpoints.

use crate::api::AppState;
use crate::service::Diagnostics;
use axum::{extract::State, routing::get, Json, Router};

use super::types::{HealthResponse, SubjectStatus};

// ============================================================================
// ROUTES
// ============================================================================

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/diagnostics", get(get_diagnostics))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.trees.cache();
    let subjects = state
        .config
        .subject_folders
        .iter()
        .map(|(subject, root_id)| SubjectStatus {
            subject: subject.clone(),
            configured: root_id.is_some(),
            cache_age_secs: root_id
                .as_deref()
                .and_then(|id| cache.entry(id))
                .map(|entry| entry.fetched_at.elapsed().as_secs()),
        })
        .collect();

    Json(HealthResponse {
        status: "online",
        name: state.config.server_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        credentials: state.trees.credentials().label(),
        subjects,
    })
}

async fn get_diagnostics(State(state): State<AppState>) -> Json<Diagnostics> {
    let subjects = state
        .config
        .subject_folders
        .iter()
        .map(|(subject, root_id)| (subject.as_str(), root_id.as_deref()))
        .collect::<Vec<_>>();
    Json(state.trees.diagnostics(subjects).await)
}
