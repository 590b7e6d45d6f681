//! Resource vault routes
//!
//! Folder trees per subject, as rendered by the resource listing.

use crate::api::AppState;
use crate::cache::SharedTree;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tokio::task::JoinSet;

use super::error::AppError;
use super::types::VaultResponse;

// ============================================================================
// ROUTES
// ============================================================================

pub fn vault_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tree/:subject", get(get_subject_tree))
        .route("/api/vault", get(get_vault))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn get_subject_tree(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<SharedTree>, AppError> {
    let root_id = state
        .config
        .folder_for(&subject)
        .ok_or_else(|| AppError::NotFound(format!("Unknown subject: {}", subject)))?
        .unwrap_or_default();

    let tree = state.trees.get_tree(root_id).await?;
    Ok(Json(tree))
}

/// Every subject's tree, fetched concurrently. Any failure fails the response.
async fn get_vault(State(state): State<AppState>) -> Result<Json<VaultResponse>, AppError> {
    let mut tasks = JoinSet::new();
    for (subject, root_id) in &state.config.subject_folders {
        let trees = state.trees.clone();
        let subject = subject.clone();
        let root_id = root_id.clone().unwrap_or_default();
        tasks.spawn(async move {
            let tree = trees.get_tree(&root_id).await;
            (subject, tree)
        });
    }

    let mut vault = VaultResponse::new();
    while let Some(joined) = tasks.join_next().await {
        let (subject, tree) = joined.map_err(|e| AppError::Internal(e.to_string()))?;
        vault.insert(subject, tree?);
    }
    Ok(Json(vault))
}
