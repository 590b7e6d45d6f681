//! Shared types for REST API

use serde::Serialize;

use crate::cache::SharedTree;

// ============================================================================
// STATUS RESPONSES
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub version: &'static str,
    /// "ready", "absent" or "malformed"
    pub credentials: &'static str,
    pub subjects: Vec<SubjectStatus>,
}

#[derive(Serialize)]
pub struct SubjectStatus {
    pub subject: String,
    pub configured: bool,
    /// Seconds since the cached tree was fetched, if cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_secs: Option<u64>,
}

// ============================================================================
// TREE RESPONSES
// ============================================================================

/// Trees for every subject, keyed by subject slug
pub type VaultResponse = std::collections::BTreeMap<String, SharedTree>;
