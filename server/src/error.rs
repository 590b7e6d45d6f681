//! Error taxonomy for tree synchronization

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// No root folder or no credentials configured. Surfaces as an empty tree.
    #[error("configuration absent")]
    ConfigurationAbsent,

    /// Credential material is present but cannot be used.
    #[error("malformed credentials: {0}")]
    CredentialMalformed(String),

    /// Listing a folder failed (network, auth rejection, rate limit, bad status).
    #[error("listing folder {folder_id} failed: {message}")]
    RemoteListing { folder_id: String, message: String },

    /// The remote API answered with data missing expected fields.
    #[error("unexpected response shape for folder {folder_id}: {detail}")]
    UnexpectedShape { folder_id: String, detail: String },

    /// The root-level crawl did not finish within the configured bound.
    #[error("crawl of {root_id} timed out")]
    Timeout { root_id: String },
}

impl SyncError {
    pub fn remote(folder_id: &str, message: impl std::fmt::Display) -> Self {
        SyncError::RemoteListing {
            folder_id: folder_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn shape(folder_id: &str, detail: impl Into<String>) -> Self {
        SyncError::UnexpectedShape {
            folder_id: folder_id.to_string(),
            detail: detail.into(),
        }
    }

    /// Configuration problems are not transient and never worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigurationAbsent | SyncError::CredentialMalformed(_)
        )
    }

    /// UnexpectedShape is a listing failure too.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteListing { .. } | SyncError::UnexpectedShape { .. }
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_vs_remote() {
        assert!(SyncError::ConfigurationAbsent.is_configuration());
        assert!(SyncError::CredentialMalformed("bad base64".into()).is_configuration());
        assert!(!SyncError::remote("abc", "503").is_configuration());

        assert!(SyncError::shape("abc", "missing id").is_remote());
        assert!(!SyncError::Timeout { root_id: "abc".into() }.is_remote());
    }
}
