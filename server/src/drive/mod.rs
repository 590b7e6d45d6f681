//! Remote storage listing contract
//!
//! The crawler only needs two things from the provider: paginated listing of
//! a folder's direct children, and metadata for a single item.

pub mod client;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::error::SyncResult;

pub use client::DriveClient;

/// Type marker the provider uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Maximum children requested per listing page
pub const PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

impl RemoteItem {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub items: Vec<RemoteItem>,
    /// Continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait FolderLister: Send + Sync {
    /// List one page of a folder's direct (non-trashed) children.
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> SyncResult<ListPage>;

    /// Metadata for a single item, used by diagnostics.
    async fn item_info(&self, item_id: &str) -> SyncResult<RemoteItem>;
}
