//! In-memory `FolderLister` for tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FolderLister, ListPage, RemoteItem, FOLDER_MIME_TYPE};
use crate::error::{SyncError, SyncResult};

#[derive(Default)]
pub struct FakeDrive {
    /// folder id -> pages of children
    pages: HashMap<String, Vec<Vec<RemoteItem>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

pub fn folder(id: &str, name: &str) -> RemoteItem {
    RemoteItem {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: FOLDER_MIME_TYPE.to_string(),
    }
}

pub fn file(id: &str, name: &str) -> RemoteItem {
    RemoteItem {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: "application/octet-stream".to_string(),
    }
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a folder's children as a single page
    pub fn with_folder(self, id: &str, children: Vec<RemoteItem>) -> Self {
        self.with_pages(id, vec![children])
    }

    pub fn with_pages(mut self, id: &str, pages: Vec<Vec<RemoteItem>>) -> Self {
        self.pages.insert(id.to_string(), pages);
        self
    }

    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn heal(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    /// Total `list_page` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests_for(&self, id: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(folder, _)| folder == id)
            .map(|(_, token)| token.clone())
            .collect()
    }
}

#[async_trait]
impl FolderLister for FakeDrive {
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        _page_size: u32,
    ) -> SyncResult<ListPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((folder_id.to_string(), page_token.map(str::to_string)));
        tokio::task::yield_now().await;

        if self.failing.lock().unwrap().contains(folder_id) {
            return Err(SyncError::remote(folder_id, "403 Forbidden"));
        }

        let pages = match self.pages.get(folder_id) {
            Some(pages) => pages,
            None => return Ok(ListPage::default()),
        };

        // Tokens are "page-<n>"
        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| SyncError::remote(folder_id, "bad page token"))?,
        };

        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(ListPage {
            items,
            next_page_token,
        })
    }

    async fn item_info(&self, item_id: &str) -> SyncResult<RemoteItem> {
        if self.failing.lock().unwrap().contains(item_id) {
            return Err(SyncError::remote(item_id, "404 Not Found"));
        }
        Ok(folder(item_id, &format!("folder {}", item_id)))
    }
}
