//! Per-root tree cache with time-based expiry
//!
//! Entries are whole trees keyed by root folder id and are replaced, never
//! mutated. Concurrent misses for the same root wait on a per-root lock so
//! only one crawl runs; different roots never contend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::SyncResult;
use crate::tree::TreeNode;

pub type SharedTree = Arc<Vec<TreeNode>>;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub tree: SharedTree,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub struct TreeCache {
    entries: DashMap<String, CacheEntry>,
    /// One lock per root id, held while that root is being crawled
    flights: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
}

impl TreeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            flights: DashMap::new(),
            ttl,
        }
    }

    /// Cached tree for `root_id` if it is still within the TTL
    pub fn fresh(&self, root_id: &str) -> Option<SharedTree> {
        self.entries
            .get(root_id)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| Arc::clone(&entry.tree))
    }

    /// Current entry regardless of freshness
    pub fn entry(&self, root_id: &str) -> Option<CacheEntry> {
        self.entries.get(root_id).map(|entry| entry.value().clone())
    }

    /// Return the fresh tree for `root_id`, or run `fetch` and store its result.
    ///
    /// A failed fetch leaves any previous entry untouched and is returned as is.
    pub async fn get_or_fetch<F, Fut>(&self, root_id: &str, fetch: F) -> SyncResult<SharedTree>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<Vec<TreeNode>>>,
    {
        if let Some(tree) = self.fresh(root_id) {
            tracing::info!(root_id, items = tree.len(), "cache hit");
            return Ok(tree);
        }

        let flight = self
            .flights
            .entry(root_id.to_string())
            .or_default()
            .clone();
        let _guard = flight.lock().await;

        // Filled by another caller while we waited
        if let Some(tree) = self.fresh(root_id) {
            tracing::info!(root_id, items = tree.len(), "cache hit after wait");
            return Ok(tree);
        }

        tracing::info!(root_id, "cache miss, crawling");
        let tree: SharedTree = Arc::new(fetch().await?);
        tracing::info!(root_id, items = tree.len(), "built tree");

        self.entries.insert(
            root_id.to_string(),
            CacheEntry {
                tree: Arc::clone(&tree),
                fetched_at: Instant::now(),
            },
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::fake::{file, FakeDrive};
    use crate::drive::FolderLister;
    use crate::error::SyncError;
    use crate::tree::crawl;

    const TTL: Duration = Duration::from_secs(300);

    fn drive() -> Arc<FakeDrive> {
        Arc::new(
            FakeDrive::new()
                .with_folder("root", vec![file("1", "paper.pdf")])
                .with_folder("other", vec![file("2", "other.pdf")]),
        )
    }

    async fn fetch(cache: &TreeCache, drive: &Arc<FakeDrive>, root: &str) -> SyncResult<SharedTree> {
        let lister: Arc<dyn FolderLister> = drive.clone();
        cache
            .get_or_fetch(root, || async move { crawl(lister, root).await })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = TreeCache::new(TTL);
        let drive = drive();

        let first = fetch(&cache, &drive, "root").await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = fetch(&cache, &drive, "root").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(drive.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_triggers_one_recrawl() {
        let cache = TreeCache::new(TTL);
        let drive = drive();

        fetch(&cache, &drive, "root").await.unwrap();
        let before = cache.entry("root").unwrap().fetched_at;

        tokio::time::advance(TTL).await;
        assert!(cache.fresh("root").is_none());

        fetch(&cache, &drive, "root").await.unwrap();
        fetch(&cache, &drive, "root").await.unwrap();

        assert_eq!(drive.calls(), 2);
        assert!(cache.entry("root").unwrap().fetched_at > before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_leaves_entry_untouched() {
        let cache = TreeCache::new(TTL);
        let drive = drive();

        let original = fetch(&cache, &drive, "root").await.unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        drive.fail_on("root");
        let err = fetch(&cache, &drive, "root").await.unwrap_err();
        assert!(matches!(err, SyncError::RemoteListing { .. }));

        let entry = cache.entry("root").unwrap();
        assert!(Arc::ptr_eq(&entry.tree, &original));
        // Still stale, so it is not served
        assert!(cache.fresh("root").is_none());

        drive.heal("root");
        fetch(&cache, &drive, "root").await.unwrap();
        assert!(cache.fresh("root").is_some());
    }

    #[tokio::test]
    async fn test_failed_first_fetch_writes_nothing() {
        let cache = TreeCache::new(TTL);
        let drive = drive();
        drive.fail_on("root");

        assert!(fetch(&cache, &drive, "root").await.is_err());
        assert!(cache.entry("root").is_none());
    }

    #[tokio::test]
    async fn test_roots_are_independent() {
        let cache = TreeCache::new(TTL);
        let drive = drive();

        let a = fetch(&cache, &drive, "root").await.unwrap();
        let b = fetch(&cache, &drive, "other").await.unwrap();
        assert_eq!(a[0].name(), "paper.pdf");
        assert_eq!(b[0].name(), "other.pdf");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(drive.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_crawl() {
        let cache = Arc::new(TreeCache::new(TTL));
        let drive = drive();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let drive = Arc::clone(&drive);
            handles.push(tokio::spawn(async move {
                fetch(&cache, &drive, "root").await.unwrap()
            }));
        }

        let mut trees = Vec::new();
        for handle in handles {
            trees.push(handle.await.unwrap());
        }

        assert_eq!(drive.calls(), 1);
        assert!(trees.iter().all(|t| Arc::ptr_eq(t, &trees[0])));
    }
}
