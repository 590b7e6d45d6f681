//! Recursive folder crawl
//!
//! Each folder is listed in full (all pages), filtered, and split into folders
//! and files. Subfolders are crawled concurrently in a `JoinSet`; a folder's
//! node is only assembled once every subfolder task has finished. The first
//! failure aborts the remaining siblings and fails the whole crawl.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::{is_hidden, sort_nodes, TreeNode};
use crate::drive::{FolderLister, RemoteItem, PAGE_SIZE};
use crate::error::{SyncError, SyncResult};

type CrawlFuture = Pin<Box<dyn Future<Output = SyncResult<Vec<TreeNode>>> + Send>>;

/// Crawl the tree rooted at `folder_id`, returning the root's sorted children.
pub async fn crawl(lister: Arc<dyn FolderLister>, folder_id: &str) -> SyncResult<Vec<TreeNode>> {
    crawl_folder(lister, folder_id.to_string()).await
}

/// List every direct child of a folder, following continuation tokens.
pub async fn list_children(lister: &dyn FolderLister, folder_id: &str) -> SyncResult<Vec<RemoteItem>> {
    let mut children = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = lister
            .list_page(folder_id, page_token.as_deref(), PAGE_SIZE)
            .await?;
        children.extend(page.items);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(children)
}

fn crawl_folder(lister: Arc<dyn FolderLister>, folder_id: String) -> CrawlFuture {
    Box::pin(async move {
        let children = list_children(lister.as_ref(), &folder_id).await?;
        let (folders, files): (Vec<RemoteItem>, Vec<RemoteItem>) = children
            .into_iter()
            .filter(|item| !is_hidden(&item.name))
            .partition(RemoteItem::is_folder);

        tracing::debug!(
            folder_id = %folder_id,
            folders = folders.len(),
            files = files.len(),
            "listed folder"
        );

        let mut tasks = JoinSet::new();
        for (index, folder) in folders.iter().enumerate() {
            let lister = Arc::clone(&lister);
            let id = folder.id.clone();
            tasks.spawn(async move { (index, crawl_folder(lister, id).await) });
        }

        let mut subtrees: Vec<Option<Vec<TreeNode>>> = vec![None; folders.len()];
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((index, Ok(children))) => {
                    subtrees[index] = Some(children);
                    continue;
                }
                Ok((_, Err(err))) => err,
                Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
                Err(join_err) => SyncError::remote(&folder_id, format!("subfolder crawl aborted: {}", join_err)),
            };
            // Don't leave siblings running once the result is known to be a failure
            tasks.shutdown().await;
            return Err(outcome);
        }

        let mut nodes: Vec<TreeNode> = folders
            .iter()
            .zip(subtrees)
            .map(|(folder, children)| TreeNode::directory(folder, children.unwrap_or_default()))
            .collect();
        nodes.extend(files.iter().map(TreeNode::file));
        sort_nodes(&mut nodes);

        Ok(nodes)
    })
}
