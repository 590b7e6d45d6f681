//! Tree service: credentials, crawler and cache wired together

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::auth::{self, TokenSource};
use crate::cache::{SharedTree, TreeCache};
use crate::config::Config;
use crate::drive::{DriveClient, FolderLister, RemoteItem};
use crate::error::{SyncError, SyncResult};
use crate::tree::crawl;

/// Children listed per subject by the diagnostics probe
const PROBE_CHILDREN: u32 = 5;

#[derive(Debug, Clone)]
pub enum CredentialStatus {
    Ready { client_email: String },
    Absent,
    Malformed(String),
}

impl CredentialStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialStatus::Ready { .. } => "ready",
            CredentialStatus::Absent => "absent",
            CredentialStatus::Malformed(_) => "malformed",
        }
    }
}

pub struct TreeService {
    lister: Option<Arc<dyn FolderLister>>,
    credentials: CredentialStatus,
    cache: TreeCache,
    crawl_timeout: Duration,
}

impl TreeService {
    /// Resolve credentials and build the remote client. Never fails: missing
    /// or malformed credentials are kept as a status and reported per call.
    pub fn from_config(config: &Config) -> Self {
        let (lister, credentials) = match auth::resolve(config) {
            Ok(creds) => {
                let http = reqwest::Client::new();
                let client_email = creds.client_email.clone();
                let tokens = TokenSource::new(creds, http.clone());
                let client: Arc<dyn FolderLister> =
                    Arc::new(DriveClient::new(&config.drive_api_base, tokens, http));
                tracing::info!(client_email = %client_email, "remote storage credentials resolved");
                (Some(client), CredentialStatus::Ready { client_email })
            }
            Err(SyncError::CredentialMalformed(reason)) => {
                tracing::error!(reason = %reason, "remote storage credentials are malformed");
                (None, CredentialStatus::Malformed(reason))
            }
            Err(_) => {
                tracing::warn!("no remote storage credentials configured, trees will be empty");
                (None, CredentialStatus::Absent)
            }
        };

        Self {
            lister,
            credentials,
            cache: TreeCache::new(config.cache_ttl),
            crawl_timeout: config.crawl_timeout,
        }
    }

    pub fn new(lister: Arc<dyn FolderLister>, cache_ttl: Duration, crawl_timeout: Duration) -> Self {
        Self {
            lister: Some(lister),
            credentials: CredentialStatus::Ready {
                client_email: String::new(),
            },
            cache: TreeCache::new(cache_ttl),
            crawl_timeout,
        }
    }

    pub fn credentials(&self) -> &CredentialStatus {
        &self.credentials
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Tree for a root folder.
    ///
    /// An empty root id or absent credentials give an empty tree. Malformed
    /// credentials and crawl failures are errors; failures are never cached.
    pub async fn get_tree(&self, root_id: &str) -> SyncResult<SharedTree> {
        if root_id.is_empty() {
            tracing::debug!("no root folder configured");
            return Ok(SharedTree::default());
        }

        let lister = match (&self.lister, &self.credentials) {
            (Some(lister), _) => Arc::clone(lister),
            (None, CredentialStatus::Malformed(reason)) => {
                return Err(SyncError::CredentialMalformed(reason.clone()))
            }
            (None, _) => {
                tracing::debug!(root_id, "credentials absent, returning empty tree");
                return Ok(SharedTree::default());
            }
        };

        let timeout = self.crawl_timeout;
        let result = self
            .cache
            .get_or_fetch(root_id, || async move {
                match tokio::time::timeout(timeout, crawl(lister, root_id)).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Timeout {
                        root_id: root_id.to_string(),
                    }),
                }
            })
            .await;

        if let Err(err) = &result {
            let kind = if err.is_configuration() {
                "configuration"
            } else if err.is_remote() {
                "remote"
            } else {
                "timeout"
            };
            tracing::error!(root_id, kind, error = %err, "failed to fetch tree");
        }
        result
    }

    /// Probe credentials and each subject root without touching the cache.
    pub async fn diagnostics<'a, I>(&self, subjects: I) -> Diagnostics
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let (client_email, credential_error) = match &self.credentials {
            CredentialStatus::Ready { client_email } => (Some(client_email.clone()), None),
            CredentialStatus::Absent => (None, None),
            CredentialStatus::Malformed(reason) => (None, Some(reason.clone())),
        };

        let mut probes = Vec::new();
        for (subject, folder_id) in subjects {
            let mut probe = SubjectProbe {
                subject: subject.to_string(),
                folder_id: folder_id.map(str::to_string),
                folder: None,
                children: None,
            };

            if let (Some(lister), Some(folder_id)) = (&self.lister, folder_id) {
                probe.folder = Some(
                    lister
                        .item_info(folder_id)
                        .await
                        .map(ItemSummary::from)
                        .into(),
                );
                probe.children = Some(
                    lister
                        .list_page(folder_id, None, PROBE_CHILDREN)
                        .await
                        .map(|page| page.items.into_iter().map(ItemSummary::from).collect::<Vec<_>>())
                        .into(),
                );
            }
            probes.push(probe);
        }

        Diagnostics {
            credentials: self.credentials.label(),
            client_email,
            credential_error,
            subjects: probes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub credentials: &'static str,
    pub client_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_error: Option<String>,
    pub subjects: Vec<SubjectProbe>,
}

#[derive(Debug, Serialize)]
pub struct SubjectProbe {
    pub subject: String,
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<Probe<ItemSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Probe<Vec<ItemSummary>>>,
}

/// Outcome of one probe; failures are reported inline
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Probe<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> From<SyncResult<T>> for Probe<T> {
    fn from(result: SyncResult<T>) -> Self {
        match result {
            Ok(value) => Probe::Ok(value),
            Err(err) => Probe::Failed {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl From<RemoteItem> for ItemSummary {
    fn from(item: RemoteItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            mime_type: item.mime_type,
        }
    }
}
