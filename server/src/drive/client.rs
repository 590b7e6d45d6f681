use async_trait::async_trait;
use serde::Deserialize;

use super::{FolderLister, ListPage, RemoteItem};
use crate::auth::TokenSource;
use crate::error::{SyncError, SyncResult};

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";
const ITEM_FIELDS: &str = "id, name, mimeType";

/// Authenticated client for the Drive v3 files API
pub struct DriveClient {
    api_base: String,
    http: reqwest::Client,
    tokens: TokenSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListWire {
    files: Option<Vec<FileWire>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileWire {
    id: Option<String>,
    name: Option<String>,
    mime_type: Option<String>,
}

impl FileWire {
    fn into_item(self, folder_id: &str) -> SyncResult<RemoteItem> {
        let id = self
            .id
            .ok_or_else(|| SyncError::shape(folder_id, "item without id"))?;
        let name = self
            .name
            .ok_or_else(|| SyncError::shape(folder_id, format!("item {} without name", id)))?;
        let mime_type = self
            .mime_type
            .ok_or_else(|| SyncError::shape(folder_id, format!("item {} without mimeType", id)))?;
        Ok(RemoteItem {
            id,
            name,
            mime_type,
        })
    }
}

impl DriveClient {
    pub fn new(api_base: &str, tokens: TokenSource, http: reqwest::Client) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
            tokens,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        folder_id: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> SyncResult<T> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| SyncError::remote(folder_id, format!("authentication failed: {}", e)))?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::remote(folder_id, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::remote(folder_id, format!("{}: {}", status, body)));
        }

        resp.json::<T>()
            .await
            .map_err(|e| SyncError::shape(folder_id, e.to_string()))
    }
}

/// `{api_base}/files/{item_id}` with the id escaped as a single path segment.
fn item_url(api_base: &str, item_id: &str) -> SyncResult<reqwest::Url> {
    let mut url = reqwest::Url::parse(api_base)
        .map_err(|e| SyncError::remote(item_id, format!("invalid api base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| SyncError::remote(item_id, "api base cannot hold a path"))?
        .pop_if_empty()
        .push("files")
        .push(item_id);
    Ok(url)
}

/// Listing query for a folder's live children. Quotes in ids are escaped.
fn children_query(folder_id: &str) -> String {
    format!(
        "'{}' in parents and trashed = false",
        folder_id.replace('\\', "\\\\").replace('\'', "\\'")
    )
}

#[async_trait]
impl FolderLister for DriveClient {
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> SyncResult<ListPage> {
        let url = format!("{}/files", self.api_base);
        let q = children_query(folder_id);
        let page_size = page_size.to_string();

        let mut query = vec![
            ("q", q.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let wire: FileListWire = self.get_json(folder_id, &url, &query).await?;
        let files = wire
            .files
            .ok_or_else(|| SyncError::shape(folder_id, "listing without files field"))?;

        let items = files
            .into_iter()
            .map(|f| f.into_item(folder_id))
            .collect::<SyncResult<Vec<_>>>()?;

        Ok(ListPage {
            items,
            next_page_token: wire.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn item_info(&self, item_id: &str) -> SyncResult<RemoteItem> {
        let url = item_url(&self.api_base, item_id)?;
        let query = [("fields", ITEM_FIELDS), ("supportsAllDrives", "true")];
        let wire: FileWire = self.get_json(item_id, url.as_str(), &query).await?;
        wire.into_item(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_query_escapes_quotes() {
        assert_eq!(
            children_query("abc123"),
            "'abc123' in parents and trashed = false"
        );
        assert_eq!(
            children_query("a'b"),
            "'a\\'b' in parents and trashed = false"
        );
    }

    #[test]
    fn test_item_url_escapes_id() {
        let base = "https://www.googleapis.com/drive/v3";
        assert_eq!(
            item_url(base, "abc123").unwrap().as_str(),
            "https://www.googleapis.com/drive/v3/files/abc123"
        );
        assert_eq!(
            item_url(base, "a/b?c#d").unwrap().as_str(),
            "https://www.googleapis.com/drive/v3/files/a%2Fb%3Fc%23d"
        );
        assert!(item_url("not a url", "abc").is_err());
    }

    #[test]
    fn test_wire_page_parsing() {
        let json = r#"{
            "nextPageToken": "tok-2",
            "files": [
                {"id": "1", "name": "2023", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "2", "name": "paper.pdf", "mimeType": "application/pdf"}
            ]
        }"#;
        let wire: FileListWire = serde_json::from_str(json).unwrap();
        assert_eq!(wire.next_page_token.as_deref(), Some("tok-2"));

        let items: Vec<RemoteItem> = wire
            .files
            .unwrap()
            .into_iter()
            .map(|f| f.into_item("root").unwrap())
            .collect();
        assert!(items[0].is_folder());
        assert!(!items[1].is_folder());
    }

    #[test]
    fn test_item_missing_mime_type_is_unexpected_shape() {
        let wire: FileWire = serde_json::from_str(r#"{"id": "9", "name": "x"}"#).unwrap();
        assert!(matches!(
            wire.into_item("root"),
            Err(SyncError::UnexpectedShape { .. })
        ));
    }
}
