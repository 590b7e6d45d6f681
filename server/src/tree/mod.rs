//! Typed folder tree handed to the UI layer
//!
//! Serializes to the JSON shape the resource listing renders:
//! `{name, type: "dir", children}` or `{name, type: "file", path, previewUrl?}`.

pub mod crawler;

use std::cmp::Ordering;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::drive::RemoteItem;

pub use crawler::crawl;

/// OS artifacts that are never shown, besides dot-files
const NOISE_FILENAMES: [&str; 2] = ["Thumbs.db", "desktop.ini"];

/// Preview state of a file. The three states serialize differently:
/// a URL, an explicit `null`, or no `previewUrl` key at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Inline(String),
    Disabled,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory {
        name: String,
        children: Vec<TreeNode>,
    },
    FileLeaf {
        name: String,
        download_path: String,
        preview: Preview,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::FileLeaf { name, .. } => name,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Directory { .. })
    }

    /// Build a file leaf from a remote item, deriving its links from the id.
    pub fn file(item: &RemoteItem) -> Self {
        let lower = item.name.to_lowercase();
        let preview = if lower.ends_with(".pdf") {
            Preview::Inline(preview_url(&item.id))
        } else if lower.ends_with(".zip") {
            Preview::Disabled
        } else {
            Preview::Unsupported
        };

        TreeNode::FileLeaf {
            name: display_name(&item.name),
            download_path: download_url(&item.id),
            preview,
        }
    }

    pub fn directory(item: &RemoteItem, children: Vec<TreeNode>) -> Self {
        TreeNode::Directory {
            name: display_name(&item.name),
            children,
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn count(&self) -> usize {
        match self {
            TreeNode::Directory { children, .. } => 1 + children.iter().map(TreeNode::count).sum::<usize>(),
            TreeNode::FileLeaf { .. } => 1,
        }
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::Directory { name, children } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("type", "dir")?;
                map.serialize_entry("children", children)?;
                map.end()
            }
            TreeNode::FileLeaf {
                name,
                download_path,
                preview,
            } => {
                let len = if matches!(preview, Preview::Unsupported) { 3 } else { 4 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("type", "file")?;
                map.serialize_entry("path", download_path)?;
                match preview {
                    Preview::Inline(url) => map.serialize_entry("previewUrl", url)?,
                    Preview::Disabled => map.serialize_entry("previewUrl", &None::<String>)?,
                    Preview::Unsupported => {}
                }
                map.end()
            }
        }
    }
}

pub fn download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={}", file_id)
}

pub fn preview_url(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/preview", file_id)
}

/// Hidden files and OS artifacts, plus nameless items that cannot be shown.
pub fn is_hidden(name: &str) -> bool {
    name.is_empty() || name.starts_with('.') || NOISE_FILENAMES.contains(&name)
}

/// Names are rendered as single path segments, so separators are replaced.
fn display_name(name: &str) -> String {
    name.replace('/', "_")
}

/// Directories first, then by name ignoring case. Names equal except for
/// case fall back to byte order so the result is total.
pub fn node_order(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
}

pub fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(node_order);
}
