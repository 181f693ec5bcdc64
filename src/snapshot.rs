//! Snapshot file - the indexed collection written out by `build` and `watch`
//!
//! Page generators that can't link against this crate read the snapshot
//! instead. The file carries no timestamps so unchanged sources produce a
//! byte-identical snapshot.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Mode;
use crate::content::Post;
use crate::index::Collection;

/// Serialized indexed collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Version of the snapshot format
    pub version: u32,
    pub mode: Mode,
    pub posts: Vec<Post>,
}

impl Snapshot {
    /// Current snapshot format version
    pub const VERSION: u32 = 1;

    /// Capture a collection
    pub fn from_collection(collection: &Collection) -> Self {
        Self {
            version: Self::VERSION,
            mode: collection.mode(),
            posts: collection.list_posts().to_vec(),
        }
    }

    /// Load a snapshot from disk.
    ///
    /// Returns `None` when the file is missing, unreadable or from another
    /// format version.
    pub fn load(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) if snapshot.version == Self::VERSION => Some(snapshot),
            Ok(snapshot) => {
                tracing::info!(
                    "Snapshot version {} does not match {}, ignoring {:?}",
                    snapshot.version,
                    Self::VERSION,
                    path
                );
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write the snapshot, replacing any previous file in one rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, path)?;

        tracing::debug!("Wrote {} posts to {:?}", self.posts.len(), path);
        Ok(())
    }

    /// Re-index the stored posts
    pub fn into_collection(self) -> Collection {
        Collection::build(self.posts, self.mode)
    }
}
