//! User-defined folders of conversations.
//!
//! Folders are a flat namespace of names, each holding a set of
//! [`ConversationId`]s. One folder (or the [`ALL_FOLDERS`] sentinel) is active
//! and drives the sidebar filter.

pub mod store;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::sidebar::identity::ConversationId;

pub use store::FolderStore;

/// Sentinel active folder meaning "no filter".
pub const ALL_FOLDERS: &str = "All";

/// Storage key holding the folder → ids mapping.
pub const FOLDERS_KEY: &str = "folders";

/// Storage key holding the active folder name.
pub const ACTIVE_FOLDER_KEY: &str = "activeFolder";

/// Folder name → member ids.
pub type Folders = BTreeMap<String, BTreeSet<ConversationId>>;

/// Point-in-time view of persisted folder state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSnapshot {
    pub folders: Folders,
    /// Folder name or [`ALL_FOLDERS`]; may name a folder that no longer exists
    pub active_folder: String,
}

impl Default for FolderSnapshot {
    fn default() -> Self {
        Self {
            folders: Folders::new(),
            active_folder: ALL_FOLDERS.to_string(),
        }
    }
}

impl FolderSnapshot {
    pub fn is_unfiltered(&self) -> bool {
        self.active_folder == ALL_FOLDERS
    }

    /// Folder names in display order (sorted).
    pub fn names(&self) -> Vec<&str> {
        self.folders.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, folder: &str, id: &ConversationId) -> bool {
        self.folders.get(folder).is_some_and(|ids| ids.contains(id))
    }
}

/// Rejected folder operations.
#[derive(Debug, Error)]
pub enum FolderError {
    #[error("folder name cannot be empty")]
    Empty,
    #[error("\"{0}\" is reserved")]
    Reserved(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Trim a user-entered folder name and reject empty or reserved names.
pub fn validate_name(raw: &str) -> Result<String, FolderError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(FolderError::Empty);
    }
    if name == ALL_FOLDERS {
        return Err(FolderError::Reserved(name.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_unfiltered_and_empty() {
        let snapshot = FolderSnapshot::default();
        assert!(snapshot.is_unfiltered());
        assert!(snapshot.folders.is_empty());
    }

    #[test]
    fn validate_name_trims_and_rejects_sentinel() {
        assert_eq!(validate_name("  Work ").unwrap(), "Work");
        assert!(matches!(validate_name("   "), Err(FolderError::Empty)));
        assert!(matches!(validate_name("All"), Err(FolderError::Reserved(_))));
        // Case-sensitive: only the exact sentinel is reserved
        assert_eq!(validate_name("all").unwrap(), "all");
    }

    #[test]
    fn names_are_sorted() {
        let mut snapshot = FolderSnapshot::default();
        snapshot.folders.insert("b".into(), BTreeSet::new());
        snapshot.folders.insert("A".into(), BTreeSet::new());
        assert_eq!(snapshot.names(), vec!["A", "b"]);
    }
}
