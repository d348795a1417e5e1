//! Persisted folder state on top of a [`StorageArea`].

use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use super::{
    validate_name, FolderError, FolderSnapshot, Folders, ACTIVE_FOLDER_KEY, ALL_FOLDERS,
    FOLDERS_KEY,
};
use crate::sidebar::identity::ConversationId;
use crate::storage::{Items, StorageArea, StorageChange};

/// Folder membership and active folder, persisted under the `folders` and
/// `activeFolder` keys.
///
/// Every mutation is a read-modify-write of the current stored value inside
/// one call, so interleaved callers in the same process never drop each
/// other's updates.
pub struct FolderStore {
    storage: Box<dyn StorageArea>,
}

impl FolderStore {
    pub fn new(storage: Box<dyn StorageArea>) -> Self {
        Self { storage }
    }

    pub fn subscribe(&mut self) -> Receiver<StorageChange> {
        self.storage.subscribe()
    }

    pub fn poll_external(&mut self) -> Result<()> {
        self.storage.poll_external()
    }

    /// Current state; `folders` defaults to empty and `activeFolder` to "All".
    pub fn read(&self) -> Result<FolderSnapshot> {
        let items = self.storage.get(&[FOLDERS_KEY, ACTIVE_FOLDER_KEY])?;
        let folders = parse_folders(items.get(FOLDERS_KEY))?;
        let active_folder = items
            .get(ACTIVE_FOLDER_KEY)
            .and_then(Value::as_str)
            .unwrap_or(ALL_FOLDERS)
            .to_string();
        Ok(FolderSnapshot {
            folders,
            active_folder,
        })
    }

    fn read_folders(&self) -> Result<Folders> {
        let items = self.storage.get(&[FOLDERS_KEY])?;
        parse_folders(items.get(FOLDERS_KEY))
    }

    fn write_folders(&mut self, folders: &Folders) -> Result<()> {
        let value = serde_json::to_value(folders).context("Failed to serialize folders")?;
        let mut items = Items::new();
        items.insert(FOLDERS_KEY.to_string(), value);
        self.storage.set(items)
    }

    /// Create an empty folder. Returns false if it already exists.
    pub fn create_folder(&mut self, raw_name: &str) -> Result<bool, FolderError> {
        let name = validate_name(raw_name)?;
        let mut folders = self.read_folders()?;
        if folders.contains_key(&name) {
            return Ok(false);
        }
        folders.insert(name.clone(), Default::default());
        self.write_folders(&folders)?;
        info!(folder = %name, "folder created");
        Ok(true)
    }

    /// Add `id` to `folder`, creating the folder if needed. Returns false
    /// (and writes nothing) if `id` was already a member.
    pub fn assign(&mut self, folder: &str, id: &ConversationId) -> Result<bool, FolderError> {
        if folder == ALL_FOLDERS {
            return Err(FolderError::Reserved(folder.to_string()));
        }
        let mut folders = self.read_folders()?;
        if !folders.entry(folder.to_string()).or_default().insert(id.clone()) {
            return Ok(false);
        }
        self.write_folders(&folders)?;
        info!(folder, conversation = %id, "conversation assigned");
        Ok(true)
    }

    /// Remove `id` from `folder`. Returns false if it was not a member.
    pub fn unassign(&mut self, folder: &str, id: &ConversationId) -> Result<bool, FolderError> {
        let mut folders = self.read_folders()?;
        let removed = folders.get_mut(folder).is_some_and(|ids| ids.remove(id));
        if removed {
            self.write_folders(&folders)?;
            info!(folder, conversation = %id, "conversation unassigned");
        }
        Ok(removed)
    }

    /// Delete a folder. The active folder is left as is, so deleting it
    /// leaves a dangling filter that shows nothing until another is chosen.
    pub fn delete_folder(&mut self, folder: &str) -> Result<bool, FolderError> {
        let mut folders = self.read_folders()?;
        if folders.remove(folder).is_none() {
            return Ok(false);
        }
        self.write_folders(&folders)?;
        info!(folder, "folder deleted");
        Ok(true)
    }

    /// Replace the active folder. The name is not checked against `folders`.
    pub fn set_active_folder(&mut self, name: &str) -> Result<()> {
        let mut items = Items::new();
        items.insert(
            ACTIVE_FOLDER_KEY.to_string(),
            Value::String(name.to_string()),
        );
        self.storage.set(items)
    }
}

fn parse_folders(value: Option<&Value>) -> Result<Folders> {
    match value {
        None | Some(Value::Null) => Ok(Folders::new()),
        Some(value) => serde_json::from_value(value.clone()).context("Malformed folders value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn store() -> FolderStore {
        FolderStore::new(Box::new(MemoryStorage::new()))
    }

    fn id(s: &str) -> ConversationId {
        ConversationId::from(s)
    }

    #[test]
    fn read_defaults_before_any_write() {
        let snapshot = store().read().unwrap();
        assert_eq!(snapshot, FolderSnapshot::default());
    }

    #[test]
    fn create_folder_is_noop_for_existing_name() {
        let mut store = store();
        assert!(store.create_folder("Work").unwrap());
        store.assign("Work", &id("a")).unwrap();
        assert!(!store.create_folder(" Work ").unwrap());
        // Existing membership survives the duplicate create
        assert!(store.read().unwrap().contains("Work", &id("a")));
    }

    #[test]
    fn create_folder_rejects_reserved_and_empty_names() {
        let mut store = store();
        assert!(matches!(store.create_folder("All"), Err(FolderError::Reserved(_))));
        assert!(matches!(store.create_folder(""), Err(FolderError::Empty)));
        assert!(store.read().unwrap().folders.is_empty());
    }

    #[test]
    fn assign_twice_keeps_a_single_membership() {
        let mut store = store();
        store.create_folder("Work").unwrap();
        assert!(store.assign("Work", &id("a")).unwrap());
        assert!(!store.assign("Work", &id("a")).unwrap());
        assert_eq!(store.read().unwrap().folders["Work"].len(), 1);
    }

    #[test]
    fn assign_unions_with_existing_members() {
        let mut store = store();
        store.assign("Work", &id("a")).unwrap();
        store.assign("Work", &id("b")).unwrap();
        let ids: Vec<_> = store.read().unwrap().folders["Work"].iter().cloned().collect();
        assert_eq!(ids, vec![id("a"), id("b")]);
    }

    #[test]
    fn assign_to_sentinel_is_rejected() {
        let mut store = store();
        assert!(matches!(store.assign("All", &id("a")), Err(FolderError::Reserved(_))));
    }

    #[test]
    fn set_active_folder_does_not_validate() {
        let mut store = store();
        store.set_active_folder("Archive").unwrap();
        let snapshot = store.read().unwrap();
        assert_eq!(snapshot.active_folder, "Archive");
        assert!(!snapshot.folders.contains_key("Archive"));
    }

    #[test]
    fn unassign_and_delete_leave_active_folder_alone() {
        let mut store = store();
        store.assign("Work", &id("a")).unwrap();
        store.set_active_folder("Work").unwrap();

        assert!(store.unassign("Work", &id("a")).unwrap());
        assert!(!store.unassign("Work", &id("a")).unwrap());
        assert!(store.delete_folder("Work").unwrap());
        assert!(!store.delete_folder("Work").unwrap());

        let snapshot = store.read().unwrap();
        assert!(snapshot.folders.is_empty());
        assert_eq!(snapshot.active_folder, "Work");
    }

    #[test]
    fn mutations_notify_subscribers_with_touched_keys() {
        let mut store = store();
        let rx = store.subscribe();
        store.create_folder("Work").unwrap();
        assert!(rx.try_recv().unwrap().touches(FOLDERS_KEY));
        store.set_active_folder("Work").unwrap();
        assert!(rx.try_recv().unwrap().touches(ACTIVE_FOLDER_KEY));
        // Idempotent assignment writes nothing
        store.assign("Work", &id("a")).unwrap();
        rx.try_recv().unwrap();
        store.assign("Work", &id("a")).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reads_folder_values_written_as_plain_arrays() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                json!({"folders": {"Work": ["a", "a", "b"]}, "activeFolder": "Work"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        let store = FolderStore::new(Box::new(storage));
        let snapshot = store.read().unwrap();
        assert_eq!(snapshot.folders["Work"].len(), 2);
        assert_eq!(snapshot.active_folder, "Work");
    }
}
