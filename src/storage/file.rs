//! Storage area persisted as a single JSON object on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{changed_keys, select, Items, StorageArea, StorageChange, Subscribers};
use crate::watcher::FileWatcher;

/// JSON-file storage. Every call re-reads the file so writes from other
/// processes are never clobbered wholesale; conflicting writes to the same
/// key are last-write-wins.
pub struct JsonFileStorage {
    path: PathBuf,
    /// Contents as of our last read or write, used to diff external edits
    last_seen: Items,
    subscribers: Subscribers,
    watcher: Option<FileWatcher>,
}

impl JsonFileStorage {
    /// Open (without creating) the storage file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let last_seen = read_items(&path)?;
        Ok(Self {
            path,
            last_seen,
            subscribers: Subscribers::default(),
            watcher: None,
        })
    }

    /// `<data dir>/chatfolders/storage.json`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(data_dir.join("chatfolders").join("storage.json"))
    }

    /// Start watching the file so [`StorageArea::poll_external`] reports
    /// writes made by other processes.
    pub fn watch(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        self.watcher = Some(FileWatcher::new(&self.path)?);
        Ok(())
    }

    fn commit(&mut self, before: &Items, after: Items) -> Result<()> {
        let changed = changed_keys(before, &after);
        if !changed.is_empty() {
            write_items(&self.path, &after)?;
            debug!(path = %self.path.display(), keys = ?changed, "storage written");
        }
        self.last_seen = after;
        self.subscribers.broadcast(changed);
        Ok(())
    }
}

impl StorageArea for JsonFileStorage {
    fn get(&self, keys: &[&str]) -> Result<Items> {
        Ok(select(&read_items(&self.path)?, keys))
    }

    fn set(&mut self, items: Items) -> Result<()> {
        let before = read_items(&self.path)?;
        let mut after = before.clone();
        after.extend(items);
        self.commit(&before, after)
    }

    fn subscribe(&mut self) -> Receiver<StorageChange> {
        self.subscribers.subscribe()
    }

    fn poll_external(&mut self) -> Result<()> {
        let Some(watcher) = &self.watcher else {
            return Ok(());
        };
        if !watcher.changed() {
            return Ok(());
        }
        let current = read_items(&self.path)?;
        let changed = changed_keys(&self.last_seen, &current);
        if !changed.is_empty() {
            info!(keys = ?changed, "storage changed externally");
        }
        self.last_seen = current;
        self.subscribers.broadcast(changed);
        Ok(())
    }
}

fn read_items(path: &Path) -> Result<Items> {
    if !path.exists() {
        return Ok(Items::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read storage file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Items::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse storage file: {}", path.display()))
}

fn write_items(path: &Path, items: &Items) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(items).context("Failed to serialize storage")?;

    // Write to a sibling temp file and rename so readers never see a torn file
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)
        .with_context(|| format!("Failed to write storage file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace storage file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn items(value: serde_json::Value) -> Items {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_file_reads_as_empty_and_is_created_on_first_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let mut storage = JsonFileStorage::open(&path).unwrap();
        assert!(storage.get(&["folders"]).unwrap().is_empty());

        storage.set(items(json!({"activeFolder": "Work"}))).unwrap();
        assert!(path.exists());

        let reopened = JsonFileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(&["activeFolder"]).unwrap()["activeFolder"], json!("Work"));
    }

    #[test]
    fn writes_keep_keys_written_by_another_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let mut first = JsonFileStorage::open(&path).unwrap();
        let mut second = JsonFileStorage::open(&path).unwrap();

        first.set(items(json!({"folders": {"Work": []}}))).unwrap();
        second.set(items(json!({"activeFolder": "Work"}))).unwrap();

        let all = first.get(&["folders", "activeFolder"]).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn set_notifies_changed_keys_only() {
        let dir = TempDir::new().unwrap();
        let mut storage = JsonFileStorage::open(dir.path().join("storage.json")).unwrap();
        let rx = storage.subscribe();

        storage.set(items(json!({"folders": {}, "activeFolder": "All"}))).unwrap();
        let change = rx.try_recv().unwrap();
        assert!(change.touches("folders") && change.touches("activeFolder"));

        storage.set(items(json!({"activeFolder": "All"}))).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStorage::open(&path).is_err());
    }
}
