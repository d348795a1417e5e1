//! Persisted key-value storage with change notifications.
//!
//! A [`StorageArea`] is a flat JSON object addressed by key. Every write that
//! changes at least one value is broadcast to subscribers as a
//! [`StorageChange`] naming the keys that changed. Writes are last-write-wins
//! per key.

pub mod file;

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Result;
use serde_json::{Map, Value};

pub use file::JsonFileStorage;

/// Key/value pairs read from or written to a storage area.
pub type Items = Map<String, Value>;

/// Notification that one or more keys changed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub keys: Vec<String>,
}

impl StorageChange {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

pub trait StorageArea {
    /// Values for the requested keys. Missing keys are absent from the result.
    fn get(&self, keys: &[&str]) -> Result<Items>;

    /// Write every item; unmentioned keys are left untouched.
    fn set(&mut self, items: Items) -> Result<()>;

    /// Receive a [`StorageChange`] for every subsequent change.
    fn subscribe(&mut self) -> Receiver<StorageChange>;

    /// Pick up writes made outside this process, notifying subscribers.
    fn poll_external(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fan-out of change notifications; dropped receivers are pruned on send.
#[derive(Default)]
pub(crate) struct Subscribers(Vec<Sender<StorageChange>>);

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<StorageChange> {
        let (tx, rx) = mpsc::channel();
        self.0.push(tx);
        rx
    }

    pub(crate) fn broadcast(&mut self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        let change = StorageChange { keys };
        self.0.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Keys whose value differs between `before` and `after`, sorted.
pub(crate) fn changed_keys(before: &Items, after: &Items) -> Vec<String> {
    let mut keys: Vec<String> = before
        .keys()
        .chain(after.keys())
        .filter(|k| before.get(*k) != after.get(*k))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

fn select(items: &Items, keys: &[&str]) -> Items {
    keys.iter()
        .filter_map(|k| items.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    items: Items,
    subscribers: Subscribers,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, keys: &[&str]) -> Result<Items> {
        Ok(select(&self.items, keys))
    }

    fn set(&mut self, items: Items) -> Result<()> {
        let before = self.items.clone();
        self.items.extend(items);
        let changed = changed_keys(&before, &self.items);
        self.subscribers.broadcast(changed);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<StorageChange> {
        self.subscribers.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(value: Value) -> Items {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn get_returns_only_present_requested_keys() {
        let mut storage = MemoryStorage::new();
        storage.set(items(json!({"a": 1, "b": 2}))).unwrap();
        let got = storage.get(&["a", "missing"]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!(1));
    }

    #[test]
    fn subscribers_hear_only_keys_that_changed() {
        let mut storage = MemoryStorage::new();
        storage.set(items(json!({"a": 1, "b": 2}))).unwrap();
        let rx = storage.subscribe();

        storage.set(items(json!({"a": 1, "b": 3}))).unwrap();
        assert_eq!(rx.try_recv().unwrap().keys, vec!["b".to_string()]);

        // Same values again: nothing to report
        storage.set(items(json!({"a": 1}))).unwrap();
        assert!(rx.try_recv().is_err());

        storage.set(items(json!({"activeFolder": "Work"}))).unwrap();
        assert!(rx.try_recv().unwrap().touches("activeFolder"));
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut storage = MemoryStorage::new();
        drop(storage.subscribe());
        storage.set(items(json!({"a": 1}))).unwrap();
        assert!(storage.subscribers.0.is_empty());
    }
}
