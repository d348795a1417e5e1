//! Transient notices about folder actions, shown bottom-right.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::folders::ALL_FOLDERS;
use crate::inject::flow::NO_FOLDERS_MESSAGE;

const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    /// Failures stay up longer than confirmations.
    fn lifetime(self) -> Duration {
        match self {
            ToastLevel::Info | ToastLevel::Success => Duration::from_secs(3),
            ToastLevel::Warning => Duration::from_secs(4),
            ToastLevel::Error => Duration::from_secs(6),
        }
    }
}

/// Something the user should hear about after acting on folders or rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FolderCreated(String),
    FolderExists(String),
    FolderDeleted(String),
    AllNotDeletable,
    Assigned { folder: String, added: bool },
    Removed { folder: String },
    NotInFolder { folder: String },
    /// Assignment attempted before any folder exists
    NoFolders,
    /// Unassign needs a concrete active folder
    NoFolderSelected,
    NoAssignControl,
    NoRowMenu,
    Failed { action: String, error: String },
}

impl Notice {
    pub fn level(&self) -> ToastLevel {
        match self {
            Notice::FolderCreated(_)
            | Notice::FolderDeleted(_)
            | Notice::Assigned { .. }
            | Notice::Removed { .. } => ToastLevel::Success,
            Notice::FolderExists(_)
            | Notice::NotInFolder { .. }
            | Notice::NoFolderSelected
            | Notice::NoAssignControl
            | Notice::NoRowMenu => ToastLevel::Info,
            Notice::AllNotDeletable | Notice::NoFolders => ToastLevel::Warning,
            Notice::Failed { .. } => ToastLevel::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::FolderCreated(name) => format!("Created folder {}", name),
            Notice::FolderExists(name) => format!("{} already exists", name),
            Notice::FolderDeleted(name) => format!("Deleted folder {}", name),
            Notice::AllNotDeletable => format!("\"{}\" cannot be deleted", ALL_FOLDERS),
            Notice::Assigned { folder, added: true } => format!("Added to {}", folder),
            Notice::Assigned { folder, added: false } => format!("Already in {}", folder),
            Notice::Removed { folder } => format!("Removed from {}", folder),
            Notice::NotInFolder { folder } => format!("Not in {}", folder),
            Notice::NoFolders => NO_FOLDERS_MESSAGE.to_string(),
            Notice::NoFolderSelected => "Pick a folder first".to_string(),
            Notice::NoAssignControl => "No assign button on this row".to_string(),
            Notice::NoRowMenu => "This row has no menu".to_string(),
            Notice::Failed { action, error } => format!("{}: {}", action, error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notice: Notice,
    shown_at: Instant,
}

impl Toast {
    pub fn level(&self) -> ToastLevel {
        self.notice.level()
    }

    pub fn message(&self) -> String {
        self.notice.message()
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.level().lifetime()
    }
}

/// Newest-last queue of notices.
///
/// Repeating the newest notice (assigning the same row twice, say) refreshes
/// it instead of stacking a copy.
#[derive(Debug, Default)]
pub struct ToastManager {
    queue: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice, now: Instant) {
        if let Some(last) = self.queue.back_mut() {
            if last.notice == notice {
                last.shown_at = now;
                return;
            }
        }
        self.queue.push_back(Toast {
            notice,
            shown_at: now,
        });
        while self.queue.len() > MAX_VISIBLE {
            self.queue.pop_front();
        }
    }

    pub fn update(&mut self, now: Instant) {
        self.queue.retain(|t| !t.is_expired(now));
    }

    pub fn visible_toasts(&self) -> Vec<&Toast> {
        self.queue.iter().collect()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.queue.back().map(|t| &t.notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(n: usize) -> Notice {
        Notice::FolderCreated(format!("F{}", n))
    }

    #[test]
    fn test_queue_keeps_newest() {
        let now = Instant::now();
        let mut manager = ToastManager::new();
        for i in 0..6 {
            manager.push(created(i), now);
        }
        let visible = manager.visible_toasts();
        assert_eq!(visible.len(), MAX_VISIBLE);
        assert_eq!(visible[0].message(), "Created folder F2");
        assert_eq!(manager.latest(), Some(&created(5)));
    }

    #[test]
    fn test_repeated_notice_is_refreshed_not_stacked() {
        let start = Instant::now();
        let mut manager = ToastManager::new();
        let added = Notice::Assigned {
            folder: "Work".to_string(),
            added: false,
        };
        manager.push(added.clone(), start);
        manager.push(added, start + Duration::from_secs(2));
        assert_eq!(manager.visible_toasts().len(), 1);

        manager.update(start + Duration::from_secs(4));
        assert_eq!(manager.visible_toasts().len(), 1);
        manager.update(start + Duration::from_secs(5));
        assert!(manager.latest().is_none());
    }

    #[test]
    fn test_errors_outlive_confirmations() {
        let start = Instant::now();
        let mut manager = ToastManager::new();
        manager.push(
            Notice::Failed {
                action: "Failed to assign".to_string(),
                error: "disk full".to_string(),
            },
            start,
        );
        manager.push(Notice::FolderDeleted("Work".to_string()), start);

        manager.update(start + Duration::from_secs(3));
        let visible = manager.visible_toasts();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].level(), ToastLevel::Error);
        assert_eq!(visible[0].message(), "Failed to assign: disk full");
    }

    #[test]
    fn test_assigned_message_reflects_membership() {
        let added = |added| Notice::Assigned {
            folder: "Work".to_string(),
            added,
        };
        assert_eq!(added(true).message(), "Added to Work");
        assert_eq!(added(false).message(), "Already in Work");
        assert_eq!(Notice::NoFolders.level(), ToastLevel::Warning);
    }
}
