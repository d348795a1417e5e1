//! The assignment flow started by an assign control.
//!
//! [`begin`] reads the current folders and either reports that there are
//! none or hands back a [`PendingAssignment`]. The caller collects a choice
//! however it likes (picker, prompt, ...) and resolves the pending value with
//! `Some(name)` or `None` for cancel.

use anyhow::Result;
use tracing::debug;

use crate::folders::{FolderError, FolderStore};
use crate::sidebar::identity::ConversationId;

/// Shown when an assignment is attempted before any folder exists.
pub const NO_FOLDERS_MESSAGE: &str = "No folders yet. Add one via the 📁 panel.";

#[derive(Debug)]
pub enum AssignStart {
    /// Nothing to choose from; tell the user and stop
    NoFolders,
    Choose(PendingAssignment),
}

/// A conversation waiting for the user's folder choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAssignment {
    chat_id: ConversationId,
    folders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned {
        folder: String,
        chat_id: ConversationId,
        /// False if the conversation was already in the folder
        added: bool,
    },
    /// No choice was made
    Cancelled,
    /// The choice does not name an existing folder
    UnknownFolder(String),
}

/// Start assigning `chat_id`.
pub fn begin(store: &FolderStore, chat_id: ConversationId) -> Result<AssignStart> {
    let snapshot = store.read()?;
    if snapshot.folders.is_empty() {
        return Ok(AssignStart::NoFolders);
    }
    let folders = snapshot.names().into_iter().map(str::to_string).collect();
    Ok(AssignStart::Choose(PendingAssignment { chat_id, folders }))
}

impl PendingAssignment {
    pub fn chat_id(&self) -> &ConversationId {
        &self.chat_id
    }

    /// Folder names offered to the user, sorted.
    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Finish with the user's choice. The choice is checked against the store
    /// as it is now, since folders may have changed while the user decided.
    pub fn resolve(
        self,
        store: &mut FolderStore,
        choice: Option<&str>,
    ) -> Result<AssignOutcome, FolderError> {
        let Some(choice) = choice.map(str::trim).filter(|c| !c.is_empty()) else {
            debug!(conversation = %self.chat_id, "assignment cancelled");
            return Ok(AssignOutcome::Cancelled);
        };
        if !store.read()?.folders.contains_key(choice) {
            debug!(conversation = %self.chat_id, choice, "unknown folder chosen");
            return Ok(AssignOutcome::UnknownFolder(choice.to_string()));
        }
        let added = store.assign(choice, &self.chat_id)?;
        Ok(AssignOutcome::Assigned {
            folder: choice.to_string(),
            chat_id: self.chat_id,
            added,
        })
    }
}
