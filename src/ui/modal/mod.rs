//! Modal dialog components for the TUI.

pub mod folder_picker;
pub mod new_folder;

use crossterm::event::KeyEvent;

pub use folder_picker::{FolderPickerModal, FolderPickerState};
pub use new_folder::{NewFolderModal, NewFolderModalState};

/// What a modal wants done after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKeyResult {
    Continue,
    Close,
    /// Create a folder with this (untrimmed) name
    FolderNamed(String),
    /// Finish the pending assignment; `None` cancels
    FolderChosen(Option<String>),
}

/// Key handling shared by every modal.
pub trait Modal {
    fn handle_key_modal(&mut self, key: KeyEvent) -> ModalKeyResult;
}
