//! Application state and core data types for chatfolders.

mod actions;
mod state;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::Config;
use crate::dom::{NodeId, Selector};
use crate::folders::{FolderSnapshot, FolderStore, ALL_FOLDERS};
use crate::host::HostPage;
use crate::inject::{affordance_for, menu, ASSIGN_BUTTON_CLASS};
use crate::sidebar::{self, filter::HIDE_CLASS, identity::ConversationId};
use crate::storage::StorageChange;
use crate::sync::{PassReport, Propagator, SyncMessage};
use crate::ui::modal::{FolderPickerState, Modal, NewFolderModalState};
use crate::ui::toast::{Notice, ToastManager};
use crate::watcher::FileWatcher;

pub use state::{
    clamp_selection, move_selection, Focus, FolderPanelState, PanelEntry, SidebarRow,
    SidebarState,
};

/// Modal dialog state
pub enum ModalState {
    /// No modal is open
    None,
    /// Folder name prompt
    NewFolder(Box<NewFolderModalState>),
    /// Choosing a folder for a pending assignment
    FolderPicker(Box<FolderPickerState>),
}

impl ModalState {
    /// Get a mutable reference to the inner modal via trait dispatch.
    pub fn as_modal_mut(&mut self) -> Option<&mut dyn Modal> {
        match self {
            ModalState::None => None,
            ModalState::NewFolder(state) => Some(state.as_mut()),
            ModalState::FolderPicker(state) => Some(state.as_mut()),
        }
    }
}

/// Application state
pub struct App {
    pub config: Config,
    /// Where layout changes are saved; `None` keeps them in memory
    pub config_path: Option<PathBuf>,
    /// The host page we extend
    pub host: HostPage,
    pub store: FolderStore,
    propagator: Propagator,
    store_changes: Receiver<StorageChange>,
    host_watcher: Option<FileWatcher>,
    /// Folder state as of the last store notification
    pub folders: FolderSnapshot,
    /// Most recent filter pass
    pub last_pass: Option<PassReport>,
    pub sidebar_state: SidebarState,
    pub panel_state: FolderPanelState,
    /// Highlighted entry of the open host menu
    pub menu_selection: usize,
    pub modal_state: ModalState,
    pub focus: Focus,
    pub toast_manager: ToastManager,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, host: HostPage, mut store: FolderStore, now: Instant) -> Result<Self> {
        let store_changes = store.subscribe();
        let folders = store.read().context("Failed to read folders")?;
        let propagator = Propagator::new(
            config.discovery.clone(),
            affordance_for(config.assign_mode),
            config.menu_check_delay(),
            now,
        );
        let panel_state = FolderPanelState::new(config.layout.panel_open);

        Ok(Self {
            config,
            config_path: None,
            host,
            store,
            propagator,
            store_changes,
            host_watcher: None,
            folders,
            last_pass: None,
            sidebar_state: SidebarState::default(),
            panel_state,
            menu_selection: 0,
            modal_state: ModalState::None,
            focus: Focus::default(),
            toast_manager: ToastManager::new(),
            should_quit: false,
        })
    }

    /// Re-render the host whenever its snapshot file changes.
    pub fn watch_host(&mut self) -> Result<()> {
        if let Some(path) = self.host.snapshot_path() {
            self.host_watcher = Some(FileWatcher::new(path)?);
        }
        Ok(())
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// One turn of the event loop: let the host and storage catch up, then
    /// handle every pending sync message.
    pub fn tick(&mut self, now: Instant) {
        if self.host_watcher.as_ref().is_some_and(FileWatcher::changed) {
            self.reload_host();
        }

        match self.host.tick(now) {
            Ok(true) => self.menu_selection = 0,
            Ok(false) => {}
            Err(e) => warn!(error = %e, "host menu failed to render"),
        }

        if let Err(e) = self.store.poll_external() {
            warn!(error = %e, "failed to pick up external storage changes");
        }

        let mut messages = Vec::new();
        messages.extend(self.propagator.poll(self.host.document_mut(), now));
        messages.extend(self.store_changes.try_iter().map(SyncMessage::StoreChanged));
        for message in messages {
            self.handle_sync(&message);
        }

        self.toast_manager.update(now);
    }

    fn handle_sync(&mut self, message: &SyncMessage) {
        match self
            .propagator
            .dispatch(message, self.host.document_mut(), &self.store)
        {
            Ok(reaction) => {
                if reaction.pass.is_some() {
                    self.last_pass = reaction.pass;
                }
                if reaction.folders_changed {
                    self.refresh_folders();
                }
            }
            Err(e) => {
                warn!(error = %e, ?message, "sync failed");
                self.toast(Notice::Failed {
                    action: "Sync failed".to_string(),
                    error: e.to_string(),
                });
            }
        }
        let rows = self.listed_rows().len();
        clamp_selection(&mut self.sidebar_state.list_state, rows);
    }

    /// Reload the cached folder snapshot after a store change.
    pub fn refresh_folders(&mut self) {
        match self.store.read() {
            Ok(snapshot) => {
                debug!(folders = snapshot.folders.len(), active = %snapshot.active_folder, "folders refreshed");
                self.folders = snapshot;
                let entries = self.panel_entries().len();
                clamp_selection(&mut self.panel_state.list_state, entries);
            }
            Err(e) => warn!(error = %e, "failed to read folders"),
        }
    }

    /// Every conversation row currently in the host's list, in order.
    pub fn sidebar_rows(&self) -> Vec<SidebarRow> {
        let doc = self.host.document();
        let Some(container) = sidebar::find_container(doc) else {
            return Vec::new();
        };
        sidebar::rows(doc, container)
            .into_iter()
            .map(|(id, row)| SidebarRow {
                title: sidebar::row_title(doc, row.anchor),
                hidden: doc.has_class(row.node, HIDE_CLASS),
                assign_control: doc.query_first(row.node, Selector::Class(ASSIGN_BUTTON_CLASS)),
                menu_trigger: menu::find_trigger(doc, row.node),
                node: row.node,
                id,
            })
            .collect()
    }

    /// Rows the sidebar pane lists: all of them, or only visible ones.
    pub fn listed_rows(&self) -> Vec<SidebarRow> {
        let show_hidden = self.sidebar_state.show_hidden;
        self.sidebar_rows()
            .into_iter()
            .filter(|row| show_hidden || !row.hidden)
            .collect()
    }

    pub fn selected_row(&self) -> Option<SidebarRow> {
        let i = self.sidebar_state.list_state.selected()?;
        self.listed_rows().into_iter().nth(i)
    }

    /// "All" followed by every folder, sorted, with counts.
    pub fn panel_entries(&self) -> Vec<PanelEntry> {
        let present: BTreeSet<ConversationId> =
            self.sidebar_rows().into_iter().map(|row| row.id).collect();
        let active = &self.folders.active_folder;

        let mut entries = vec![PanelEntry {
            name: ALL_FOLDERS.to_string(),
            members: None,
            present: present.len(),
            active: active == ALL_FOLDERS,
        }];
        entries.extend(self.folders.folders.iter().map(|(name, ids)| PanelEntry {
            name: name.clone(),
            members: Some(ids.len()),
            present: ids.intersection(&present).count(),
            active: name == active,
        }));
        entries
    }

    pub fn selected_panel_entry(&self) -> Option<PanelEntry> {
        let i = self.panel_state.list_state.selected()?;
        self.panel_entries().into_iter().nth(i)
    }

    /// Entries of the host's open menu: node and label.
    pub fn menu_items(&self) -> Vec<(NodeId, String)> {
        let Some(menu) = self.host.open_menu() else {
            return Vec::new();
        };
        let doc = self.host.document();
        doc.children(menu)
            .iter()
            .map(|&item| (item, doc.text_content(item).trim().to_string()))
            .collect()
    }

    pub fn is_modal_open(&self) -> bool {
        !matches!(self.modal_state, ModalState::None)
    }

    pub fn close_modal(&mut self) {
        self.modal_state = ModalState::None;
    }

    pub(crate) fn toast(&mut self, notice: Notice) {
        self.toast_manager.push(notice, Instant::now());
    }
}
