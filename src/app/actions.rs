//! User actions: folder management, activating controls, assignment.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::{App, ModalState};
use crate::dom::NodeId;
use crate::folders::{FolderError, ALL_FOLDERS};
use crate::inject::flow::{self, AssignOutcome, AssignStart, PendingAssignment};
use crate::inject::{resolve_activation, Activation};
use crate::sidebar::identity::ConversationId;
use crate::ui::modal::{FolderPickerState, NewFolderModalState};
use crate::ui::toast::Notice;

impl App {
    pub fn open_new_folder(&mut self) {
        self.modal_state = ModalState::NewFolder(Box::new(NewFolderModalState::new()));
    }

    /// Create a folder from the name typed into the prompt. Empty names are
    /// ignored; a reserved name keeps the prompt open with an error.
    pub fn submit_new_folder(&mut self, raw_name: &str) {
        match self.store.create_folder(raw_name) {
            Ok(true) => {
                self.close_modal();
                self.toast(Notice::FolderCreated(raw_name.trim().to_string()));
            }
            Ok(false) => {
                self.close_modal();
                self.toast(Notice::FolderExists(raw_name.trim().to_string()));
            }
            Err(FolderError::Empty) => self.close_modal(),
            Err(e @ FolderError::Reserved(_)) => {
                if let ModalState::NewFolder(state) = &mut self.modal_state {
                    state.error_message = Some(e.to_string());
                }
            }
            Err(e) => {
                self.close_modal();
                self.report("Failed to create folder", &e);
            }
        }
    }

    /// Filter the sidebar by `name` (or show everything for "All").
    pub fn set_active_folder(&mut self, name: &str) {
        if let Err(e) = self.store.set_active_folder(name) {
            self.report("Failed to switch folder", &e);
        }
    }

    pub fn select_panel_entry(&mut self) {
        if let Some(entry) = self.selected_panel_entry() {
            self.set_active_folder(&entry.name);
        }
    }

    pub fn delete_selected_folder(&mut self) {
        let Some(entry) = self.selected_panel_entry() else {
            return;
        };
        if entry.name == ALL_FOLDERS {
            self.toast(Notice::AllNotDeletable);
            return;
        }
        match self.store.delete_folder(&entry.name) {
            Ok(true) => self.toast(Notice::FolderDeleted(entry.name)),
            Ok(false) => {}
            Err(e) => self.report("Failed to delete folder", &e),
        }
    }

    /// Click `node` in the host page. The host reacts (menu triggers open a
    /// menu) and so do our listeners.
    pub fn click(&mut self, node: NodeId, now: Instant) {
        let activation = resolve_activation(self.host.document(), node);
        self.host.click(node, now);
        match activation {
            Some(Activation::Assign(id)) => self.start_assignment(id),
            Some(Activation::MenuTrigger(id)) => self.propagator.menu_trigger_activated(id, now),
            None => {}
        }
    }

    /// Activate the inline assign button of the selected row.
    pub fn assign_selected_row(&mut self, now: Instant) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row.assign_control {
            Some(control) => self.click(control, now),
            None => self.toast(Notice::NoAssignControl),
        }
    }

    /// Open the host's context menu for the selected row.
    pub fn open_selected_row_menu(&mut self, now: Instant) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row.menu_trigger {
            Some(trigger) => self.click(trigger, now),
            None => self.toast(Notice::NoRowMenu),
        }
    }

    pub fn move_menu_selection(&mut self, delta: isize) {
        let len = self.menu_items().len();
        if len == 0 {
            return;
        }
        let next = (self.menu_selection as isize + delta).clamp(0, len as isize - 1);
        self.menu_selection = next as usize;
    }

    /// Activate the highlighted host menu entry. The host closes its menu
    /// after any item is chosen.
    pub fn activate_menu_item(&mut self, now: Instant) {
        let items = self.menu_items();
        let Some((item, label)) = items.get(self.menu_selection).cloned() else {
            return;
        };
        let activation = resolve_activation(self.host.document(), item);
        self.host.close_menu();
        match activation {
            Some(Activation::Assign(id)) => self.start_assignment(id),
            Some(Activation::MenuTrigger(id)) => self.propagator.menu_trigger_activated(id, now),
            None => debug!(label = %label, "host menu item chosen"),
        }
    }

    pub fn close_host_menu(&mut self) {
        self.host.close_menu();
    }

    /// Begin assigning `id`: open the picker, or explain that folders must
    /// exist first. Any picker already open is replaced.
    pub fn start_assignment(&mut self, id: ConversationId) {
        match flow::begin(&self.store, id) {
            Ok(AssignStart::NoFolders) => self.toast(Notice::NoFolders),
            Ok(AssignStart::Choose(pending)) => {
                self.modal_state = ModalState::FolderPicker(Box::new(FolderPickerState::new(pending)));
            }
            Err(e) => self.report("Failed to read folders", &e),
        }
    }

    pub fn resolve_assignment(&mut self, pending: PendingAssignment, choice: Option<&str>) {
        match pending.resolve(&mut self.store, choice) {
            Ok(AssignOutcome::Assigned {
                folder,
                chat_id,
                added,
            }) => {
                info!(conversation = %chat_id, folder = %folder, added, "conversation assigned");
                self.toast(Notice::Assigned { folder, added });
            }
            Ok(AssignOutcome::Cancelled) => debug!("assignment cancelled"),
            // Chosen name vanished or never existed: nothing to assign
            Ok(AssignOutcome::UnknownFolder(name)) => {
                debug!(folder = %name, "assignment to unknown folder ignored");
            }
            Err(e) => self.report("Failed to assign", &e),
        }
    }

    /// Remove the selected row from the active folder.
    pub fn unassign_selected_row(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let folder = self.folders.active_folder.clone();
        if folder == ALL_FOLDERS {
            self.toast(Notice::NoFolderSelected);
            return;
        }
        match self.store.unassign(&folder, &row.id) {
            Ok(true) => self.toast(Notice::Removed { folder }),
            Ok(false) => self.toast(Notice::NotInFolder { folder }),
            Err(e) => self.report("Failed to remove from folder", &e),
        }
    }

    /// Re-read the host snapshot.
    pub fn reload_host(&mut self) {
        match self.host.reload() {
            Ok(()) => info!("host page reloaded"),
            Err(e) => self.report("Failed to reload host page", &e),
        }
    }

    pub fn toggle_panel(&mut self) {
        self.panel_state.open = !self.panel_state.open;
        if !self.panel_state.open {
            self.focus = super::Focus::Sidebar;
        }
        self.config.layout.panel_open = self.panel_state.open;
        self.save_layout();
    }

    /// Grow or shrink the folder panel, within the configured bounds.
    pub fn resize_panel(&mut self, delta: i16) {
        let width = self.config.layout.panel_width_pct as i16 + delta;
        self.config.layout.panel_width_pct = width.clamp(0, u8::MAX as i16) as u8;
        self.config.layout.validate();
        self.save_layout();
    }

    pub fn toggle_show_hidden(&mut self) {
        self.sidebar_state.show_hidden = !self.sidebar_state.show_hidden;
        let rows = self.listed_rows().len();
        super::clamp_selection(&mut self.sidebar_state.list_state, rows);
    }

    fn save_layout(&mut self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        if let Err(e) = self.config.save_to(&path) {
            warn!(error = %e, "failed to save layout");
        }
    }

    fn report(&mut self, context: &str, error: &dyn std::fmt::Display) {
        warn!(error = %error, "{}", context);
        self.toast(Notice::Failed {
            action: context.to_string(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::folders::FolderStore;
    use crate::host::HostPage;
    use crate::inject::AssignMode;
    use crate::storage::MemoryStorage;

    const PAGE: &str = r#"
        <nav><ol data-testid="conversation-list">
          <li id="row-a"><a href="/c/a">Alpha</a><button id="radix-1">...</button></li>
          <li id="row-b"><a href="/c/b">Beta</a><button id="radix-2">...</button></li>
        </ol></nav>"#;

    fn app(mode: AssignMode) -> (App, Instant) {
        let config = Config {
            assign_mode: mode,
            ..Default::default()
        };
        let host = HostPage::from_markup(PAGE, config.host_menu_delay()).unwrap();
        let store = FolderStore::new(Box::new(MemoryStorage::new()));
        let start = Instant::now();
        let mut app = App::new(config, host, store, start).unwrap();
        app.tick(start);
        app.tick(start);
        (app, start)
    }

    fn ms(start: Instant, n: u64) -> Instant {
        start + Duration::from_millis(n)
    }

    fn titles(app: &App) -> Vec<String> {
        app.listed_rows().into_iter().map(|row| row.title).collect()
    }

    fn picker_choice(app: &mut App, choice: Option<&str>) {
        let ModalState::FolderPicker(state) =
            std::mem::replace(&mut app.modal_state, ModalState::None)
        else {
            panic!("expected the folder picker");
        };
        app.resolve_assignment(state.into_pending(), choice);
    }

    #[test]
    fn test_rows_are_read_from_host() {
        let (app, _) = app(AssignMode::Inline);
        assert_eq!(titles(&app), vec!["Alpha", "Beta"]);
        assert!(app.last_pass.is_some_and(|pass| pass.indexed == 2));
        assert!(app.sidebar_rows().iter().all(|row| row.assign_control.is_some()));
    }

    #[test]
    fn test_inline_assign_without_folders_warns() {
        let (mut app, start) = app(AssignMode::Inline);
        app.assign_selected_row(start);
        assert!(!app.is_modal_open());
        assert_eq!(app.toast_manager.latest(), Some(&Notice::NoFolders));
    }

    #[test]
    fn test_create_folder_assign_and_filter() {
        let (mut app, start) = app(AssignMode::Inline);
        app.submit_new_folder("  Work ");
        app.tick(start);
        assert_eq!(app.folders.names(), vec!["Work"]);

        app.assign_selected_row(start);
        picker_choice(&mut app, Some("Work"));
        app.set_active_folder("Work");
        app.tick(start);

        assert_eq!(titles(&app), vec!["Alpha"]);
        app.toggle_show_hidden();
        assert_eq!(titles(&app), vec!["Alpha", "Beta"]);

        let entries = app.panel_entries();
        assert_eq!(entries[0].name, ALL_FOLDERS);
        assert_eq!(entries[1].members, Some(1));
        assert!(entries[1].active);
    }

    #[test]
    fn test_unknown_folder_choice_is_silent() {
        let (mut app, start) = app(AssignMode::Inline);
        app.submit_new_folder("Work");
        app.tick(start);

        app.assign_selected_row(start);
        picker_choice(&mut app, Some("Archive"));

        assert_eq!(
            app.toast_manager.latest(),
            Some(&Notice::FolderCreated("Work".to_string()))
        );
        let snapshot = app.store.read().unwrap();
        assert!(!snapshot.folders.contains_key("Archive"));
        assert!(!snapshot.contains("Work", &ConversationId::from("a")));
    }

    #[test]
    fn test_bare_link_rows_keep_plain_titles() {
        let config = Config {
            assign_mode: AssignMode::Inline,
            ..Default::default()
        };
        let page = r#"<nav><a href="/c/x">Loose</a><ol><li><a href="/c/a">Alpha</a></li></ol></nav>"#;
        let host = HostPage::from_markup(page, config.host_menu_delay()).unwrap();
        let store = FolderStore::new(Box::new(MemoryStorage::new()));
        let start = Instant::now();
        let mut app = App::new(config, host, store, start).unwrap();
        app.tick(start);
        app.tick(start);

        let rows = app.sidebar_rows();
        assert_eq!(titles(&app), vec!["Loose", "Alpha"]);
        assert!(rows.iter().all(|row| row.assign_control.is_some()));
    }

    #[test]
    fn test_reserved_name_keeps_prompt_open() {
        let (mut app, _) = app(AssignMode::Inline);
        app.open_new_folder();
        app.submit_new_folder("All");
        match &app.modal_state {
            ModalState::NewFolder(state) => assert!(state.error_message.is_some()),
            _ => panic!("prompt should stay open"),
        }
        app.submit_new_folder("   ");
        assert!(!app.is_modal_open());
        assert!(app.folders.folders.is_empty());
    }

    #[test]
    fn test_menu_flow_assigns_through_host_menu() {
        let (mut app, start) = app(AssignMode::Menu);
        app.submit_new_folder("Work");
        app.tick(start);

        app.open_selected_row_menu(start);
        app.tick(ms(start, 20));
        assert_eq!(app.menu_items().len(), 3);

        app.tick(ms(start, 50));
        let items = app.menu_items();
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].1, "Assign to Folder");

        app.move_menu_selection(10);
        app.activate_menu_item(ms(start, 60));
        assert!(app.host.open_menu().is_none());
        picker_choice(&mut app, Some("Work"));

        let snapshot = app.store.read().unwrap();
        assert!(snapshot.contains("Work", &ConversationId::from("a")));
    }

    #[test]
    fn test_unassign_and_delete_from_panel() {
        let (mut app, start) = app(AssignMode::Inline);
        app.submit_new_folder("Work");
        app.store.assign("Work", &ConversationId::from("a")).unwrap();
        app.set_active_folder("Work");
        app.tick(start);
        assert_eq!(titles(&app), vec!["Alpha"]);

        app.unassign_selected_row();
        app.tick(start);
        assert!(titles(&app).is_empty());

        app.panel_state.list_state.select(Some(1));
        app.delete_selected_folder();
        app.tick(start);
        assert!(app.folders.folders.is_empty());
        // The active folder is left dangling, so nothing is shown
        assert_eq!(app.folders.active_folder, "Work");
        assert!(titles(&app).is_empty());
    }

    #[test]
    fn test_all_cannot_be_deleted() {
        let (mut app, _) = app(AssignMode::Inline);
        app.panel_state.list_state.select(Some(0));
        app.delete_selected_folder();
        assert_eq!(app.toast_manager.latest(), Some(&Notice::AllNotDeletable));
    }
}
