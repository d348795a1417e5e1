use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{move_selection, App, Focus};

use super::modal::forward_key_to_modal;

/// Action returned from key handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Continue,
    Quit,
}

pub(crate) fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) -> KeyAction {
    // True global keybinding, works even inside modals
    if let (KeyCode::Char('q'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return KeyAction::Quit;
    }

    // 1. Modals capture everything
    if app.is_modal_open() {
        forward_key_to_modal(app, key);
        return KeyAction::Continue;
    }

    // 2. An open host menu behaves like a popup
    if app.host.open_menu().is_some() {
        handle_menu_key(app, key, now);
        return KeyAction::Continue;
    }

    // 3. Keys shared by both panes
    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Tab if app.panel_state.open => {
            app.focus = app.focus.toggle();
            return KeyAction::Continue;
        }
        KeyCode::Char('f') => {
            app.toggle_panel();
            return KeyAction::Continue;
        }
        KeyCode::Char('n') => {
            app.open_new_folder();
            return KeyAction::Continue;
        }
        KeyCode::Char('<') => {
            app.resize_panel(-5);
            return KeyAction::Continue;
        }
        KeyCode::Char('>') => {
            app.resize_panel(5);
            return KeyAction::Continue;
        }
        KeyCode::Char('r') => {
            app.reload_host();
            return KeyAction::Continue;
        }
        _ => {}
    }

    match app.focus {
        Focus::Sidebar => handle_sidebar_key(app, key, now),
        Focus::Folders => handle_panel_key(app, key),
    }
    KeyAction::Continue
}

fn handle_sidebar_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            let len = app.listed_rows().len();
            move_selection(&mut app.sidebar_state.list_state, len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let len = app.listed_rows().len();
            move_selection(&mut app.sidebar_state.list_state, len, -1);
        }
        KeyCode::Char('a') => app.assign_selected_row(now),
        KeyCode::Char('m') | KeyCode::Enter => app.open_selected_row_menu(now),
        KeyCode::Char('x') => app.unassign_selected_row(),
        KeyCode::Char('h') => app.toggle_show_hidden(),
        _ => {}
    }
}

fn handle_panel_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            let len = app.panel_entries().len();
            move_selection(&mut app.panel_state.list_state, len, 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let len = app.panel_entries().len();
            move_selection(&mut app.panel_state.list_state, len, -1);
        }
        KeyCode::Enter | KeyCode::Char(' ') => app.select_panel_entry(),
        KeyCode::Char('d') => app.delete_selected_folder(),
        _ => {}
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_host_menu(),
        KeyCode::Char('j') | KeyCode::Down => app.move_menu_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_menu_selection(-1),
        KeyCode::Enter => app.activate_menu_item(now),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::folders::FolderStore;
    use crate::host::HostPage;
    use crate::inject::AssignMode;
    use crate::storage::MemoryStorage;

    const PAGE: &str = r#"<nav><ol data-testid="conversation-list">
        <li><a href="/c/a">Alpha</a></li>
        <li><a href="/c/b">Beta</a></li>
      </ol></nav>"#;

    fn app() -> App {
        let config = Config {
            assign_mode: AssignMode::Inline,
            ..Default::default()
        };
        let host = HostPage::from_markup(PAGE, config.host_menu_delay()).unwrap();
        let store = FolderStore::new(Box::new(MemoryStorage::new()));
        let now = Instant::now();
        let mut app = App::new(config, host, store, now).unwrap();
        app.tick(now);
        app
    }

    fn press(app: &mut App, code: KeyCode) -> KeyAction {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE), Instant::now())
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(
            handle_key_event(
                &mut app,
                KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
                Instant::now()
            ),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_new_folder_prompt_captures_typing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(app.is_modal_open());
        // 'q' is text inside the prompt, not quit
        type_str(&mut app, "Rq");
        assert_eq!(press(&mut app, KeyCode::Enter), KeyAction::Continue);
        assert!(!app.is_modal_open());
        assert!(app.store.read().unwrap().folders.contains_key("Rq"));
    }

    #[test]
    fn test_panel_navigation_selects_folder() {
        let mut app = app();
        app.submit_new_folder("Work");
        app.tick(Instant::now());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Folders);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.read().unwrap().active_folder, "Work");
    }

    #[test]
    fn test_sidebar_navigation_and_picker() {
        let mut app = app();
        app.submit_new_folder("Work");
        app.tick(Instant::now());

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_row().map(|row| row.title), Some("Beta".to_string()));
        press(&mut app, KeyCode::Char('a'));
        assert!(app.is_modal_open());
        press(&mut app, KeyCode::Enter);
        assert!(app
            .store
            .read()
            .unwrap()
            .contains("Work", &crate::sidebar::identity::ConversationId::from("b")));
    }
}
