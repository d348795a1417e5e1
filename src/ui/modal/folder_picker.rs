//! Folder picker shown while a conversation waits to be assigned.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use super::{Modal, ModalKeyResult};
use crate::inject::flow::PendingAssignment;
use crate::ui::truncate;

pub struct FolderPickerState {
    pending: PendingAssignment,
    pub list_state: ListState,
}

impl FolderPickerState {
    pub fn new(pending: PendingAssignment) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            pending,
            list_state,
        }
    }

    pub fn pending(&self) -> &PendingAssignment {
        &self.pending
    }

    pub fn into_pending(self) -> PendingAssignment {
        self.pending
    }

    pub fn selected_folder(&self) -> Option<&str> {
        let i = self.list_state.selected()?;
        self.pending.folders().get(i).map(String::as_str)
    }

    fn move_by(&mut self, delta: isize) {
        let len = self.pending.folders().len();
        crate::app::move_selection(&mut self.list_state, len, delta);
    }
}

impl Modal for FolderPickerState {
    fn handle_key_modal(&mut self, key: KeyEvent) -> ModalKeyResult {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => ModalKeyResult::FolderChosen(None),
            KeyCode::Enter => {
                ModalKeyResult::FolderChosen(self.selected_folder().map(str::to_string))
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_by(1);
                ModalKeyResult::Continue
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_by(-1);
                ModalKeyResult::Continue
            }
            _ => ModalKeyResult::Continue,
        }
    }
}

pub struct FolderPickerModal<'a> {
    state: &'a mut FolderPickerState,
}

impl<'a> FolderPickerModal<'a> {
    pub fn new(state: &'a mut FolderPickerState) -> Self {
        Self { state }
    }

    /// Centered, ~40% width, tall enough for a handful of folders.
    pub fn calculate_area(total: Rect, folders: usize) -> Rect {
        let width = (total.width * 40 / 100)
            .max(36)
            .min(total.width.saturating_sub(4));
        let height = (folders as u16 + 6).min(total.height.saturating_sub(4));

        let x = (total.width.saturating_sub(width)) / 2;
        let y = (total.height.saturating_sub(height)) / 2;

        Rect::new(x, y, width, height)
    }
}

impl Widget for FolderPickerModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 5 {
            return;
        }

        Clear.render(area, buf);

        let title = format!(
            " Assign {} ",
            truncate(self.state.pending.chat_id().as_str(), 20)
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1), // Label
            Constraint::Min(1),    // Folder list
            Constraint::Length(1), // Help bar
        ])
        .split(inner);

        Paragraph::new("Folder:")
            .style(Style::default().fg(Color::White))
            .render(chunks[0], buf);

        let items: Vec<ListItem> = self
            .state
            .pending
            .folders()
            .iter()
            .map(|name| ListItem::new(format!("📁 {}", name)))
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        StatefulWidget::render(list, chunks[1], buf, &mut self.state.list_state);

        let help = Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Cyan)),
            Span::raw("assign "),
            Span::styled(" Esc ", Style::default().fg(Color::Cyan)),
            Span::raw("cancel"),
        ]);
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::FolderStore;
    use crate::inject::flow::{begin, AssignStart};
    use crate::sidebar::identity::ConversationId;
    use crate::storage::MemoryStorage;
    use crossterm::event::KeyModifiers;

    fn picker(folders: &[&str]) -> FolderPickerState {
        let mut store = FolderStore::new(Box::new(MemoryStorage::new()));
        for name in folders {
            store.create_folder(name).unwrap();
        }
        match begin(&store, ConversationId::from("abc")).unwrap() {
            AssignStart::Choose(pending) => FolderPickerState::new(pending),
            AssignStart::NoFolders => panic!("expected folders"),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_chooses_selected_folder() {
        let mut state = picker(&["Work", "Archive"]);
        state.handle_key_modal(key(KeyCode::Down));
        match state.handle_key_modal(key(KeyCode::Enter)) {
            ModalKeyResult::FolderChosen(choice) => assert_eq!(choice.as_deref(), Some("Work")),
            _ => panic!("expected a choice"),
        }
    }

    #[test]
    fn test_escape_cancels() {
        let mut state = picker(&["Work"]);
        assert!(matches!(
            state.handle_key_modal(key(KeyCode::Esc)),
            ModalKeyResult::FolderChosen(None)
        ));
    }
}
