//! New folder modal dialog.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::{Modal, ModalKeyResult};

/// State for the new folder modal dialog.
#[derive(Debug, Default)]
pub struct NewFolderModalState {
    /// Folder name input
    pub name_input: String,
    /// Cursor position in input, in chars
    pub cursor_pos: usize,
    /// Error message to display
    pub error_message: Option<String>,
}

impl NewFolderModalState {
    pub fn new() -> Self {
        Self::default()
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.name_input
            .char_indices()
            .nth(char_pos)
            .map_or(self.name_input.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.name_input.chars().count()
    }

    /// Handle key input. Returns Some(name) on Enter, None otherwise.
    ///
    /// The name is submitted as typed; trimming and validation happen in the
    /// folder store.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Enter => Some(self.name_input.clone()),
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor_pos);
                self.name_input.insert(at, c);
                self.cursor_pos += 1;
                self.error_message = None;
                None
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = self.byte_index(self.cursor_pos);
                    self.name_input.remove(at);
                    self.error_message = None;
                }
                None
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.char_len() {
                    let at = self.byte_index(self.cursor_pos);
                    self.name_input.remove(at);
                    self.error_message = None;
                }
                None
            }
            KeyCode::Left => {
                self.cursor_pos = self.cursor_pos.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                if self.cursor_pos < self.char_len() {
                    self.cursor_pos += 1;
                }
                None
            }
            KeyCode::Home => {
                self.cursor_pos = 0;
                None
            }
            KeyCode::End => {
                self.cursor_pos = self.char_len();
                None
            }
            _ => None,
        }
    }
}

impl Modal for NewFolderModalState {
    fn handle_key_modal(&mut self, key: KeyEvent) -> ModalKeyResult {
        if key.code == KeyCode::Esc {
            return ModalKeyResult::Close;
        }
        match self.handle_key(key) {
            Some(name) => ModalKeyResult::FolderNamed(name),
            None => ModalKeyResult::Continue,
        }
    }
}

/// Widget for rendering the new folder modal.
pub struct NewFolderModal<'a> {
    state: &'a NewFolderModalState,
}

impl<'a> NewFolderModal<'a> {
    pub fn new(state: &'a NewFolderModalState) -> Self {
        Self { state }
    }

    /// Calculate the modal area (centered, ~40% width, 10 lines).
    pub fn calculate_area(total: Rect) -> Rect {
        let width = (total.width * 40 / 100)
            .max(36)
            .min(total.width.saturating_sub(4));
        let height = 10u16.min(total.height.saturating_sub(4));

        let x = (total.width.saturating_sub(width)) / 2;
        let y = (total.height.saturating_sub(height)) / 2;

        Rect::new(x, y, width, height)
    }
}

impl Widget for NewFolderModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 6 {
            return;
        }

        Clear.render(area, buf);

        let block = Block::default()
            .title(" New Folder ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(2), // Label
            Constraint::Length(3), // Input field
            Constraint::Length(1), // Error message
            Constraint::Min(0),    // Spacer
            Constraint::Length(1), // Help bar
        ])
        .split(inner);

        Paragraph::new("Folder name:")
            .style(Style::default().fg(Color::White))
            .render(chunks[0], buf);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let input_inner = input_block.inner(chunks[1]);
        input_block.render(chunks[1], buf);

        // Scroll so the cursor stays in view
        let chars: Vec<char> = self.state.name_input.chars().collect();
        let available_width = (input_inner.width as usize).max(1);
        let cursor_pos = self.state.cursor_pos.min(chars.len());
        let start = (cursor_pos + 1).saturating_sub(available_width);
        let end = (start + available_width).min(chars.len());

        let mut spans = Vec::new();
        for (i, c) in chars[start..end].iter().enumerate() {
            if start + i == cursor_pos {
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default().bg(Color::White).fg(Color::Black),
                ));
            } else {
                spans.push(Span::raw(c.to_string()));
            }
        }
        if cursor_pos >= end {
            spans.push(Span::styled(" ", Style::default().bg(Color::White)));
        }
        Paragraph::new(Line::from(spans)).render(input_inner, buf);

        if let Some(ref error) = self.state.error_message {
            Paragraph::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )))
            .render(chunks[2], buf);
        }

        let help = Line::from(vec![
            Span::styled(
                " Enter ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("create "),
            Span::styled(
                " Esc ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("cancel"),
        ]);
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut NewFolderModalState, s: &str) {
        for c in s.chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_submit() {
        let mut state = NewFolderModalState::new();
        type_str(&mut state, " Work ");
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Some(" Work ".to_string()));
    }

    #[test]
    fn test_editing_multibyte_input() {
        let mut state = NewFolderModalState::new();
        type_str(&mut state, "Café");
        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.name_input, "Caf");
        state.handle_key(key(KeyCode::Home));
        state.handle_key(key(KeyCode::Delete));
        type_str(&mut state, "Ü");
        assert_eq!(state.name_input, "Üaf");
        assert_eq!(state.cursor_pos, 1);
    }

    #[test]
    fn test_escape_closes() {
        let mut state = NewFolderModalState::new();
        assert!(matches!(
            state.handle_key_modal(key(KeyCode::Esc)),
            ModalKeyResult::Close
        ));
    }
}
