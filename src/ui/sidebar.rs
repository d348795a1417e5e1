//! Conversation list pane: the host's sidebar as the filter left it.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::app::SidebarRow;
use crate::folders::ALL_FOLDERS;
use crate::ui::truncate;

pub struct Sidebar<'a> {
    rows: &'a [SidebarRow],
    active_folder: &'a str,
    /// The conversation list has been found and is observed
    observing: bool,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(rows: &'a [SidebarRow], active_folder: &'a str, observing: bool, focused: bool) -> Self {
        Self {
            rows,
            active_folder,
            observing,
            focused,
        }
    }

    fn title(&self) -> String {
        if !self.observing {
            return " Conversations (searching…) ".to_string();
        }
        if self.active_folder == ALL_FOLDERS {
            " Conversations ".to_string()
        } else {
            format!(" Conversations · {} ", truncate(self.active_folder, 24))
        }
    }
}

impl StatefulWidget for Sidebar<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.rows.is_empty() {
            let message = if self.observing {
                "Nothing to show in this folder"
            } else {
                "Waiting for the conversation list"
            };
            Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
                .render(inner, buf);
            return;
        }

        let title_width = (inner.width as usize).saturating_sub(8);
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| row_item(row, title_width))
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        StatefulWidget::render(list, inner, buf, state);
    }
}

fn row_item(row: &SidebarRow, title_width: usize) -> ListItem<'static> {
    let title = if row.title.is_empty() {
        row.id.to_string()
    } else {
        row.title.clone()
    };
    let title_style = if row.hidden {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![Span::styled(truncate(&title, title_width), title_style)];
    if row.assign_control.is_some() {
        spans.push(Span::styled(" 📁+", Style::default().fg(Color::Yellow)));
    }
    if row.menu_trigger.is_some() {
        spans.push(Span::styled(" ⋯", Style::default().fg(Color::DarkGray)));
    }
    ListItem::new(Line::from(spans))
}
