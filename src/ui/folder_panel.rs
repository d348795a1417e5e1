//! Folder panel: "All" plus every folder, with the active one marked.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::app::PanelEntry;
use crate::ui::truncate;

pub struct FolderPanel<'a> {
    entries: &'a [PanelEntry],
    focused: bool,
}

impl<'a> FolderPanel<'a> {
    pub fn new(entries: &'a [PanelEntry], focused: bool) -> Self {
        Self { entries, focused }
    }
}

impl StatefulWidget for FolderPanel<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(" 📁 Folders ")
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let name_width = (inner.width as usize).saturating_sub(12);
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| entry_item(entry, name_width))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        StatefulWidget::render(list, inner, buf, state);
    }
}

fn entry_item(entry: &PanelEntry, name_width: usize) -> ListItem<'static> {
    let marker = if entry.active { "● " } else { "  " };
    let name_style = if entry.active {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let counts = match entry.members {
        Some(members) => format!(" {}/{}", entry.present, members),
        None => format!(" {}", entry.present),
    };

    ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Green)),
        Span::styled(truncate(&entry.name, name_width), name_style),
        Span::styled(counts, Style::default().fg(Color::DarkGray)),
    ]))
}
