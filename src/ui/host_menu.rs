//! Popup showing the host's open context menu.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::dom::NodeId;

pub struct HostMenuPopup<'a> {
    items: &'a [(NodeId, String)],
    selected: usize,
}

impl<'a> HostMenuPopup<'a> {
    pub fn new(items: &'a [(NodeId, String)], selected: usize) -> Self {
        Self { items, selected }
    }

    /// Just right of the selected sidebar row, kept inside `bounds`.
    pub fn calculate_area(bounds: Rect, anchor_y: u16, items: usize) -> Rect {
        let width = 24u16.min(bounds.width);
        let height = (items as u16 + 2).min(bounds.height);
        let x = bounds.x + (bounds.width / 3).min(bounds.width.saturating_sub(width));
        let y = anchor_y
            .max(bounds.y)
            .min(bounds.bottom().saturating_sub(height));
        Rect::new(x, y, width, height)
    }
}

impl Widget for HostMenuPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, (_, label))| {
                let style = if i == self.selected {
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!(" {} ", label), style))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_stays_inside_bounds() {
        let bounds = Rect::new(0, 0, 60, 20);
        let area = HostMenuPopup::calculate_area(bounds, 19, 4);
        assert_eq!(area.height, 6);
        assert!(area.bottom() <= bounds.bottom());
        assert!(area.right() <= bounds.right());
    }
}
