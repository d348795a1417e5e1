use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::ui::toast::{Toast, ToastLevel};

const MIN_WIDTH: u16 = 24;
const MAX_WIDTH: u16 = 48;

/// Toasts stacked upward from the bottom-right corner, newest lowest.
pub struct ToastWidget<'a> {
    toasts: &'a [&'a Toast],
}

impl<'a> ToastWidget<'a> {
    pub fn new(toasts: &'a [&'a Toast]) -> Self {
        Self { toasts }
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut bottom = area.bottom().saturating_sub(2);

        for toast in self.toasts.iter().rev() {
            let message = toast.message();
            let width = toast_width(&message).min(area.width.saturating_sub(4));
            let height = 3u16;
            if bottom < area.top() + height || width < 8 {
                break;
            }
            let toast_area = Rect::new(
                area.right().saturating_sub(width + 2),
                bottom - height,
                width,
                height,
            );
            bottom -= height + 1;

            let color = toast_color(toast.level());
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(Color::Black));
            let text = Paragraph::new(Line::from(vec![
                Span::styled(
                    toast_icon(toast.level()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(message),
            ]))
            .wrap(Wrap { trim: true })
            .block(block);

            frame.render_widget(Clear, toast_area);
            frame.render_widget(text, toast_area);
        }
    }
}

/// Border plus icon plus message, clamped.
fn toast_width(message: &str) -> u16 {
    let len = message.chars().count().min(u16::MAX as usize) as u16;
    len.saturating_add(6).clamp(MIN_WIDTH, MAX_WIDTH)
}

fn toast_icon(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Info => "ℹ",
        ToastLevel::Success => "✓",
        ToastLevel::Warning => "⚠",
        ToastLevel::Error => "✗",
    }
}

fn toast_color(level: ToastLevel) -> Color {
    match level {
        ToastLevel::Info => Color::Cyan,
        ToastLevel::Success => Color::Green,
        ToastLevel::Warning => Color::Yellow,
        ToastLevel::Error => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_clamped() {
        assert_eq!(toast_width("ok"), MIN_WIDTH);
        assert_eq!(toast_width(&"x".repeat(200)), MAX_WIDTH);
        assert_eq!(toast_width(&"x".repeat(30)), 36);
    }
}
