use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::config::LayoutConfig;

/// Split into conversation list, optional folder panel and a help bar.
pub fn create_layout(area: Rect, layout: &LayoutConfig, panel_open: bool) -> (Rect, Option<Rect>, Rect) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let (main_area, help_area) = (vertical[0], vertical[1]);

    if !panel_open {
        return (main_area, None, help_area);
    }

    let panel_pct = layout.panel_width_pct.clamp(20, 60) as u16;
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(100 - panel_pct),
            Constraint::Percentage(panel_pct),
        ])
        .split(main_area);

    (horizontal[0], Some(horizontal[1]), help_area)
}
