use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{poll, read};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::app::{App, Focus, ModalState};
use crate::event::Event;
use crate::handlers::keyboard::{handle_key_event, KeyAction};
use crate::ui::layout::create_layout;
use crate::ui::modal::{FolderPickerModal, NewFolderModal};
use crate::ui::{FolderPanel, HostMenuPopup, Sidebar, ToastWidget};

/// How long to wait for input before ticking
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());

        terminal.draw(|f| draw_ui(f, app))?;

        let event = if poll(POLL_INTERVAL)? {
            Event::from(read()?)
        } else {
            Event::Tick
        };

        match event {
            Event::Key(key) => {
                if handle_key_event(app, key, Instant::now()) == KeyAction::Quit {
                    app.should_quit = true;
                }
            }
            // Redrawn on the next turn at the new size
            Event::Resize(..) | Event::Tick => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw_ui(f: &mut Frame, app: &mut App) {
    let (list_area, panel_area, help_area) =
        create_layout(f.area(), &app.config.layout, app.panel_state.open);

    let rows = app.listed_rows();
    let observing = app.propagator().discovery().is_observing();
    let active_folder = app.folders.active_folder.clone();
    let sidebar = Sidebar::new(&rows, &active_folder, observing, app.focus == Focus::Sidebar);
    f.render_stateful_widget(sidebar, list_area, &mut app.sidebar_state.list_state);

    if let Some(panel_area) = panel_area {
        let entries = app.panel_entries();
        let panel = FolderPanel::new(&entries, app.focus == Focus::Folders);
        f.render_stateful_widget(panel, panel_area, &mut app.panel_state.list_state);
    }

    let menu_items = app.menu_items();
    if !menu_items.is_empty() {
        // Border plus the selected row's offset within the scrolled list
        let selected = app.sidebar_state.list_state.selected().unwrap_or(0);
        let offset = app.sidebar_state.list_state.offset();
        let anchor_y = list_area.y + 1 + selected.saturating_sub(offset) as u16;
        let area = HostMenuPopup::calculate_area(list_area, anchor_y, menu_items.len());
        f.render_widget(HostMenuPopup::new(&menu_items, app.menu_selection), area);
    }

    draw_help_bar(f, help_area, app, !menu_items.is_empty());

    let toasts: Vec<_> = app.toast_manager.visible_toasts();
    if !toasts.is_empty() {
        ToastWidget::new(&toasts).render(f, f.area());
    }

    // Modal last (highest z-index)
    draw_modal(f, app);
}

fn draw_modal(f: &mut Frame, app: &mut App) {
    match &mut app.modal_state {
        ModalState::None => {}
        ModalState::NewFolder(state) => {
            let area = NewFolderModal::calculate_area(f.area());
            f.render_widget(NewFolderModal::new(state), area);
        }
        ModalState::FolderPicker(state) => {
            let area = FolderPickerModal::calculate_area(f.area(), state.pending().folders().len());
            f.render_widget(FolderPickerModal::new(state), area);
        }
    }
}

fn draw_help_bar(f: &mut Frame, area: Rect, app: &App, menu_open: bool) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));

    let mut spans = match (menu_open, app.focus) {
        (true, _) => vec![
            key(" j/k "),
            Span::raw("move "),
            key(" Enter "),
            Span::raw("choose "),
            key(" Esc "),
            Span::raw("close"),
        ],
        (false, Focus::Sidebar) => vec![
            key(" j/k "),
            Span::raw("nav "),
            key(" a "),
            Span::raw("assign "),
            key(" m "),
            Span::raw("menu "),
            key(" x "),
            Span::raw("remove "),
            key(" h "),
            Span::raw("hidden "),
            key(" n "),
            Span::raw("new folder "),
            key(" Tab "),
            Span::raw("folders "),
            key(" q "),
            Span::raw("quit"),
        ],
        (false, Focus::Folders) => vec![
            key(" j/k "),
            Span::raw("nav "),
            key(" Enter "),
            Span::raw("show "),
            key(" n "),
            Span::raw("new "),
            key(" d "),
            Span::raw("delete "),
            key(" </> "),
            Span::raw("resize "),
            key(" Tab "),
            Span::raw("list "),
            key(" q "),
            Span::raw("quit"),
        ],
    };

    if let Some(pass) = app.last_pass {
        spans.push(Span::styled(
            format!("  {}/{} shown", pass.visible, pass.indexed),
            Style::default().fg(Color::Gray),
        ));
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}
