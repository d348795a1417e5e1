pub use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// No input before the poll timeout; time to let the host and store catch up
    Tick,
    /// Keyboard input
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
}

impl From<CrosstermEvent> for Event {
    fn from(event: CrosstermEvent) -> Self {
        match event {
            // Key releases (reported on some platforms) would double every action
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Event::Key(key),
            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
            _ => Event::Tick,
        }
    }
}
