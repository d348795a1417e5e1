//! Terminal UI components: conversation list, folder panel, modals, and widgets.

pub mod folder_panel;
pub mod host_menu;
pub mod layout;
pub mod modal;
pub mod sidebar;
pub mod toast;
pub mod toast_widget;

pub use folder_panel::FolderPanel;
pub use host_menu::HostMenuPopup;
pub use sidebar::Sidebar;
pub use toast::{Notice, Toast, ToastLevel, ToastManager};
pub use toast_widget::ToastWidget;

/// Shorten `s` to at most `max` chars, ending in an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Work", 10), "Work");
        assert_eq!(truncate("Research notes", 8), "Researc…");
        assert_eq!(truncate("Café au lait", 5), "Café…");
        assert_eq!(truncate("abc", 0), "");
    }
}
