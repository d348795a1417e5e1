//! Independent type definitions used by App.

use ratatui::widgets::ListState;

use crate::dom::NodeId;
use crate::sidebar::identity::ConversationId;

/// Which UI pane currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The host's conversation list
    #[default]
    Sidebar,
    /// The folder panel
    Folders,
}

impl Focus {
    pub fn toggle(&self) -> Self {
        match self {
            Focus::Sidebar => Focus::Folders,
            Focus::Folders => Focus::Sidebar,
        }
    }
}

/// A conversation row as the sidebar pane shows it, read from the host DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarRow {
    pub id: ConversationId,
    pub title: String,
    pub node: NodeId,
    /// Carries the hide marker
    pub hidden: bool,
    /// Our inline assign button, if injected
    pub assign_control: Option<NodeId>,
    /// The host's menu trigger, if rendered
    pub menu_trigger: Option<NodeId>,
}

/// One line of the folder panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub name: String,
    /// Member count; `None` for the "All" entry
    pub members: Option<usize>,
    /// Members that are currently listed in the sidebar
    pub present: usize,
    pub active: bool,
}

/// Selection in the sidebar pane.
#[derive(Debug, Default)]
pub struct SidebarState {
    pub list_state: ListState,
    /// List hidden rows (dimmed) instead of omitting them
    pub show_hidden: bool,
}

/// Folder panel visibility and selection.
#[derive(Debug)]
pub struct FolderPanelState {
    pub list_state: ListState,
    pub open: bool,
}

impl FolderPanelState {
    pub fn new(open: bool) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state, open }
    }
}

/// Move a list selection by `delta`, clamped to `len` entries.
pub fn move_selection(list_state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        list_state.select(None);
        return;
    }
    let current = list_state.selected().unwrap_or(0).min(len - 1) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    list_state.select(Some(next as usize));
}

/// Keep a selection inside a list that may have shrunk.
pub fn clamp_selection(list_state: &mut ListState, len: usize) {
    match (len, list_state.selected()) {
        (0, _) => list_state.select(None),
        (_, None) => list_state.select(Some(0)),
        (len, Some(i)) if i >= len => list_state.select(Some(len - 1)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_selection_clamps() {
        let mut state = ListState::default();
        move_selection(&mut state, 3, 1);
        assert_eq!(state.selected(), Some(1));
        move_selection(&mut state, 3, 5);
        assert_eq!(state.selected(), Some(2));
        move_selection(&mut state, 3, -10);
        assert_eq!(state.selected(), Some(0));
        move_selection(&mut state, 0, 1);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_clamp_selection_after_shrink() {
        let mut state = ListState::default();
        state.select(Some(4));
        clamp_selection(&mut state, 2);
        assert_eq!(state.selected(), Some(1));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
        clamp_selection(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn test_focus_toggle() {
        assert_eq!(Focus::Sidebar.toggle(), Focus::Folders);
        assert_eq!(Focus::Folders.toggle(), Focus::Sidebar);
    }
}
