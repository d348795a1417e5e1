//! Per-row "assign to folder" controls injected into the host sidebar.
//!
//! Two strategies exist: an always-visible inline button on each row
//! ([`InlineButton`]), or an item added to the host's own context menu when
//! it opens ([`menu::HostMenuItem`]). Both are safe to run on every indexing
//! pass; the presence of our marker is checked before anything is added.

pub mod flow;
pub mod menu;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, DomError, NodeId, Selector};
use crate::sidebar::identity::ConversationId;
use crate::sidebar::Row;

/// Class of the inline assign button.
pub const ASSIGN_BUTTON_CLASS: &str = "cgpf-assign-btn";
/// Class of the item added to the host context menu.
pub const ASSIGN_MENU_ITEM_CLASS: &str = "cgpf-assign-menu-item";
/// Marks an element we own and what activating it does.
pub const ACTION_ATTR: &str = "data-cgpf-action";
pub const ASSIGN_ACTION: &str = "assign";
/// Conversation captured by an injected control.
pub const CHAT_ID_ATTR: &str = "data-cgpf-chat-id";
/// Set on host menu triggers we already listen to.
pub const BOUND_ATTR: &str = "data-cgpf-bound";

/// How the assign control is attached to rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssignMode {
    /// A button on every row
    Inline,
    /// An item in the host's per-row context menu
    #[default]
    Menu,
}

/// Attaches the assign control to one indexed row.
pub trait RowAffordance {
    /// Ensure the control exists exactly once. Returns true if this call
    /// added or bound something.
    fn ensure(&self, doc: &mut Document, row: &Row, id: &ConversationId) -> Result<bool, DomError>;
}

pub fn affordance_for(mode: AssignMode) -> Box<dyn RowAffordance> {
    match mode {
        AssignMode::Inline => Box::new(InlineButton),
        AssignMode::Menu => Box::new(menu::HostMenuItem),
    }
}

/// Inline `📁+` button appended to each row.
pub struct InlineButton;

impl RowAffordance for InlineButton {
    fn ensure(&self, doc: &mut Document, row: &Row, id: &ConversationId) -> Result<bool, DomError> {
        if !doc.contains_node(row.node) {
            return Err(DomError::Stale);
        }
        if doc
            .query_first(row.node, Selector::Class(ASSIGN_BUTTON_CLASS))
            .is_some()
        {
            return Ok(false);
        }
        let button = create_assign_control(doc, "button", ASSIGN_BUTTON_CLASS, "📁+", id)?;
        doc.set_attribute(button, "title", "Assign to folder")?;
        doc.append_child(row.node, button)?;
        Ok(true)
    }
}

/// Build a detached element that starts the assignment flow for `id`.
pub(crate) fn create_assign_control(
    doc: &mut Document,
    tag: &str,
    class: &str,
    label: &str,
    id: &ConversationId,
) -> Result<NodeId, DomError> {
    let node = doc.create_element(tag);
    doc.add_class(node, class)?;
    doc.set_attribute(node, ACTION_ATTR, ASSIGN_ACTION)?;
    doc.set_attribute(node, CHAT_ID_ATTR, id.as_str())?;
    doc.set_text(node, label)?;
    Ok(node)
}

/// What activating (clicking) an element means to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// One of our assign controls: start the assignment flow
    Assign(ConversationId),
    /// A host menu trigger we are bound to: check for the menu shortly
    MenuTrigger(ConversationId),
}

/// Resolve a click on `node` (or any element inside one of our controls).
///
/// The captured id stays valid even if the row has since been re-rendered.
pub fn resolve_activation(doc: &Document, node: NodeId) -> Option<Activation> {
    if let Some(control) = doc.closest(
        node,
        Selector::AttrEquals {
            tag: None,
            name: ACTION_ATTR,
            value: ASSIGN_ACTION,
        },
    ) {
        let id = doc.attribute(control, CHAT_ID_ATTR)?;
        return Some(Activation::Assign(ConversationId::from(id)));
    }
    let trigger = doc.closest(
        node,
        Selector::HasAttr {
            tag: None,
            name: BOUND_ATTR,
        },
    )?;
    let id = doc.attribute(trigger, CHAT_ID_ATTR)?;
    Some(Activation::MenuTrigger(ConversationId::from(id)))
}

/// Strategy that attaches nothing.
#[cfg(test)]
pub struct NoAffordance;

#[cfg(test)]
impl RowAffordance for NoAffordance {
    fn ensure(&self, _doc: &mut Document, _row: &Row, _id: &ConversationId) -> Result<bool, DomError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;
    use crate::sidebar::find_container;

    fn single_row() -> (Document, Row, ConversationId) {
        let doc = markup::load(r#"<nav><ol><li><a href="/c/abc">Chat</a></li></ol></nav>"#).unwrap();
        let container = find_container(&doc).unwrap();
        let li = doc.query_first(container, Selector::Tag("li")).unwrap();
        let a = doc.query_first(li, Selector::Tag("a")).unwrap();
        (doc, Row { node: li, anchor: a }, ConversationId::from("abc"))
    }

    #[test]
    fn inline_button_is_injected_once() {
        let (mut doc, row, id) = single_row();
        assert!(InlineButton.ensure(&mut doc, &row, &id).unwrap());
        assert!(!InlineButton.ensure(&mut doc, &row, &id).unwrap());
        let buttons = doc.query_all(row.node, Selector::Class(ASSIGN_BUTTON_CLASS));
        assert_eq!(buttons.len(), 1);
        assert_eq!(doc.attribute(buttons[0], CHAT_ID_ATTR), Some("abc"));
    }

    #[test]
    fn inline_button_on_stale_row_is_an_error() {
        let (mut doc, row, id) = single_row();
        doc.remove(row.node).unwrap();
        assert_eq!(InlineButton.ensure(&mut doc, &row, &id), Err(DomError::Stale));
    }

    #[test]
    fn clicking_inside_the_button_resolves_to_assign() {
        let (mut doc, row, id) = single_row();
        InlineButton.ensure(&mut doc, &row, &id).unwrap();
        let button = doc
            .query_first(row.node, Selector::Class(ASSIGN_BUTTON_CLASS))
            .unwrap();
        assert_eq!(resolve_activation(&doc, button), Some(Activation::Assign(id)));
        // The conversation link itself is the host's, not ours
        assert_eq!(resolve_activation(&doc, row.anchor), None);
    }

    #[test]
    fn activation_survives_row_rerender() {
        let (mut doc, row, id) = single_row();
        InlineButton.ensure(&mut doc, &row, &id).unwrap();
        let button = doc
            .query_first(row.node, Selector::Class(ASSIGN_BUTTON_CLASS))
            .unwrap();
        let activation = resolve_activation(&doc, button);
        doc.remove(row.node).unwrap();
        assert_eq!(activation, Some(Activation::Assign(id)));
    }
}
