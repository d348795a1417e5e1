//! Assign item inside the host's per-row context menu.
//!
//! The host renders its menu asynchronously after the trigger is clicked, so
//! binding happens in two steps: the trigger button is marked during
//! indexing, and each activation schedules a short deferred check that adds
//! our item to whatever menu is open by then.

use std::time::{Duration, Instant};

use tracing::debug;

use super::{
    create_assign_control, RowAffordance, ASSIGN_MENU_ITEM_CLASS, BOUND_ATTR, CHAT_ID_ATTR,
};
use crate::dom::{Document, DomError, NodeId, Selector};
use crate::sidebar::identity::ConversationId;
use crate::sidebar::Row;

/// Host menu triggers carry generated ids with this prefix.
pub const MENU_TRIGGER_ID_PREFIX: &str = "radix-";

pub const MENU_ITEM_LABEL: &str = "Assign to Folder";

const MENU_TRIGGER: Selector<'static> = Selector::AttrPrefix {
    tag: Some("button"),
    name: "id",
    prefix: MENU_TRIGGER_ID_PREFIX,
};

const OPEN_MENU: Selector<'static> = Selector::AttrEquals {
    tag: Some("div"),
    name: "role",
    value: "menu",
};

/// The menu trigger inside `row`, if the host rendered one.
pub fn find_trigger(doc: &Document, row: NodeId) -> Option<NodeId> {
    doc.query_first(row, MENU_TRIGGER)
}

/// The host's currently open context menu.
pub fn find_open_menu(doc: &Document) -> Option<NodeId> {
    doc.query_first(doc.root(), OPEN_MENU)
}

/// Binds to each row's menu trigger; rows without one are left alone.
pub struct HostMenuItem;

impl RowAffordance for HostMenuItem {
    fn ensure(&self, doc: &mut Document, row: &Row, id: &ConversationId) -> Result<bool, DomError> {
        if !doc.contains_node(row.node) {
            return Err(DomError::Stale);
        }
        let Some(trigger) = find_trigger(doc, row.node) else {
            return Ok(false);
        };
        if doc.attribute(trigger, BOUND_ATTR).is_some() {
            return Ok(false);
        }
        doc.set_attribute(trigger, BOUND_ATTR, "true")?;
        doc.set_attribute(trigger, CHAT_ID_ATTR, id.as_str())?;
        Ok(true)
    }
}

/// Add our item to the open menu unless it already has one.
/// Returns the new item, or `None` if there was nothing to do.
pub fn inject_menu_item(doc: &mut Document, id: &ConversationId) -> Result<Option<NodeId>, DomError> {
    let Some(menu) = find_open_menu(doc) else {
        return Ok(None);
    };
    if doc
        .query_first(menu, Selector::Class(ASSIGN_MENU_ITEM_CLASS))
        .is_some()
    {
        return Ok(None);
    }
    let item = create_assign_control(doc, "div", ASSIGN_MENU_ITEM_CLASS, MENU_ITEM_LABEL, id)?;
    doc.set_attribute(item, "role", "menuitem")?;
    doc.append_child(menu, item)?;
    Ok(Some(item))
}

/// Deferred menu check scheduled by the latest trigger activation.
///
/// The host keeps at most one menu open, so only the most recent trigger's
/// check is kept.
pub struct MenuChecks {
    delay: Duration,
    pending: Option<(Instant, ConversationId)>,
}

impl MenuChecks {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// A bound trigger was clicked at `now`. Replaces any check still waiting.
    pub fn schedule(&mut self, id: ConversationId, now: Instant) {
        if let Some((_, previous)) = self.pending.replace((now + self.delay, id)) {
            debug!(conversation = %previous, "superseded menu check");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Run the check if it is due. A check that finds no open menu is
    /// dropped; it is not retried.
    pub fn run_due(&mut self, doc: &mut Document, now: Instant) -> Option<NodeId> {
        if !matches!(&self.pending, Some((at, _)) if *at <= now) {
            return None;
        }
        let (_, id) = self.pending.take()?;
        match inject_menu_item(doc, &id) {
            Ok(item) => {
                if item.is_none() {
                    debug!(conversation = %id, "no menu to extend");
                }
                item
            }
            Err(e) => {
                debug!(conversation = %id, error = %e, "menu vanished during check");
                None
            }
        }
    }
}
