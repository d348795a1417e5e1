//! Indexing of the host's conversation list.
//!
//! Every pass rebuilds the [`ChatIndex`] from the live document. Row handles
//! are only meaningful for the pass that produced them: the host may rebuild
//! its list at any time, and a stale handle simply stops resolving.

pub mod filter;
pub mod identity;

use std::collections::BTreeMap;

use tracing::warn;

use crate::dom::{Document, NodeId, Selector};
use crate::inject::{RowAffordance, ACTION_ATTR};
use identity::{ConversationId, CONVERSATION_PATH_PREFIX};

/// Container lookups, in priority order.
const CONTAINER_SELECTORS: [Selector<'static>; 3] = [
    Selector::AttrEquals {
        tag: None,
        name: "data-testid",
        value: "conversation-list",
    },
    Selector::Tag("nav"),
    Selector::Tag("aside"),
];

const CONVERSATION_LINK: Selector<'static> = Selector::AttrPrefix {
    tag: Some("a"),
    name: "href",
    prefix: CONVERSATION_PATH_PREFIX,
};

/// One conversation entry in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Nearest `li` around the link, or the link itself
    pub node: NodeId,
    /// The conversation link
    pub anchor: NodeId,
}

/// Conversation id → row, valid for a single pass.
#[derive(Debug, Default, Clone)]
pub struct ChatIndex {
    rows: BTreeMap<ConversationId, Row>,
}

impl ChatIndex {
    pub fn get(&self, id: &ConversationId) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConversationId, &Row)> {
        self.rows.iter()
    }

    pub fn insert(&mut self, id: ConversationId, row: Row) {
        self.rows.insert(id, row);
    }
}

/// Locate the conversation list: the test-id container, else the first
/// `nav`, else the first `aside`.
pub fn find_container(doc: &Document) -> Option<NodeId> {
    find_container_among(doc, &[doc.root()])
}

/// Like [`find_container`], searching the given subtrees (roots included).
pub fn find_container_among(doc: &Document, roots: &[NodeId]) -> Option<NodeId> {
    CONTAINER_SELECTORS.iter().find_map(|selector| {
        roots.iter().find_map(|&root| {
            if doc.get(root).is_some_and(|el| selector.matches(el)) {
                Some(root)
            } else {
                doc.query_first(root, *selector)
            }
        })
    })
}

/// Conversation rows under `container` in document order, duplicates
/// included. Links whose href carries no id are skipped.
pub fn rows(doc: &Document, container: NodeId) -> Vec<(ConversationId, Row)> {
    doc.query_all(container, CONVERSATION_LINK)
        .into_iter()
        .filter_map(|anchor| {
            let id = doc
                .attribute(anchor, "href")
                .and_then(ConversationId::from_href)?;
            let node = doc.closest(anchor, Selector::Tag("li")).unwrap_or(anchor);
            Some((id, Row { node, anchor }))
        })
        .collect()
}

/// Display title of a conversation link. Controls we injected into the link
/// (rows without a list item carry their button inside it) are skipped.
pub fn row_title(doc: &Document, anchor: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![anchor];
    while let Some(node) = stack.pop() {
        let Some(el) = doc.get(node) else {
            continue;
        };
        if el.attribute(ACTION_ATTR).is_some() {
            continue;
        }
        out.push_str(el.own_text());
        stack.extend(doc.children(node).iter().rev().copied());
    }
    out.trim().to_string()
}

/// Scan `container` for conversation links and build a fresh index, giving
/// `affordance` one chance per row to attach its control.
///
/// A failure on one row is logged and does not stop the scan.
pub fn index(doc: &mut Document, container: NodeId, affordance: &dyn RowAffordance) -> ChatIndex {
    let mut index = ChatIndex::default();
    for (id, row) in rows(doc, container) {
        if let Err(e) = affordance.ensure(doc, &row, &id) {
            warn!(conversation = %id, error = %e, "failed to attach assign control");
        }
        index.insert(id, row);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;
    use crate::inject::{InlineButton, NoAffordance, ASSIGN_BUTTON_CLASS};

    #[test]
    fn container_priority_prefers_test_id_over_landmarks() {
        let doc = markup::load(
            r#"<aside id="a"></aside><nav id="n"><div data-testid="conversation-list" id="t"></div></nav>"#,
        )
        .unwrap();
        let found = find_container(&doc).unwrap();
        assert_eq!(doc.attribute(found, "id"), Some("t"));
    }

    #[test]
    fn container_falls_back_to_nav_then_aside() {
        let doc = markup::load(r#"<aside id="a"></aside><nav id="n"></nav>"#).unwrap();
        assert_eq!(doc.attribute(find_container(&doc).unwrap(), "id"), Some("n"));

        let doc = markup::load(r#"<aside id="a"></aside>"#).unwrap();
        assert_eq!(doc.attribute(find_container(&doc).unwrap(), "id"), Some("a"));

        let doc = markup::load(r#"<main></main>"#).unwrap();
        assert!(find_container(&doc).is_none());
    }

    #[test]
    fn index_maps_ids_to_list_items_and_skips_other_links() {
        let mut doc = markup::load(
            r#"<nav>
                 <ol>
                   <li id="r1"><div><a href="/c/aaa">A</a></div></li>
                   <li id="r2"><a href="/gpts">GPTs</a></li>
                 </ol>
                 <a id="bare" href="/c/bbb">B</a>
                 <a href="/c/">empty</a>
               </nav>"#,
        )
        .unwrap();
        let container = find_container(&doc).unwrap();
        let index = index(&mut doc, container, &NoAffordance);

        assert_eq!(index.len(), 2);
        let a = index.get(&ConversationId::from("aaa")).unwrap();
        assert_eq!(doc.attribute(a.node, "id"), Some("r1"));
        // No enclosing list item: the link is its own row
        let b = index.get(&ConversationId::from("bbb")).unwrap();
        assert_eq!(b.node, b.anchor);
    }

    #[test]
    fn indexing_twice_leaves_one_affordance_per_row() {
        let mut doc = markup::load(
            r#"<nav><ol><li><a href="/c/a">A</a></li><li><a href="/c/b">B</a></li></ol></nav>"#,
        )
        .unwrap();
        let container = find_container(&doc).unwrap();
        let first = index(&mut doc, container, &InlineButton);
        let second = index(&mut doc, container, &InlineButton);

        assert_eq!(first.len(), second.len());
        for (_, row) in second.iter() {
            let buttons = doc.query_all(row.node, Selector::Class(ASSIGN_BUTTON_CLASS));
            assert_eq!(buttons.len(), 1);
        }
    }

    #[test]
    fn title_ignores_button_injected_into_bare_link() {
        let mut doc = markup::load(
            r#"<nav><a href="/c/bbb">Budget plan</a><ol><li><a href="/c/a">A</a></li></ol></nav>"#,
        )
        .unwrap();
        let container = find_container(&doc).unwrap();
        let index = index(&mut doc, container, &InlineButton);

        let bare = index.get(&ConversationId::from("bbb")).unwrap();
        assert_eq!(bare.node, bare.anchor);
        assert!(doc.query_first(bare.anchor, Selector::Class(ASSIGN_BUTTON_CLASS)).is_some());
        assert_eq!(row_title(&doc, bare.anchor), "Budget plan");

        let listed = index.get(&ConversationId::from("a")).unwrap();
        assert_eq!(row_title(&doc, listed.anchor), "A");
    }

    #[test]
    fn stale_rows_are_isolated_per_item() {
        struct FailFirst(std::cell::Cell<bool>);
        impl RowAffordance for FailFirst {
            fn ensure(
                &self,
                _doc: &mut Document,
                _row: &Row,
                _id: &ConversationId,
            ) -> Result<bool, crate::dom::DomError> {
                if self.0.replace(false) {
                    Err(crate::dom::DomError::Stale)
                } else {
                    Ok(false)
                }
            }
        }

        let mut doc = markup::load(
            r#"<nav><ol><li><a href="/c/a">A</a></li><li><a href="/c/b">B</a></li></ol></nav>"#,
        )
        .unwrap();
        let container = find_container(&doc).unwrap();
        let index = index(&mut doc, container, &FailFirst(std::cell::Cell::new(true)));
        assert_eq!(index.len(), 2);
    }
}
