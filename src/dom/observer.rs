//! Mutation observation over the element tree.

use super::NodeId;

/// Handle returned by [`super::Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Which mutations an observer wants to hear about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Children added, removed or replaced (text changes count too)
    pub child_list: bool,
    /// Attribute and class changes
    pub attributes: bool,
    /// Include mutations anywhere below the target, not just on it
    pub subtree: bool,
}

impl ObserveOptions {
    /// `{ childList: true, subtree: true }`
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            attributes: false,
            subtree: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose children or attributes changed
    pub target: NodeId,
    pub kind: MutationKind,
}

struct Registration {
    id: ObserverId,
    target: NodeId,
    options: ObserveOptions,
    queue: Vec<MutationRecord>,
}

#[derive(Default)]
pub(super) struct Observers {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl Observers {
    pub(super) fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            target,
            options,
            queue: Vec::new(),
        });
        id
    }

    pub(super) fn disconnect(&mut self, id: ObserverId) {
        self.registrations.retain(|r| r.id != id);
    }

    pub(super) fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| std::mem::take(&mut r.queue))
            .unwrap_or_default()
    }

    /// Queue `record` for every observer interested in it. `ancestry` is the
    /// record's target followed by its ancestors.
    pub(super) fn dispatch(&mut self, ancestry: &[NodeId], record: &MutationRecord) {
        for reg in &mut self.registrations {
            let wanted = match record.kind {
                MutationKind::ChildList => reg.options.child_list,
                MutationKind::Attribute(_) => reg.options.attributes,
            };
            if !wanted {
                continue;
            }
            let in_scope = if reg.options.subtree {
                ancestry.contains(&reg.target)
            } else {
                ancestry.first() == Some(&reg.target)
            };
            if in_scope {
                reg.queue.push(record.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Document, MutationKind, ObserveOptions};

    #[test]
    fn subtree_observer_sees_nested_child_list_changes_only() {
        let mut doc = Document::new();
        let nav = doc.create_element("nav");
        doc.append_child(doc.root(), nav).unwrap();
        let ol = doc.create_element("ol");
        doc.append_child(nav, ol).unwrap();

        let observer = doc.observe(nav, ObserveOptions::child_list_subtree());

        let li = doc.create_element("li");
        doc.append_child(ol, li).unwrap();
        doc.toggle_class(li, "hidden", true).unwrap();

        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, ol);
        assert_eq!(records[0].kind, MutationKind::ChildList);
        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn mutations_outside_the_target_are_ignored() {
        let mut doc = Document::new();
        let nav = doc.create_element("nav");
        let aside = doc.create_element("aside");
        doc.append_child(doc.root(), nav).unwrap();
        doc.append_child(doc.root(), aside).unwrap();

        let observer = doc.observe(nav, ObserveOptions::child_list_subtree());
        let div = doc.create_element("div");
        doc.append_child(aside, div).unwrap();

        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn attribute_observer_and_disconnect() {
        let mut doc = Document::new();
        let li = doc.create_element("li");
        doc.append_child(doc.root(), li).unwrap();
        let observer = doc.observe(
            li,
            ObserveOptions {
                attributes: true,
                ..ObserveOptions::default()
            },
        );
        doc.set_attribute(li, "data-x", "1").unwrap();
        assert_eq!(doc.take_records(observer).len(), 1);

        doc.disconnect(observer);
        doc.set_attribute(li, "data-x", "2").unwrap();
        assert!(doc.take_records(observer).is_empty());
    }
}
