//! Arena-backed element tree standing in for the host page.
//!
//! Nodes are addressed by generational [`NodeId`] handles. Removing a subtree
//! frees its slots and bumps their generation, so a handle held across a host
//! re-render resolves to `None` instead of silently pointing at a new node.

pub mod markup;
pub mod observer;

use std::collections::BTreeMap;

use thiserror::Error;

pub use observer::{MutationKind, MutationRecord, ObserveOptions, ObserverId};
use observer::Observers;

/// Weak handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Errors from operating on the element tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// The handle refers to a node that has been removed
    #[error("node handle is stale")]
    Stale,
    /// Appending would make a node its own ancestor
    #[error("cannot append a node into its own subtree")]
    Cycle,
}

/// A single element: tag, attributes, class list and direct text.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value; `class` is exposed through [`Element::classes`] instead.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Text directly owned by this element (not its descendants)
    pub fn own_text(&self) -> &str {
        &self.text
    }
}

struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Simple selectors covering the lookups the sync layer performs.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    /// `tag`
    Tag(&'a str),
    /// `.class`
    Class(&'a str),
    /// `[name]` or `tag[name]`
    HasAttr {
        tag: Option<&'a str>,
        name: &'a str,
    },
    /// `[name="value"]` or `tag[name="value"]`
    AttrEquals {
        tag: Option<&'a str>,
        name: &'a str,
        value: &'a str,
    },
    /// `[name^="prefix"]` or `tag[name^="prefix"]`
    AttrPrefix {
        tag: Option<&'a str>,
        name: &'a str,
        prefix: &'a str,
    },
}

impl Selector<'_> {
    pub fn matches(&self, element: &Element) -> bool {
        let tag_ok = |tag: &Option<&str>| tag.map_or(true, |t| element.tag.eq_ignore_ascii_case(t));
        match self {
            Selector::Tag(tag) => element.tag.eq_ignore_ascii_case(tag),
            Selector::Class(class) => element.has_class(class),
            Selector::HasAttr { tag, name } => tag_ok(tag) && element.attribute(name).is_some(),
            Selector::AttrEquals { tag, name, value } => {
                tag_ok(tag) && element.attribute(name) == Some(*value)
            }
            Selector::AttrPrefix { tag, name, prefix } => {
                tag_ok(tag) && element.attribute(name).is_some_and(|v| v.starts_with(prefix))
            }
        }
    }
}

/// The live element tree. The root is a `body` element that is never removed.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    observers: Observers,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            observers: Observers::default(),
        };
        doc.root = doc.create_element("body");
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_mut())
            .ok_or(DomError::Stale)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|el| el.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |el| el.children.as_slice())
    }

    /// Whether `node` is connected to the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.contains_node(id) {
                return false;
            }
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// `node` followed by each of its ancestors up to the root.
    fn ancestry(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        let chain = self.ancestry(target);
        self.observers.dispatch(&chain, &MutationRecord { target, kind });
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.contains_node(parent) || !self.contains_node(child) {
            return Err(DomError::Stale);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle);
        }
        self.detach(child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let Some(old_parent) = self.get(child).ok_or(DomError::Stale)?.parent else {
            return Ok(());
        };
        self.get_mut(old_parent)?.children.retain(|c| *c != child);
        self.get_mut(child)?.parent = None;
        self.record(old_parent, MutationKind::ChildList);
        Ok(())
    }

    /// Remove `node` and free its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Ok(());
        }
        self.detach(node)?;
        self.free_subtree(node);
        Ok(())
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for id in doomed {
            if let Some(slot) = self.slots.get_mut(id.index as usize) {
                if slot.generation == id.generation && slot.element.take().is_some() {
                    slot.generation = slot.generation.wrapping_add(1);
                    self.free.push(id.index);
                }
            }
        }
    }

    /// Replace every child of `parent` with `new_children`, freeing the old ones.
    /// Emits a single child-list record on `parent`.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        new_children: &[NodeId],
    ) -> Result<(), DomError> {
        if !self.contains_node(parent) {
            return Err(DomError::Stale);
        }
        let old = std::mem::take(&mut self.get_mut(parent)?.children);
        for child in old {
            if let Ok(el) = self.get_mut(child) {
                el.parent = None;
            }
            self.free_subtree(child);
        }
        for &child in new_children {
            if self.is_inclusive_ancestor(child, parent) {
                return Err(DomError::Cycle);
            }
            if let Some(old_parent) = self.parent(child) {
                self.get_mut(old_parent)?.children.retain(|c| *c != child);
            }
            self.get_mut(child)?.parent = Some(parent);
            self.get_mut(parent)?.children.push(child);
        }
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.get_mut(node)?;
        if name == "class" {
            el.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            el.attributes.insert(name.to_string(), value.to_string());
        }
        self.record(node, MutationKind::Attribute(name.to_string()));
        Ok(())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).and_then(|el| el.attribute(name))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.toggle_class(node, class, true).map(|_| ())
    }

    /// Force `class` on or off. Returns whether the class list changed; an
    /// unchanged list emits no mutation record.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) -> Result<bool, DomError> {
        let el = self.get_mut(node)?;
        let present = el.has_class(class);
        if present == on {
            return Ok(false);
        }
        if on {
            el.classes.push(class.to_string());
        } else {
            el.classes.retain(|c| c != class);
        }
        self.record(node, MutationKind::Attribute("class".to_string()));
        Ok(true)
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.get_mut(node)?.text = text.to_string();
        self.record(node, MutationKind::ChildList);
        Ok(())
    }

    /// Concatenated text of `node` and its descendants, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(el) = self.get(node) {
            out.push_str(&el.text);
        }
        for id in self.descendants(node) {
            if let Some(el) = self.get(id) {
                out.push_str(&el.text);
            }
        }
        out
    }

    /// Every descendant of `root` in pre-order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn query_first(&self, root: NodeId, selector: Selector<'_>) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|el| selector.matches(el)))
    }

    pub fn query_all(&self, root: NodeId, selector: Selector<'_>) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|el| selector.matches(el)))
            .collect()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeId, selector: Selector<'_>) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let el = self.get(id)?;
            if selector.matches(el) {
                return Some(id);
            }
            current = el.parent;
        }
        None
    }

    /// Start observing mutations on `target`.
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        self.observers.observe(target, options)
    }

    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.disconnect(observer);
    }

    /// Drain the records queued for `observer`.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(observer)
    }
}
