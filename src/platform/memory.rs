//! In-memory document
//!
//! Keeps an element tree keyed by id, records every mutation and lets tests
//! fire user interactions that propagate like DOM events.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};

use log::trace;

use crate::component::Node;
use crate::events::DomEvent;
use crate::layout::Size;
use crate::platform::{Document, PlatformError, QueuedEvent};

/// A recorded document change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert { parent: Option<String>, id: String },
    ReplaceChildren { parent: String },
    Remove { id: String },
    SetText { id: String },
    SetValue { id: String },
    SetAttribute { id: String, name: String },
    AddClass { id: String, class: String },
    RemoveClass { id: String, class: String },
    SetStyle { id: String, property: String },
}

impl Mutation {
    /// Id of the element the mutation touched
    pub fn target(&self) -> &str {
        match self {
            Mutation::Insert { id, .. }
            | Mutation::Remove { id }
            | Mutation::SetText { id }
            | Mutation::SetValue { id }
            | Mutation::SetAttribute { id, .. }
            | Mutation::AddClass { id, .. }
            | Mutation::RemoveClass { id, .. }
            | Mutation::SetStyle { id, .. } => id,
            Mutation::ReplaceChildren { parent } => parent,
        }
    }
}

#[derive(Debug, Clone)]
enum Child {
    Element(String),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct MemoryElement {
    tag: String,
    parent: Option<String>,
    children: Vec<Child>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    value: Option<String>,
    layout: Option<Size>,
}

#[derive(Debug, Clone, Copy)]
struct Listener {
    count: usize,
    use_capture: bool,
}

/// Document kept entirely in memory
#[derive(Debug)]
pub struct MemoryDocument {
    elements: HashMap<String, MemoryElement>,
    body: Vec<String>,
    listeners: HashMap<(String, String), Listener>,
    pending: Vec<QueuedEvent>,
    mutations: Vec<Mutation>,
    viewport: Size,
    next_anonymous: usize,
    next_seq: u64,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            elements: HashMap::new(),
            body: Vec::new(),
            listeners: HashMap::new(),
            pending: Vec::new(),
            mutations: Vec::new(),
            viewport: Size::new(320.0, 480.0),
            next_anonymous: 0,
            next_seq: 0,
        }
    }

    /// Mutations recorded since creation or the last `clear_mutations`
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    /// Number of listeners for an event on an element
    pub fn listener_count(&self, id: &str, event: &str) -> usize {
        self.listeners
            .get(&(id.to_string(), event.to_string()))
            .map(|l| l.count)
            .unwrap_or(0)
    }

    /// Ids of the top-level elements in the body
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.elements.get(id)?.parent.as_deref()
    }

    /// Ids of the element children of an element
    pub fn child_ids(&self, id: &str) -> Vec<String> {
        self.elements
            .get(id)
            .map(|e| {
                e.children
                    .iter()
                    .filter_map(|c| match c {
                        Child::Element(id) => Some(id.clone()),
                        Child::Text(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether an element lies inside another one (or is it)
    pub fn is_within(&self, id: &str, ancestor: &str) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.parent_of(cur);
        }
        false
    }

    /// Give an element a laid-out size
    pub fn set_layout(&mut self, id: &str, size: Size) {
        if let Some(element) = self.elements.get_mut(id) {
            element.layout = Some(size);
        }
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    /// Rebuild the markup of a subtree
    pub fn node(&self, id: &str) -> Option<Node> {
        let element = self.elements.get(id)?;
        let mut node = Node::element(element.tag.clone());
        for (name, value) in &element.attributes {
            node = node.with_attr(name.clone(), value.clone());
        }
        for class in &element.classes {
            node = node.with_class(class);
        }
        for child in &element.children {
            match child {
                Child::Element(child_id) => {
                    if let Some(child) = self.node(child_id) {
                        node = node.with_child(child);
                    }
                }
                Child::Text(text) => node = node.with_text(text.clone()),
            }
        }
        Some(node)
    }

    /// Serialize a subtree
    pub fn html(&self, id: &str) -> Option<String> {
        self.node(id).map(|node| node.to_html())
    }

    /// Fire an interaction on an element, returning its sequence number
    pub fn fire(&mut self, id: &str, kind: &str) -> u64 {
        self.fire_event(DomEvent::new(kind, id))
    }

    /// Type into an input: sets its value and fires `keyup`
    pub fn input(&mut self, id: &str, text: &str) -> u64 {
        if let Some(element) = self.elements.get_mut(id) {
            element.value = Some(text.to_string());
        }
        self.fire_event(DomEvent::new("keyup", id).with_value(text))
    }

    /// Queue an event for every listening element on its path
    ///
    /// Capturing listeners on ancestors come first (outermost first), then the
    /// target, then bubbling listeners on ancestors (innermost first).
    pub fn fire_event(&mut self, event: DomEvent) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;

        let mut path = vec![event.target.clone()];
        let mut current = self.parent_of(&event.target).map(str::to_string);
        while let Some(id) = current {
            current = self.parent_of(&id).map(str::to_string);
            path.push(id);
        }

        let listener = |id: &str| self.listeners.get(&(id.to_string(), event.kind.clone())).copied();
        let mut order = Vec::new();
        for id in path.iter().skip(1).rev() {
            if listener(id).is_some_and(|l| l.use_capture) {
                order.push(id.clone());
            }
        }
        if listener(&event.target).is_some() {
            order.push(event.target.clone());
        }
        for id in path.iter().skip(1) {
            if listener(id).is_some_and(|l| !l.use_capture) {
                order.push(id.clone());
            }
        }

        trace!("Firing '{}' on {} (seq {})", event.kind, event.target, seq);
        for element_id in order {
            self.pending.push(QueuedEvent {
                seq,
                element_id,
                event: event.clone(),
            });
        }
        seq
    }

    fn anonymous_id(&mut self) -> String {
        self.next_anonymous += 1;
        format!("__anonymous_{}", self.next_anonymous)
    }

    fn check_ids(&self, node: &Node, replaced: &HashSet<String>) -> Result<(), PlatformError> {
        let mut seen = HashSet::new();
        for id in node.ids() {
            if !seen.insert(id) || (self.elements.contains_key(id) && !replaced.contains(id)) {
                return Err(PlatformError::DuplicateId(id.to_string()));
            }
        }
        Ok(())
    }

    fn build(&mut self, node: &Node, parent: Option<&str>) -> Option<Child> {
        match node {
            Node::Text(text) => Some(Child::Text(text.clone())),
            Node::Element(element) => {
                let id = match element.attributes.get("id") {
                    Some(id) => id.clone(),
                    None => self.anonymous_id(),
                };
                let mut children = Vec::new();
                for child in &element.children {
                    if let Some(child) = self.build(child, Some(&id)) {
                        children.push(child);
                    }
                }
                self.elements.insert(
                    id.clone(),
                    MemoryElement {
                        tag: element.tag.clone(),
                        parent: parent.map(str::to_string),
                        children,
                        attributes: element.attributes.clone(),
                        classes: element.classes.clone(),
                        styles: BTreeMap::new(),
                        value: element.attributes.get("value").cloned(),
                        layout: None,
                    },
                );
                Some(Child::Element(id))
            }
        }
    }

    fn subtree(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        let mut i = 0;
        while i < ids.len() {
            ids.extend(self.child_ids(&ids[i]));
            i += 1;
        }
        ids
    }

    fn drop_subtree(&mut self, id: &str) {
        for id in self.subtree(id) {
            self.elements.remove(&id);
            self.listeners.retain(|(element, _), _| element != &id);
        }
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut MemoryElement, PlatformError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| PlatformError::MissingElement(id.to_string()))
    }

    fn text_of(&self, id: &str) -> String {
        let Some(element) = self.elements.get(id) else {
            return String::new();
        };
        element
            .children
            .iter()
            .map(|child| match child {
                Child::Text(text) => text.clone(),
                Child::Element(id) => self.text_of(id),
            })
            .collect()
    }
}

impl Document for MemoryDocument {
    fn insert(&mut self, parent: Option<&str>, node: &Node) -> Result<(), PlatformError> {
        if let Some(parent) = parent {
            if !self.elements.contains_key(parent) {
                return Err(PlatformError::MissingElement(parent.to_string()));
            }
        }
        self.check_ids(node, &HashSet::new())?;

        let child = self.build(node, parent);
        let id = match &child {
            Some(Child::Element(id)) => id.clone(),
            _ => String::new(),
        };
        match (parent, child) {
            (Some(parent), Some(child)) => self.element_mut(parent)?.children.push(child),
            (None, Some(Child::Element(id))) => self.body.push(id),
            _ => {}
        }
        self.mutations.push(Mutation::Insert {
            parent: parent.map(str::to_string),
            id,
        });
        Ok(())
    }

    fn replace_children(&mut self, parent: &str, nodes: &[Node]) -> Result<(), PlatformError> {
        if !self.elements.contains_key(parent) {
            return Err(PlatformError::MissingElement(parent.to_string()));
        }
        let replaced: HashSet<String> = self.subtree(parent).into_iter().skip(1).collect();
        for node in nodes {
            self.check_ids(node, &replaced)?;
        }

        for child in self.child_ids(parent) {
            self.drop_subtree(&child);
        }
        let mut children = Vec::new();
        for node in nodes {
            if let Some(child) = self.build(node, Some(parent)) {
                children.push(child);
            }
        }
        self.element_mut(parent)?.children = children;
        self.mutations.push(Mutation::ReplaceChildren {
            parent: parent.to_string(),
        });
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(element) = self.elements.get(id) else {
            return false;
        };
        match element.parent.clone() {
            Some(parent) => {
                if let Some(parent) = self.elements.get_mut(&parent) {
                    parent
                        .children
                        .retain(|c| !matches!(c, Child::Element(child) if child == id));
                }
            }
            None => self.body.retain(|b| b != id),
        }
        self.drop_subtree(id);
        self.mutations.push(Mutation::Remove { id: id.to_string() });
        true
    }

    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), PlatformError> {
        let children = self.child_ids(id);
        self.element_mut(id)?;
        for child in children {
            self.drop_subtree(&child);
        }
        self.element_mut(id)?.children = vec![Child::Text(text.to_string())];
        self.mutations.push(Mutation::SetText { id: id.to_string() });
        Ok(())
    }

    fn text(&self, id: &str) -> Option<String> {
        self.elements.contains_key(id).then(|| self.text_of(id))
    }

    fn set_value(&mut self, id: &str, value: &str) -> Result<(), PlatformError> {
        self.element_mut(id)?.value = Some(value.to_string());
        self.mutations.push(Mutation::SetValue { id: id.to_string() });
        Ok(())
    }

    fn value(&self, id: &str) -> Option<String> {
        self.elements.get(id)?.value.clone()
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<(), PlatformError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.mutations.push(Mutation::SetAttribute {
            id: id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.elements.get(id)?.attributes.get(name).cloned()
    }

    fn add_class(&mut self, id: &str, class: &str) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        if !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
            self.mutations.push(Mutation::AddClass {
                id: id.to_string(),
                class: class.to_string(),
            });
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        let before = element.classes.len();
        element.classes.retain(|c| c != class);
        if element.classes.len() != before {
            self.mutations.push(Mutation::RemoveClass {
                id: id.to_string(),
                class: class.to_string(),
            });
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), PlatformError> {
        self.element_mut(id)?
            .styles
            .insert(property.to_string(), value.to_string());
        self.mutations.push(Mutation::SetStyle {
            id: id.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        self.elements.get(id)?.styles.get(property).cloned()
    }

    fn measure(&self, id: &str) -> Option<Size> {
        self.elements.get(id)?.layout
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn add_listener(&mut self, id: &str, event: &str, use_capture: bool) -> bool {
        if !self.elements.contains_key(id) {
            return false;
        }
        self.listeners
            .entry((id.to_string(), event.to_string()))
            .and_modify(|l| l.count += 1)
            .or_insert(Listener {
                count: 1,
                use_capture,
            });
        true
    }

    fn remove_listener(&mut self, id: &str, event: &str) -> bool {
        self.listeners
            .remove(&(id.to_string(), event.to_string()))
            .is_some()
    }

    fn has_listener(&self, id: &str, event: &str) -> bool {
        self.listener_count(id, event) > 0
    }

    fn drain_events(&mut self) -> Vec<QueuedEvent> {
        std::mem::take(&mut self.pending)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Node {
        Node::element("div").with_id("page").with_child(
            Node::element("ul")
                .with_id("list")
                .with_child(Node::element("li").with_id("a").with_text("A"))
                .with_child(Node::element("li").with_id("b").with_text("B")),
        )
    }

    #[test]
    fn test_insert_and_query() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();

        assert!(doc.contains("b"));
        assert_eq!(doc.parent_of("b"), Some("list"));
        assert_eq!(doc.text("list").as_deref(), Some("AB"));
        assert_eq!(doc.body(), ["page".to_string()]);
        assert_eq!(doc.html("a").as_deref(), Some("<li id=\"a\">A</li>"));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();
        let err = doc.insert(Some("page"), &Node::element("p").with_id("a")).unwrap_err();
        assert!(matches!(err, PlatformError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_remove_drops_subtree_and_listeners() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();
        assert!(doc.add_listener("a", "tap", false));

        assert!(doc.remove("list"));
        assert!(!doc.contains("a"));
        assert_eq!(doc.listener_count("a", "tap"), 0);
        assert!(!doc.remove("list"));
    }

    #[test]
    fn test_replace_children_may_reuse_ids() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();
        doc.replace_children("list", &[Node::element("li").with_id("a").with_text("A2")])
            .unwrap();
        assert_eq!(doc.text("list").as_deref(), Some("A2"));
        assert!(!doc.contains("b"));
    }

    #[test]
    fn test_events_bubble_to_listening_ancestors() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();
        doc.add_listener("a", "tap", false);
        doc.add_listener("page", "tap", false);
        doc.add_listener("list", "tap", true);

        let seq = doc.fire("a", "tap");
        let events = doc.drain_events();
        let order: Vec<&str> = events.iter().map(|e| e.element_id.as_str()).collect();
        assert_eq!(order, vec!["list", "a", "page"]);
        assert!(events.iter().all(|e| e.seq == seq && e.event.target == "a"));
        assert!(doc.drain_events().is_empty());
    }

    #[test]
    fn test_mutation_log_records_targeted_patches() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &page()).unwrap();
        doc.clear_mutations();

        doc.set_text("b", "Bee").unwrap();
        doc.add_class("b", "active");
        doc.add_class("b", "active");

        assert_eq!(doc.mutations().len(), 2);
        assert!(doc.mutations().iter().all(|m| m.target() == "b"));
    }
}
