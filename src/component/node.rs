//! Structured markup produced by `View::render`
//!
//! Views describe their markup as a tree of [`Node`]s instead of concatenating
//! strings. The tree is serialized only when it reaches a host document, which
//! keeps rendering testable and lets hosts other than HTML consume it.

use std::collections::BTreeMap;
use std::fmt::Write;

/// An element in a markup tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name
    pub tag: String,
    /// Attributes other than `class`, kept sorted for deterministic output
    pub attributes: BTreeMap<String, String>,
    /// CSS classes in insertion order
    pub classes: Vec<String>,
    /// Child nodes
    pub children: Vec<Node>,
}

/// A node in a markup tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Create an element node
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(Element {
            tag: tag.into(),
            ..Element::default()
        })
    }

    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Set the `id` attribute
    pub fn with_id(self, id: impl AsRef<str>) -> Self {
        self.with_attr("id", id.as_ref())
    }

    /// Set an attribute. Ignored on text nodes.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Node::Element(element) = &mut self {
            element.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Add one or more whitespace separated classes. Ignored on text nodes.
    pub fn with_class(mut self, class: impl AsRef<str>) -> Self {
        if let Node::Element(element) = &mut self {
            for class in class.as_ref().split_whitespace() {
                if !element.classes.iter().any(|c| c == class) {
                    element.classes.push(class.to_string());
                }
            }
        }
        self
    }

    /// Add classes from an optional value
    pub fn with_optional_class(self, class: Option<&str>) -> Self {
        match class {
            Some(class) => self.with_class(class),
            None => self,
        }
    }

    /// Append a child node
    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element(element) = &mut self {
            element.children.push(child);
        }
        self
    }

    /// Append several child nodes
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element(element) = &mut self {
            element.children.extend(children);
        }
        self
    }

    /// Append a text child
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::text(text))
    }

    /// Tag name, `None` for text nodes
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element(element) => Some(&element.tag),
            Node::Text(_) => None,
        }
    }

    /// Value of the `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element(element) => element.attributes.get(name).map(String::as_str),
            Node::Text(_) => None,
        }
    }

    /// Whether the node carries a class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    /// Classes of the node
    pub fn classes(&self) -> &[String] {
        match self {
            Node::Element(element) => &element.classes,
            Node::Text(_) => &[],
        }
    }

    /// Child nodes
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    /// Find the node with the given id in this subtree
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// All ids in this subtree in document order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        if let Some(id) = self.id() {
            ids.push(id);
        }
        for child in self.children() {
            child.collect_ids(ids);
        }
    }

    /// Concatenated text of this subtree
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Serialize the subtree to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(element) => {
                let _ = write!(out, "<{}", element.tag);
                if let Some(id) = element.attributes.get("id") {
                    let _ = write!(out, " id=\"{}\"", escape_attr(id));
                }
                if !element.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape_attr(&element.classes.join(" ")));
                }
                for (name, value) in element.attributes.iter().filter(|(name, _)| *name != "id") {
                    let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
                }
                if is_void(&element.tag) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in &element.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "img" | "br" | "hr" | "meta" | "link")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
