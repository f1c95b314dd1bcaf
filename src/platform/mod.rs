//! Host document abstraction
//!
//! Views never talk to a browser directly. Markup trees, targeted patches,
//! layout queries and listener bookkeeping all go through [`Document`], which
//! is implemented in memory for tests and server-side rendering and by the
//! browser DOM behind the `web` feature.

use std::any::Any;

use crate::component::Node;
use crate::events::DomEvent;
use crate::layout::Size;

mod memory;
#[cfg(feature = "web")]
pub mod web;

pub use memory::{MemoryDocument, Mutation};
#[cfg(feature = "web")]
pub use web::WebDocument;

/// Errors raised by a host document
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("No element with id '{0}' in the document")]
    MissingElement(String),

    #[error("An element with id '{0}' is already in the document")]
    DuplicateId(String),

    #[error("Host error: {0}")]
    Host(String),
}

/// An event waiting to be dispatched
///
/// One user interaction yields one entry per listening element on its
/// propagation path, all sharing the same `seq`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub seq: u64,
    pub element_id: String,
    pub event: DomEvent,
}

/// The document views are rendered into
pub trait Document {
    /// Insert a markup tree as the last child of `parent`, or of the body
    fn insert(&mut self, parent: Option<&str>, node: &Node) -> Result<(), PlatformError>;

    /// Replace all children of an element with new markup
    fn replace_children(&mut self, parent: &str, nodes: &[Node]) -> Result<(), PlatformError>;

    /// Remove an element and its subtree; `false` when it was not present
    fn remove(&mut self, id: &str) -> bool;

    fn contains(&self, id: &str) -> bool;

    /// Replace the content of an element with a text node
    fn set_text(&mut self, id: &str, text: &str) -> Result<(), PlatformError>;

    fn text(&self, id: &str) -> Option<String>;

    /// Set the value of an input element
    fn set_value(&mut self, id: &str, value: &str) -> Result<(), PlatformError>;

    fn value(&self, id: &str) -> Option<String>;

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<(), PlatformError>;

    fn attribute(&self, id: &str, name: &str) -> Option<String>;

    fn add_class(&mut self, id: &str, class: &str);

    fn remove_class(&mut self, id: &str, class: &str);

    fn has_class(&self, id: &str, class: &str) -> bool;

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), PlatformError>;

    fn style(&self, id: &str, property: &str) -> Option<String>;

    /// Laid-out size of an element; `None` until layout has happened
    fn measure(&self, id: &str) -> Option<Size>;

    /// Size of the visible area
    fn viewport(&self) -> Size;

    /// Start listening for an event on an element; `false` when the element
    /// is missing
    fn add_listener(&mut self, id: &str, event: &str, use_capture: bool) -> bool;

    fn remove_listener(&mut self, id: &str, event: &str) -> bool;

    fn has_listener(&self, id: &str, event: &str) -> bool;

    /// Take the events that arrived since the last call
    fn drain_events(&mut self) -> Vec<QueuedEvent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
