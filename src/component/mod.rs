//! View model for the Orbit mobile view library
//!
//! This module contains the types and traits every widget builds on: the
//! [`View`] lifecycle contract, the shared [`ViewCore`] attributes, named child
//! views, the `design` factory and the application-scoped [`Context`].

mod context;
mod error;
pub mod lifecycle;
mod node;
mod registry;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use context::Context;
pub use error::ViewError;
pub use node::{Element, Node};
pub use registry::ViewRegistry;
pub use scheduler::{RetryPolicy, TaskId, TaskStep};

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{Binding, HandlerCall, HandlerOutcome};
use crate::state::ContentBinding;

/// Shared handle to a live view
pub type ViewRef = Rc<RefCell<dyn View>>;

/// Non-owning handle to a view
pub type WeakViewRef = Weak<RefCell<dyn View>>;

/// Process-unique view identifier, also used as the DOM element id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ViewId(String);

impl ViewId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new identifier with the given prefix
    pub fn generate(prefix: &str) -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        Self(format!("{prefix}{id}"))
    }

    /// Derive the id of a sub-element, e.g. `m_4_track`
    pub fn sub(&self, suffix: &str) -> String {
        format!("{}_{}", self.0, suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has been assigned by `design`
    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ViewId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ViewId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle phase of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Designed but not rendered
    Unconfigured,
    /// Markup produced, not yet in the document
    Rendered,
    /// Element present in the document
    Attached,
    /// Visual finalization applied
    Themed,
    /// Event handlers bound, fully operational
    EventsBound,
    /// Applying a value change
    Updating,
    /// Removed and unregistered
    Destroyed,
}

impl LifecyclePhase {
    /// Whether the view's element is in the document
    pub fn is_attached(self) -> bool {
        matches!(
            self,
            LifecyclePhase::Attached
                | LifecyclePhase::Themed
                | LifecyclePhase::EventsBound
                | LifecyclePhase::Updating
        )
    }
}

/// How a view reaches the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `render` returns markup for an ancestor to insert
    Inline,
    /// `render` inserts the view into the document body itself and returns nothing
    SelfAttaching,
}

/// Ordered collection of named child views
///
/// The declared order may name children that were never supplied; those are
/// reported by `unresolved` and skipped when rendering.
#[derive(Clone, Default)]
pub struct ChildViews {
    order: Vec<String>,
    views: HashMap<String, ViewRef>,
}

impl fmt::Debug for ChildViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildViews")
            .field("order", &self.order)
            .field("resolved", &self.views.len())
            .finish()
    }
}

impl ChildViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the child order up front
    pub fn declare<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: names.into_iter().map(Into::into).collect(),
            views: HashMap::new(),
        }
    }

    /// Supply a child, appending its name to the order if it was not declared
    pub fn insert(&mut self, name: impl Into<String>, view: ViewRef) {
        let name = name.into();
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        self.views.insert(name, view);
    }

    pub fn get(&self, name: &str) -> Option<&ViewRef> {
        self.views.get(name)
    }

    /// Remove a child and its declaration
    pub fn remove(&mut self, name: &str) -> Option<ViewRef> {
        self.order.retain(|n| n != name);
        self.views.remove(name)
    }

    /// Declared names in order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Children in declared order, skipping unresolved names
    pub fn resolved(&self) -> Vec<(String, ViewRef)> {
        self.order
            .iter()
            .filter_map(|name| self.views.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// Declared names without a view
    pub fn unresolved(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| !self.views.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Replace the declared order. Names not present are kept at the end.
    pub fn reorder(&mut self, names: Vec<String>) {
        let mut order = names;
        for name in &self.order {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        self.order = order;
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.views.clear();
    }
}

/// Attributes shared by every view
#[derive(Clone)]
pub struct ViewCore {
    /// Identifier, assigned by `design` and never changed afterwards
    pub id: ViewId,
    /// Name under the parent view
    pub name: Option<String>,
    /// Widget kind tag
    pub kind: &'static str,
    /// Current bound value or content
    pub value: Value,
    /// Additional CSS classes
    pub css_class: Option<String>,
    pub child_views: ChildViews,
    /// Non-owning back reference, assigned by the parent's render pass
    pub parent: Option<ViewId>,
    /// Built-in handlers
    pub internal_events: HashMap<String, Binding>,
    /// Application supplied handlers
    pub events: HashMap<String, Binding>,
    pub is_enabled: bool,
    pub has_focus: bool,
    pub content_binding: Option<ContentBinding>,
    pub content_binding_reverse: Option<ContentBinding>,
    pub(crate) phase: LifecyclePhase,
    pub(crate) alive: bool,
}

impl fmt::Debug for ViewCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("phase", &self.phase)
            .field("children", &self.child_views)
            .finish()
    }
}

impl ViewCore {
    pub fn new(kind: &'static str) -> Self {
        Self {
            id: ViewId::default(),
            name: None,
            kind,
            value: Value::Null,
            css_class: None,
            child_views: ChildViews::new(),
            parent: None,
            internal_events: HashMap::new(),
            events: HashMap::new(),
            is_enabled: true,
            has_focus: false,
            content_binding: None,
            content_binding_reverse: None,
            phase: LifecyclePhase::Unconfigured,
            alive: true,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Liveness flag consulted by deferred callbacks
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_attached(&self) -> bool {
        self.phase.is_attached()
    }

    /// The value as display text
    pub fn value_text(&self) -> String {
        crate::template::value_to_text(&self.value)
    }

    /// Child view by name
    pub fn child(&self, name: &str) -> Option<ViewRef> {
        self.child_views.get(name).cloned()
    }
}

/// Configuration applied over a widget's defaults by `design`
#[derive(Clone, Default)]
pub struct ViewConfig {
    pub name: Option<String>,
    pub value: Option<Value>,
    pub css_class: Option<String>,
    pub child_order: Vec<String>,
    pub children: Vec<(String, ViewRef)>,
    pub events: HashMap<String, Binding>,
    pub is_enabled: Option<bool>,
    pub content_binding: Option<ContentBinding>,
    pub content_binding_reverse: Option<ContentBinding>,
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// Declare the order of child views. Children supplied with `child` but not
    /// declared here are appended.
    pub fn child_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_order = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn child(mut self, name: impl Into<String>, view: ViewRef) -> Self {
        self.children.push((name.into(), view));
        self
    }

    /// Application handler for an event
    pub fn on(mut self, event: impl Into<String>, binding: Binding) -> Self {
        self.events.insert(event.into(), binding);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = Some(false);
        self
    }

    pub fn content_binding(mut self, binding: ContentBinding) -> Self {
        self.content_binding = Some(binding);
        self
    }

    pub fn content_binding_reverse(mut self, binding: ContentBinding) -> Self {
        self.content_binding_reverse = Some(binding);
        self
    }

    fn apply(self, core: &mut ViewCore, id: ViewId) {
        core.id = id;
        if self.name.is_some() {
            core.name = self.name;
        }
        if let Some(value) = self.value {
            core.value = value;
        }
        if self.css_class.is_some() {
            core.css_class = self.css_class;
        }
        if let Some(enabled) = self.is_enabled {
            core.is_enabled = enabled;
        }
        let mut children = ChildViews::declare(self.child_order);
        for (name, view) in self.children {
            children.insert(name, view);
        }
        core.child_views = children;
        core.events.extend(self.events);
        core.content_binding = self.content_binding;
        core.content_binding_reverse = self.content_binding_reverse;
    }
}

/// Cloning support for views, implemented for every `View + Clone`
pub trait CloneView {
    /// Shallow copy as a new handle; child handles are shared with the original
    fn clone_view(&self) -> ViewRef;
}

impl<T: View + Clone> CloneView for T {
    fn clone_view(&self) -> ViewRef {
        Rc::new(RefCell::new(self.clone()))
    }
}

/// View trait - implemented by all widgets
///
/// The hooks are driven by [`lifecycle`], which enforces the ordering
/// `render -> attach -> theme -> register_events` and fans each step out to the
/// children returned by `child_order`.
pub trait View: CloneView + Any {
    fn core(&self) -> &ViewCore;

    fn core_mut(&mut self) -> &mut ViewCore;

    /// Called once by `design` after the configuration has been applied and
    /// the id assigned; also called on deep clones. Internal events are
    /// installed here.
    fn did_design(&mut self, _ctx: &mut Context) {}

    fn render_mode(&self) -> RenderMode {
        RenderMode::Inline
    }

    /// Produce markup from the current attributes. Inline views must not
    /// touch the document.
    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError>;

    /// Apply visual finalization once the element is in the document
    fn theme(&mut self, _ctx: &mut Context) -> Result<(), ViewError> {
        Ok(())
    }

    /// Bind internal and external handlers to the view's element
    fn register_events(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.bind_view_events(self.core(), self.recommended_events());
        Ok(())
    }

    /// Events this widget meaningfully supports
    fn recommended_events(&self) -> &'static [&'static str] {
        &[]
    }

    /// Children in lifecycle order
    fn child_order(&self) -> Vec<ViewRef> {
        self.core()
            .child_views
            .resolved()
            .into_iter()
            .map(|(_, view)| view)
            .collect()
    }

    fn set_value(&mut self, _ctx: &mut Context, value: Value) -> Result<(), ViewError> {
        self.core_mut().value = value;
        Ok(())
    }

    /// Targeted document patch after a value change
    fn render_update(&mut self, _ctx: &mut Context) -> Result<(), ViewError> {
        Ok(())
    }

    /// A bound property changed
    fn content_did_change(&mut self, ctx: &mut Context, value: Value) -> Result<(), ViewError> {
        self.set_value(ctx, value)?;
        if self.core().is_attached() {
            self.render_update(ctx)?;
        }
        Ok(())
    }

    fn orientation_did_change(&mut self, _ctx: &mut Context) -> Result<(), ViewError> {
        Ok(())
    }

    /// Perform a late-bound action
    fn perform(
        &mut self,
        _ctx: &mut Context,
        action: &str,
        _call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        Err(ViewError::UnknownAction {
            id: self.core().id.clone(),
            action: action.to_string(),
        })
    }

    fn responds_to(&self, _action: &str) -> bool {
        false
    }

    /// Release anything the view holds outside its element before destruction
    fn will_destroy(&mut self, _ctx: &mut Context) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Instantiate a widget with a configuration applied over its defaults
///
/// Assigns the id, installs internal events and registers the view.
pub fn design<V: View>(ctx: &mut Context, mut view: V, config: ViewConfig) -> Rc<RefCell<V>> {
    let id = ctx.next_view_id();
    config.apply(view.core_mut(), id);
    view.did_design(ctx);

    let handle = Rc::new(RefCell::new(view));
    let view_ref: ViewRef = handle.clone();
    lifecycle::install(&view_ref, ctx);
    handle
}

/// Method syntax for [`design`]
pub trait Design: View + Sized {
    fn design(self, ctx: &mut Context, config: ViewConfig) -> Rc<RefCell<Self>> {
        design(ctx, self, config)
    }
}

impl<V: View> Design for V {}

/// Run `f` on the concrete widget behind a handle
///
/// Returns `None` when the view is of another type or currently borrowed.
pub fn with_view<V: View, R>(view: &ViewRef, f: impl FnOnce(&mut V) -> R) -> Option<R> {
    let mut guard = view.try_borrow_mut().ok()?;
    guard.as_any_mut().downcast_mut::<V>().map(f)
}

/// Id of a view behind a handle
pub fn view_id(view: &ViewRef) -> Option<ViewId> {
    view.try_borrow().ok().map(|v| v.core().id.clone())
}
