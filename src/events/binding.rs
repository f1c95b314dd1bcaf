//! Event binding descriptors
//!
//! A [`Binding`] pairs a target with an action. Method actions are resolved by
//! name when the event fires, so a target may change what a name does between
//! bind and fire.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::{Context, ViewError, ViewId};
use crate::events::DomEvent;

/// Plain callback action
pub type ActionFn = Rc<dyn Fn(&mut Context, &mut HandlerCall) -> HandlerOutcome>;

/// Receiver of a bound action
#[derive(Clone, Default)]
pub enum Target {
    /// A view, resolved through the registry when the event fires
    View(ViewId),
    /// An application object
    Responder(Rc<RefCell<dyn Responder>>),
    /// No receiver; only valid with callback actions
    #[default]
    None,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::View(id) => write!(f, "View({id})"),
            Target::Responder(_) => f.write_str("Responder"),
            Target::None => f.write_str("None"),
        }
    }
}

/// What to do on the target
#[derive(Clone)]
pub enum Action {
    /// Named action looked up on the target at call time
    Method(String),
    /// Callable invoked with the target as receiver
    Callback(ActionFn),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Method(name) => write!(f, "Method({name})"),
            Action::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// `{ target, action }` descriptor
#[derive(Debug, Clone)]
pub struct Binding {
    pub target: Target,
    pub action: Action,
}

impl Binding {
    pub fn method(target: Target, name: impl Into<String>) -> Self {
        Self {
            target,
            action: Action::Method(name.into()),
        }
    }

    /// Named action on a view
    pub fn on_view(id: &ViewId, name: impl Into<String>) -> Self {
        Self::method(Target::View(id.clone()), name)
    }

    /// Named action on an application responder
    pub fn responder(responder: Rc<RefCell<dyn Responder>>, name: impl Into<String>) -> Self {
        Self::method(Target::Responder(responder), name)
    }

    /// Receiver-less callback
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut Context, &mut HandlerCall) -> HandlerOutcome + 'static,
    {
        Self::function(Target::None, f)
    }

    /// Callback with an explicit receiver
    pub fn function<F>(target: Target, f: F) -> Self
    where
        F: Fn(&mut Context, &mut HandlerCall) -> HandlerOutcome + 'static,
    {
        Self {
            target,
            action: Action::Callback(Rc::new(f)),
        }
    }

    /// Name of a method action
    pub fn method_name(&self) -> Option<&str> {
        match &self.action {
            Action::Method(name) => Some(name),
            Action::Callback(_) => None,
        }
    }
}

/// Arguments of one handler invocation
///
/// The element id and the DOM event come first, followed by the extra
/// arguments of the registration or those forwarded by an internal handler.
#[derive(Debug, Clone)]
pub struct HandlerCall {
    pub element_id: String,
    pub event: DomEvent,
    pub args: Vec<Value>,
    /// The view a callback was bound to, if any
    pub receiver: Option<ViewId>,
}

impl HandlerCall {
    pub fn new(element_id: impl Into<String>, event: DomEvent, args: Vec<Value>) -> Self {
        Self {
            element_id: element_id.into(),
            event,
            args,
            receiver: None,
        }
    }

    /// Extra argument by position
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// Result of a handler
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Let the external handler run, appending these arguments
    Forward(Vec<Value>),
    /// Stop here; the external handler does not run
    Consumed,
}

impl HandlerOutcome {
    /// Forward without extra arguments
    pub fn forward() -> Self {
        HandlerOutcome::Forward(Vec::new())
    }
}

/// Application object receiving named actions
pub trait Responder {
    fn responds_to(&self, action: &str) -> bool;

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError>;
}

/// Responder backed by a table of named callbacks
///
/// Actions may be reassigned at any time; the one installed when the event
/// fires is the one that runs.
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<String, ActionFn>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace an action
    pub fn set_action<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut Context, &mut HandlerCall) -> HandlerOutcome + 'static,
    {
        self.actions.insert(name.into(), Rc::new(f));
    }

    pub fn remove_action(&mut self, name: &str) -> bool {
        self.actions.remove(name).is_some()
    }

    /// Shared handle usable as a binding target
    pub fn into_target(self) -> (Rc<RefCell<ActionTable>>, Target) {
        let table = Rc::new(RefCell::new(self));
        let responder: Rc<RefCell<dyn Responder>> = table.clone();
        (table, Target::Responder(responder))
    }
}

impl Responder for ActionTable {
    fn responds_to(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        let f = self
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| ViewError::UnresolvedHandler(action.to_string()))?;
        Ok(f(ctx, call))
    }
}

/// Internal and external handler of one event name
#[derive(Debug, Clone, Default)]
pub struct HandlerChain {
    pub internal: Option<Binding>,
    pub external: Option<Binding>,
}

impl HandlerChain {
    pub fn is_empty(&self) -> bool {
        self.internal.is_none() && self.external.is_none()
    }
}

/// Everything `register_event` needs to bind one event on one element
#[derive(Debug, Clone)]
pub struct EventRegistration {
    pub event: String,
    pub element_id: String,
    pub handlers: HandlerChain,
    pub recommended: &'static [&'static str],
    pub extra: Vec<Value>,
    pub use_capture: bool,
    pub bind_to_current_page: bool,
}

impl EventRegistration {
    pub fn new(event: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            element_id: element_id.into(),
            handlers: HandlerChain::default(),
            recommended: &[],
            extra: Vec::new(),
            use_capture: false,
            bind_to_current_page: false,
        }
    }

    pub fn internal(mut self, binding: Option<Binding>) -> Self {
        self.handlers.internal = binding;
        self
    }

    pub fn external(mut self, binding: Option<Binding>) -> Self {
        self.handlers.external = binding;
        self
    }

    /// Events the widget meaningfully supports
    pub fn recommended(mut self, events: &'static [&'static str]) -> Self {
        self.recommended = events;
        self
    }

    pub fn extra(mut self, extra: Vec<Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn use_capture(mut self) -> Self {
        self.use_capture = true;
        self
    }

    /// Drop the binding when the current page is left
    pub fn bind_to_current_page(mut self) -> Self {
        self.bind_to_current_page = true;
        self
    }
}
