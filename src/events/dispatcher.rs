//! Event dispatcher
//!
//! Wires the internal and external handler of one event on one element into a
//! single document listener. The internal handler always runs first; what it
//! returns decides whether the external handler runs and with which extra
//! arguments.

use std::collections::HashMap;

use log::{debug, error, trace, warn};
use serde_json::Value;

use crate::component::{Context, ViewCore, ViewError, ViewId};
use crate::events::{Action, Binding, DomEvent, EventRegistration, HandlerCall, HandlerChain, HandlerOutcome, Target};

/// A bound (element, event) pair
#[derive(Debug, Clone)]
pub struct BoundEvent {
    pub handlers: HandlerChain,
    pub extra: Vec<Value>,
    /// Page the binding is scoped to
    pub page: Option<ViewId>,
    pub use_capture: bool,
}

/// Table of bound events keyed by element id, then event name
#[derive(Default)]
pub struct Dispatcher {
    bindings: HashMap<String, HashMap<String, BoundEvent>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("elements", &self.bindings.len())
            .field("bindings", &self.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self, element_id: &str, event: &str) -> bool {
        self.get(element_id, event).is_some()
    }

    pub fn get(&self, element_id: &str, event: &str) -> Option<&BoundEvent> {
        self.bindings.get(element_id).and_then(|events| events.get(event))
    }

    /// Event names bound on an element, sorted
    pub fn bound_events(&self, element_id: &str) -> Vec<String> {
        let mut events: Vec<String> = self
            .bindings
            .get(element_id)
            .map(|events| events.keys().cloned().collect())
            .unwrap_or_default();
        events.sort();
        events
    }

    /// Number of bound (element, event) pairs
    pub fn len(&self) -> usize {
        self.bindings.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, element_id: &str, event: &str, bound: BoundEvent) {
        self.bindings
            .entry(element_id.to_string())
            .or_default()
            .insert(event.to_string(), bound);
    }

    fn remove(&mut self, element_id: &str, event: &str) -> bool {
        let Some(events) = self.bindings.get_mut(element_id) else {
            return false;
        };
        let removed = events.remove(event).is_some();
        if events.is_empty() {
            self.bindings.remove(element_id);
        }
        removed
    }

    fn remove_element(&mut self, element_id: &str) -> Vec<String> {
        self.bindings
            .remove(element_id)
            .map(|events| events.into_keys().collect())
            .unwrap_or_default()
    }

    fn scoped_to(&self, page: &ViewId) -> Vec<(String, String)> {
        self.bindings
            .iter()
            .flat_map(|(element, events)| {
                events
                    .iter()
                    .filter(|(_, bound)| bound.page.as_ref() == Some(page))
                    .map(move |(event, _)| (element.clone(), event.clone()))
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

impl Context {
    /// Bind an event on an element
    ///
    /// Binding the same (element, event) again replaces the handler chain; the
    /// document listener is only added once.
    pub fn register_event(&mut self, registration: EventRegistration) {
        let EventRegistration {
            event,
            element_id,
            handlers,
            recommended,
            extra,
            use_capture,
            bind_to_current_page,
        } = registration;

        if !recommended.is_empty() && !recommended.contains(&event.as_str()) {
            warn!(
                "Event '{}' on {} is not one of the recommended events {:?}",
                event, element_id, recommended
            );
        }
        if handlers.is_empty() {
            warn!("No handler given for '{}' on {}, ignoring", event, element_id);
            return;
        }

        let page = if bind_to_current_page {
            self.current_page().cloned()
        } else {
            None
        };
        self.dispatcher.insert(
            &element_id,
            &event,
            BoundEvent {
                handlers,
                extra,
                page,
                use_capture,
            },
        );

        let document = self.document_mut();
        if !document.has_listener(&element_id, &event)
            && !document.add_listener(&element_id, &event, use_capture)
        {
            warn!("Cannot listen for '{}': element {} is not in the document", event, element_id);
        }
        trace!("Bound '{}' on {}", event, element_id);
    }

    /// Remove one binding
    pub fn unregister_event(&mut self, event: &str, element_id: &str) -> bool {
        let removed = self.dispatcher.remove(element_id, event);
        self.document_mut().remove_listener(element_id, event);
        removed
    }

    /// Remove every binding of an element
    pub fn unregister_events(&mut self, element_id: &str) -> usize {
        let events = self.dispatcher.remove_element(element_id);
        for event in &events {
            self.document_mut().remove_listener(element_id, event);
        }
        events.len()
    }

    /// Drop the bindings scoped to a page that is being left
    pub fn release_page_events(&mut self, page: &ViewId) -> usize {
        let scoped = self.dispatcher.scoped_to(page);
        for (element, event) in &scoped {
            self.unregister_event(event, element);
        }
        if !scoped.is_empty() {
            debug!("Released {} page-scoped bindings of {}", scoped.len(), page);
        }
        scoped.len()
    }

    /// Whether a binding has an action that can be resolved right now
    pub fn check_handler(&self, binding: &Binding) -> bool {
        match (&binding.target, &binding.action) {
            (Target::View(id), Action::Method(name)) => match self.view(id) {
                Some(view) => view.try_borrow().map(|v| v.responds_to(name)).unwrap_or(true),
                None => false,
            },
            (Target::View(id), Action::Callback(_)) => self.registry.contains(id),
            (Target::Responder(responder), Action::Method(name)) => responder
                .try_borrow()
                .map(|r| r.responds_to(name))
                .unwrap_or(true),
            (Target::Responder(_), Action::Callback(_)) => true,
            (Target::None, Action::Callback(_)) => true,
            (Target::None, Action::Method(_)) => false,
        }
    }

    /// Invoke a binding
    ///
    /// The handler sees the element id and the DOM event followed by `extra`.
    /// Propagation stopped by the handler, or requested through
    /// `stop_propagation`, is reflected on `event`.
    pub fn call_handler(
        &mut self,
        binding: &Binding,
        event: &mut DomEvent,
        stop_propagation: bool,
        extra: Vec<Value>,
    ) -> Result<HandlerOutcome, ViewError> {
        let mut call = HandlerCall::new(event.current_target.clone(), event.clone(), extra);

        let outcome = match (&binding.target, &binding.action) {
            (Target::View(id), Action::Method(name)) => {
                let view = self
                    .view(id)
                    .ok_or_else(|| ViewError::UnresolvedHandler(format!("{id}.{name}")))?;
                let mut view = view
                    .try_borrow_mut()
                    .map_err(|_| ViewError::Busy(format!("{id} is busy handling {name}")))?;
                view.perform(self, name, &mut call)?
            }
            (Target::Responder(responder), Action::Method(name)) => {
                let mut responder = responder
                    .try_borrow_mut()
                    .map_err(|_| ViewError::Busy(format!("responder is busy handling {name}")))?;
                responder.perform(self, name, &mut call)?
            }
            (Target::None, Action::Method(name)) => {
                return Err(ViewError::UnresolvedHandler(name.clone()));
            }
            (target, Action::Callback(f)) => {
                if let Target::View(id) = target {
                    call.receiver = Some(id.clone());
                }
                f(self, &mut call)
            }
        };

        if stop_propagation || call.event.is_propagation_stopped() {
            event.stop_propagation();
        }
        if call.event.is_default_prevented() {
            event.prevent_default();
        }
        Ok(outcome)
    }

    /// Run the handler chain bound for `event` on `element_id`
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch_event(&mut self, element_id: &str, event: &mut DomEvent) -> usize {
        let Some(bound) = self.dispatcher.get(element_id, &event.kind).cloned() else {
            return 0;
        };
        event.current_target = element_id.to_string();
        let mut invoked = 0;

        let forwarded = match &bound.handlers.internal {
            Some(internal) => {
                invoked += 1;
                match self.call_handler(internal, event, false, bound.extra.clone()) {
                    Ok(HandlerOutcome::Forward(args)) => {
                        let mut extra = bound.extra.clone();
                        extra.extend(args);
                        Some(extra)
                    }
                    Ok(HandlerOutcome::Consumed) => None,
                    Err(e) => {
                        error!("Internal '{}' handler of {} failed: {}", event.kind, element_id, e);
                        None
                    }
                }
            }
            None => Some(bound.extra.clone()),
        };

        if let (Some(extra), Some(external)) = (forwarded, &bound.handlers.external) {
            if self.check_handler(external) {
                invoked += 1;
                if let Err(e) = self.call_handler(external, event, false, extra) {
                    error!("External '{}' handler of {} failed: {}", event.kind, element_id, e);
                }
            } else {
                debug!("No resolvable '{}' handler configured on {}", event.kind, element_id);
            }
        }
        invoked
    }

    /// Bind a view's internal and external handlers, merged per event name
    ///
    /// Returns the number of event names bound.
    pub fn bind_view_events(&mut self, core: &ViewCore, recommended: &'static [&'static str]) -> usize {
        let mut names: Vec<&String> = core.internal_events.keys().chain(core.events.keys()).collect();
        names.sort();
        names.dedup();

        for name in &names {
            let registration = EventRegistration::new(name.as_str(), core.id.as_str())
                .internal(core.internal_events.get(*name).cloned())
                .external(core.events.get(*name).cloned())
                .recommended(recommended);
            self.register_event(registration);
        }
        names.len()
    }
}
