//! Event system for Orbit mobile views
//!
//! - `DomEvent`: a user interaction delivered by the host document
//! - `Binding`: `{ target, action }` descriptors, late-bound by name or callable
//! - `Dispatcher`: one listener per element and event, internal handler first

pub mod binding;
pub mod dispatcher;
pub mod event;

pub use binding::{
    Action, ActionFn, ActionTable, Binding, EventRegistration, HandlerCall, HandlerChain,
    HandlerOutcome, Responder, Target,
};
pub use dispatcher::{BoundEvent, Dispatcher};
pub use event::DomEvent;
