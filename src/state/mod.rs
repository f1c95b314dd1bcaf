//! Bound content for Orbit mobile views
//!
//! Application state lives in named properties of named targets (a model, a
//! controller). Views declare a `content_binding` to be re-rendered when such a
//! property changes, and a `content_binding_reverse` to write user input back.
//! [`Observables`] keeps the current values and who watches them.

mod model;

pub use model::{Model, Record};

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Context, ViewId};

/// `{ target, property }` descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentBinding {
    pub target: String,
    pub property: String,
}

impl ContentBinding {
    pub fn new(target: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            property: property.into(),
        }
    }
}

impl std::fmt::Display for ContentBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.target, self.property)
    }
}

/// Current values of bound properties and the views observing them
#[derive(Debug, Default)]
pub struct Observables {
    values: HashMap<ContentBinding, Value>,
    observers: HashMap<ContentBinding, Vec<ViewId>>,
}

impl Observables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, binding: &ContentBinding) -> Option<&Value> {
        self.values.get(binding)
    }

    /// Set a value without notifying anyone
    pub fn store(&mut self, binding: ContentBinding, value: Value) {
        self.values.insert(binding, value);
    }

    pub fn observe(&mut self, binding: &ContentBinding, view: &ViewId) {
        let observers = self.observers.entry(binding.clone()).or_default();
        if !observers.contains(view) {
            observers.push(view.clone());
        }
    }

    /// Stop every observation of a view
    pub fn forget(&mut self, view: &ViewId) {
        for observers in self.observers.values_mut() {
            observers.retain(|id| id != view);
        }
        self.observers.retain(|_, observers| !observers.is_empty());
    }

    pub fn observers(&self, binding: &ContentBinding) -> Vec<ViewId> {
        self.observers.get(binding).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.observers.clear();
    }
}

impl Context {
    /// Set a bound property and re-render its observers
    ///
    /// Returns the number of views notified.
    pub fn set_property(
        &mut self,
        target: impl Into<String>,
        property: impl Into<String>,
        value: Value,
    ) -> usize {
        let binding = ContentBinding::new(target, property);
        self.observables.store(binding.clone(), value.clone());
        self.notify_observers(&binding, value, None)
    }

    /// Current value of a bound property
    pub fn property(&self, target: &str, property: &str) -> Option<Value> {
        self.observables
            .get(&ContentBinding::new(target, property))
            .cloned()
    }

    /// Write user input back to a property, notifying every observer except
    /// the view it came from
    pub fn write_back(&mut self, origin: &ViewId, binding: &ContentBinding, value: Value) -> usize {
        debug!("{} writes back {}", origin, binding);
        self.observables.store(binding.clone(), value.clone());
        self.notify_observers(binding, value, Some(origin))
    }

    fn notify_observers(&mut self, binding: &ContentBinding, value: Value, skip: Option<&ViewId>) -> usize {
        let mut notified = 0;
        for id in self.observables.observers(binding) {
            if Some(&id) == skip {
                continue;
            }
            let Some(view) = self.view(&id) else {
                continue;
            };
            let Ok(mut view) = view.try_borrow_mut() else {
                warn!("View {} is busy, skipping change of {}", id, binding);
                continue;
            };
            match view.content_did_change(self, value.clone()) {
                Ok(()) => notified += 1,
                Err(e) => warn!("View {} failed to apply {}: {}", id, binding, e),
            }
        }
        notified
    }
}
