//! DOM event as seen by handlers

use serde::{Deserialize, Serialize};

/// A user interaction delivered by the host document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DomEvent {
    /// Event name, e.g. `tap` or `keyup`
    pub kind: String,
    /// Id of the element the interaction originated on
    pub target: String,
    /// Id of the element whose listener is running
    pub current_target: String,
    /// Current value of an input element, if any
    pub value: Option<String>,
    pub x: f64,
    pub y: f64,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            kind: kind.into(),
            current_target: target.clone(),
            target,
            ..Default::default()
        }
    }

    /// Attach an input value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attach a pointer position
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Keep the event from reaching listeners on ancestor elements
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}
