//! Browser document through `web-sys`

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::component::Node;
use crate::events::DomEvent;
use crate::layout::Size;
use crate::platform::{Document, PlatformError, QueuedEvent};

const SEQ_KEY: &str = "__orbitSeq";

struct Listener {
    element: web_sys::Element,
    callback: Closure<dyn FnMut(web_sys::Event)>,
    use_capture: bool,
}

/// The browser DOM
///
/// Listeners push into a queue that the application drains from its event
/// loop, so handlers never run inside a browser callback.
pub struct WebDocument {
    document: web_sys::Document,
    listeners: HashMap<(String, String), Listener>,
    queue: Rc<RefCell<Vec<QueuedEvent>>>,
    next_seq: Rc<Cell<u64>>,
}

fn host_error(e: JsValue) -> PlatformError {
    PlatformError::Host(format!("{e:?}"))
}

impl WebDocument {
    /// Document of the current window
    pub fn new() -> Result<Self, PlatformError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| PlatformError::Host("no window document".to_string()))?;
        Ok(Self {
            document,
            listeners: HashMap::new(),
            queue: Rc::new(RefCell::new(Vec::new())),
            next_seq: Rc::new(Cell::new(0)),
        })
    }

    fn element(&self, id: &str) -> Result<web_sys::Element, PlatformError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| PlatformError::MissingElement(id.to_string()))
    }

    fn container(&self, parent: Option<&str>) -> Result<web_sys::Element, PlatformError> {
        match parent {
            Some(id) => self.element(id),
            None => self
                .document
                .body()
                .map(Into::into)
                .ok_or_else(|| PlatformError::Host("document has no body".to_string())),
        }
    }

    fn check_ids(&self, node: &Node) -> Result<(), PlatformError> {
        match node.ids().into_iter().find(|id| self.document.get_element_by_id(id).is_some()) {
            Some(id) => Err(PlatformError::DuplicateId(id.to_string())),
            None => Ok(()),
        }
    }

    /// Forget listeners of elements that left the document
    fn prune_listeners(&mut self) {
        self.listeners.retain(|_, listener| listener.element.is_connected());
    }
}

impl Document for WebDocument {
    fn insert(&mut self, parent: Option<&str>, node: &Node) -> Result<(), PlatformError> {
        self.check_ids(node)?;
        self.container(parent)?
            .insert_adjacent_html("beforeend", &node.to_html())
            .map_err(host_error)
    }

    fn replace_children(&mut self, parent: &str, nodes: &[Node]) -> Result<(), PlatformError> {
        let element = self.element(parent)?;
        let html: String = nodes.iter().map(Node::to_html).collect();
        element.set_inner_html(&html);
        self.prune_listeners();
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(element) => {
                element.remove();
                self.prune_listeners();
                true
            }
            None => false,
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_text(&mut self, id: &str, text: &str) -> Result<(), PlatformError> {
        self.element(id)?.set_text_content(Some(text));
        self.prune_listeners();
        Ok(())
    }

    fn text(&self, id: &str) -> Option<String> {
        self.element(id).ok()?.text_content()
    }

    fn set_value(&mut self, id: &str, value: &str) -> Result<(), PlatformError> {
        let input = self
            .element(id)?
            .dyn_into::<web_sys::HtmlInputElement>()
            .map_err(|_| PlatformError::Host(format!("{id} is not an input element")))?;
        input.set_value(value);
        Ok(())
    }

    fn value(&self, id: &str) -> Option<String> {
        let input = self.element(id).ok()?.dyn_into::<web_sys::HtmlInputElement>().ok()?;
        Some(input.value())
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<(), PlatformError> {
        self.element(id)?.set_attribute(name, value).map_err(host_error)
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.element(id).ok()?.get_attribute(name)
    }

    fn add_class(&mut self, id: &str, class: &str) {
        if let Ok(element) = self.element(id) {
            if let Err(e) = element.class_list().add_1(class) {
                warn!("Cannot add class {} to {}: {:?}", class, id, e);
            }
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        if let Ok(element) = self.element(id) {
            if let Err(e) = element.class_list().remove_1(class) {
                warn!("Cannot remove class {} from {}: {:?}", class, id, e);
            }
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id)
            .map(|element| element.class_list().contains(class))
            .unwrap_or(false)
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), PlatformError> {
        let element = self
            .element(id)?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| PlatformError::Host(format!("{id} cannot be styled")))?;
        element.style().set_property(property, value).map_err(host_error)
    }

    fn style(&self, id: &str, property: &str) -> Option<String> {
        let element = self.element(id).ok()?.dyn_into::<web_sys::HtmlElement>().ok()?;
        element
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn measure(&self, id: &str) -> Option<Size> {
        let element = self.element(id).ok()?;
        let (width, height) = (element.client_width(), element.client_height());
        (width > 0 || height > 0).then(|| Size::new(width as f64, height as f64))
    }

    fn viewport(&self) -> Size {
        let Some(window) = web_sys::window() else {
            return Size::default();
        };
        let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Size::new(dimension(window.inner_width()), dimension(window.inner_height()))
    }

    fn add_listener(&mut self, id: &str, event: &str, use_capture: bool) -> bool {
        let Ok(element) = self.element(id) else {
            return false;
        };
        let key = (id.to_string(), event.to_string());
        if self.listeners.contains_key(&key) {
            return true;
        }

        let queue = self.queue.clone();
        let next_seq = self.next_seq.clone();
        let element_id = id.to_string();
        let kind = event.to_string();
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |raw: web_sys::Event| {
            let seq = match js_sys::Reflect::get(&raw, &JsValue::from_str(SEQ_KEY))
                .ok()
                .and_then(|v| v.as_f64())
            {
                Some(seq) => seq as u64,
                None => {
                    let seq = next_seq.get() + 1;
                    next_seq.set(seq);
                    let _ = js_sys::Reflect::set(&raw, &JsValue::from_str(SEQ_KEY), &JsValue::from_f64(seq as f64));
                    seq
                }
            };
            let target = raw
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok());
            let target_id = target.as_ref().map(|t| t.id()).unwrap_or_default();
            let mut event = DomEvent::new(kind.clone(), target_id);
            if let Some(input) = target.and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok()) {
                event = event.with_value(input.value());
            }
            queue.borrow_mut().push(QueuedEvent {
                seq,
                element_id: element_id.clone(),
                event,
            });
        });

        if let Err(e) = element.add_event_listener_with_callback_and_bool(
            event,
            callback.as_ref().unchecked_ref(),
            use_capture,
        ) {
            warn!("Cannot listen for {} on {}: {:?}", event, id, e);
            return false;
        }
        self.listeners.insert(
            key,
            Listener {
                element,
                callback,
                use_capture,
            },
        );
        true
    }

    fn remove_listener(&mut self, id: &str, event: &str) -> bool {
        let Some(listener) = self.listeners.remove(&(id.to_string(), event.to_string())) else {
            return false;
        };
        let _ = listener.element.remove_event_listener_with_callback_and_bool(
            event,
            listener.callback.as_ref().unchecked_ref(),
            listener.use_capture,
        );
        true
    }

    fn has_listener(&self, id: &str, event: &str) -> bool {
        self.listeners.contains_key(&(id.to_string(), event.to_string()))
    }

    fn drain_events(&mut self) -> Vec<QueuedEvent> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
