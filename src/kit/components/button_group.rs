// Button group widget for OrbitKit

use log::{debug, warn};
use serde_json::Value;

use crate::component::{lifecycle, Context, Node, View, ViewCore, ViewError, ViewId};
use crate::events::{Binding, HandlerCall, HandlerOutcome};
use crate::layout::LineLayout;

/// Buttons laid out in lines of `items_per_line`
///
/// Taps on the buttons are routed through the group first, which resolves the
/// tapped button through the registry, marks it active when the group is
/// selectable, and notifies `on_select` with the button's name and value.
#[derive(Debug, Clone)]
pub struct ButtonGroupView {
    pub core: ViewCore,
    /// Zero puts every button on one line
    pub items_per_line: usize,
    pub selectable: bool,
    /// Name of the active button
    pub active: Option<String>,
    pub on_select: Option<Binding>,
}

impl ButtonGroupView {
    pub const KIND: &'static str = "button_group";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            items_per_line: 0,
            selectable: false,
            active: None,
            on_select: None,
        }
    }

    pub fn items_per_line(mut self, items_per_line: usize) -> Self {
        self.items_per_line = items_per_line;
        self
    }

    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn active(mut self, name: impl Into<String>) -> Self {
        self.active = Some(name.into());
        self
    }

    pub fn on_select(mut self, binding: Binding) -> Self {
        self.on_select = Some(binding);
        self
    }

    fn line_id(&self, line: usize) -> String {
        self.core.id.sub(&format!("line{line}"))
    }

    fn child_id(&self, name: &str) -> Option<ViewId> {
        lifecycle::id_of(self.core.child_views.get(name)?)
    }

    fn select(&mut self, ctx: &mut Context, name: &str) {
        if !self.selectable {
            return;
        }
        if let Some(previous) = self.active.take().and_then(|n| self.child_id(&n)) {
            ctx.document_mut().remove_class(previous.as_str(), "ui-btn-active");
        }
        if let Some(id) = self.child_id(name) {
            ctx.document_mut().add_class(id.as_str(), "ui-btn-active");
        }
        self.active = Some(name.to_string());
    }
}

impl Default for ButtonGroupView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ButtonGroupView {
    view_core!();

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let buttons = self.core.child_views.resolved();
        let layout = LineLayout::new(buttons.len(), self.items_per_line);

        for (name, button) in &buttons {
            match button.try_borrow_mut() {
                Ok(mut button) => {
                    let binding = Binding::on_view(&self.core.id, "select_button");
                    button.core_mut().internal_events.insert("tap".to_string(), binding);
                }
                Err(_) => warn!("Button '{}' of group {} is busy", name, self.core.id),
            }
        }

        let mut group = Node::element("div")
            .with_id(&self.core.id)
            .with_attr("data-role", "controlgroup")
            .with_class("ui-controlgroup")
            .with_optional_class(self.core.css_class.as_deref());

        for line in 1..=layout.lines() {
            let mut row = Node::element("div")
                .with_id(self.line_id(line))
                .with_class("ui-btn-line");
            for index in layout.items_in_line(line) {
                let (name, button) = &buttons[index - 1];
                let Some(mut node) = lifecycle::render_child(ctx, &self.core.id, name, button) else {
                    continue;
                };
                for class in layout.corner_classes(index) {
                    node = node.with_class(class);
                }
                row = row.with_child(node);
            }
            group = group.with_child(row);
        }
        Ok(Some(group))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "controlgroup");
        if let Some(name) = self.active.clone() {
            self.select(ctx, &name);
        }
        Ok(())
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        if action != "select_button" {
            return Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            });
        }

        let button = ctx
            .registry()
            .get(&call.element_id)
            .ok_or_else(|| ViewError::UnknownView(ViewId::from(call.element_id.as_str())))?;
        let (name, value, enabled) = {
            let button = button
                .try_borrow()
                .map_err(|_| ViewError::Busy(format!("button {} is busy", call.element_id)))?;
            let core = button.core();
            (core.name.clone().unwrap_or_default(), core.value.clone(), core.is_enabled)
        };
        if !enabled {
            debug!("Ignoring tap on disabled button {}", call.element_id);
            return Ok(HandlerOutcome::Consumed);
        }

        self.select(ctx, &name);
        if let Some(on_select) = self.on_select.clone() {
            if ctx.check_handler(&on_select) {
                let extra = vec![Value::String(name), value.clone()];
                ctx.call_handler(&on_select, &mut call.event, false, extra)?;
            }
        }
        Ok(HandlerOutcome::Forward(vec![value]))
    }

    fn responds_to(&self, action: &str) -> bool {
        action == "select_button"
    }
}
