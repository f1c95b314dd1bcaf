// Text input widget for OrbitKit

use log::debug;
use serde_json::Value;

use crate::component::{Context, Node, View, ViewCore, ViewError};
use crate::events::{Binding, HandlerCall, HandlerOutcome};

/// Input type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Search,
    Email,
}

impl InputType {
    fn as_str(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Password => "password",
            InputType::Search => "search",
            InputType::Email => "email",
        }
    }
}

/// Single line text field
///
/// Tracks focus, writes typed text back through `content_binding_reverse`, and
/// ignores content-binding updates while focused so the user's text is not
/// overwritten.
#[derive(Debug, Clone)]
pub struct TextFieldView {
    pub core: ViewCore,
    pub input_type: InputType,
    pub placeholder: Option<String>,
}

impl TextFieldView {
    pub const KIND: &'static str = "text_field";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            input_type: InputType::Text,
            placeholder: None,
        }
    }

    pub fn input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    fn take_input(&mut self, ctx: &mut Context, call: &HandlerCall) -> Value {
        let text = call
            .event
            .value
            .clone()
            .or_else(|| ctx.document().value(self.core.id.as_str()))
            .unwrap_or_default();
        let value = Value::String(text);
        self.core.value = value.clone();
        if let Some(binding) = self.core.content_binding_reverse.clone() {
            ctx.write_back(&self.core.id, &binding, value.clone());
        }
        value
    }
}

impl Default for TextFieldView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TextFieldView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        for (event, action) in [("focus", "focus"), ("blur", "blur"), ("keyup", "input"), ("change", "input")] {
            let binding = Binding::on_view(&self.core.id, action);
            self.core.internal_events.insert(event.to_string(), binding);
        }
    }

    fn render(&mut self, _ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let mut input = Node::element("input")
            .with_id(&self.core.id)
            .with_attr("type", self.input_type.as_str())
            .with_attr("value", self.core.value_text())
            .with_class("ui-input-text")
            .with_optional_class(self.core.css_class.as_deref());
        if let Some(placeholder) = &self.placeholder {
            input = input.with_attr("placeholder", placeholder.clone());
        }
        if !self.core.is_enabled {
            input = input.with_attr("disabled", "disabled");
        }
        Ok(Some(input))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "input-text");
        Ok(())
    }

    fn render_update(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        let text = self.core.value_text();
        ctx.document_mut().set_value(self.core.id.as_str(), &text)?;
        Ok(())
    }

    fn content_did_change(&mut self, ctx: &mut Context, value: Value) -> Result<(), ViewError> {
        if self.core.has_focus {
            debug!("Text field {} has focus, keeping the typed text", self.core.id);
            return Ok(());
        }
        self.set_value(ctx, value)?;
        if self.core.is_attached() {
            self.render_update(ctx)?;
        }
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["focus", "blur", "keyup", "change"]
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        match action {
            "focus" => {
                self.core.has_focus = true;
                Ok(HandlerOutcome::forward())
            }
            "blur" => {
                self.core.has_focus = false;
                Ok(HandlerOutcome::forward())
            }
            "input" => {
                let value = self.take_input(ctx, call);
                Ok(HandlerOutcome::Forward(vec![value]))
            }
            _ => Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            }),
        }
    }

    fn responds_to(&self, action: &str) -> bool {
        matches!(action, "focus" | "blur" | "input")
    }
}
