// Button widget for OrbitKit

use log::debug;

use crate::component::{Context, Node, View, ViewCore, ViewError};
use crate::events::{Binding, HandlerCall, HandlerOutcome};

/// Button style variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    #[default]
    Normal,
    /// Sized to its text instead of the full width
    Inline,
    /// Navigates back
    Back,
}

/// Tappable button
///
/// The built-in `tap` handler swallows taps while the button is disabled and
/// otherwise forwards the button's value to the application's handler.
#[derive(Debug, Clone)]
pub struct ButtonView {
    pub core: ViewCore,
    pub variant: ButtonVariant,
    /// Icon name, rendered as `ui-icon-<name>`
    pub icon: Option<String>,
}

impl ButtonView {
    pub const KIND: &'static str = "button";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            variant: ButtonVariant::Normal,
            icon: None,
        }
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Enable or disable, patching the element when attached
    pub fn set_enabled(&mut self, ctx: &mut Context, enabled: bool) {
        self.core.is_enabled = enabled;
        if self.core.is_attached() {
            let id = self.core.id.as_str();
            if enabled {
                ctx.document_mut().remove_class(id, "ui-disabled");
            } else {
                ctx.document_mut().add_class(id, "ui-disabled");
            }
        }
    }

    /// Show or clear the pressed state
    pub fn set_active(&mut self, ctx: &mut Context, active: bool) {
        let id = self.core.id.as_str();
        if active {
            ctx.document_mut().add_class(id, "ui-btn-active");
        } else {
            ctx.document_mut().remove_class(id, "ui-btn-active");
        }
    }

    fn variant_class(&self) -> Option<&'static str> {
        match self.variant {
            ButtonVariant::Normal => None,
            ButtonVariant::Inline => Some("ui-btn-inline"),
            ButtonVariant::Back => Some("ui-btn-back"),
        }
    }
}

impl Default for ButtonView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ButtonView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        let binding = Binding::on_view(&self.core.id, "tap");
        self.core.internal_events.insert("tap".to_string(), binding);
    }

    fn render(&mut self, _ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let icon = self.icon.as_ref().map(|icon| format!("ui-icon-{icon}"));
        Ok(Some(
            Node::element("a")
                .with_id(&self.core.id)
                .with_attr("href", "#")
                .with_attr("data-role", "button")
                .with_class("ui-btn")
                .with_optional_class(self.variant_class())
                .with_optional_class(icon.as_deref())
                .with_optional_class((!self.core.is_enabled).then_some("ui-disabled"))
                .with_optional_class(self.core.css_class.as_deref())
                .with_text(self.core.value_text()),
        ))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "btn");
        Ok(())
    }

    fn render_update(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        let text = self.core.value_text();
        ctx.document_mut().set_text(self.core.id.as_str(), &text)?;
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["tap", "taphold", "vclick"]
    }

    fn perform(
        &mut self,
        _ctx: &mut Context,
        action: &str,
        _call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        match action {
            "tap" if !self.core.is_enabled => {
                debug!("Ignoring tap on disabled button {}", self.core.id);
                Ok(HandlerOutcome::Consumed)
            }
            "tap" => Ok(HandlerOutcome::Forward(vec![self.core.value.clone()])),
            _ => Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            }),
        }
    }

    fn responds_to(&self, action: &str) -> bool {
        action == "tap"
    }
}
