// Dialog widget for OrbitKit

use log::{error, warn};
use serde_json::Value;

use crate::component::{
    lifecycle, Context, Design, Node, RenderMode, RetryPolicy, TaskStep, View, ViewConfig,
    ViewCore, ViewError, ViewRef,
};
use crate::events::{Binding, DomEvent, HandlerCall, HandlerOutcome};
use crate::kit::components::ButtonView;

/// Modal dialog
///
/// Dialogs have no parent to return markup to, so `render` inserts them into
/// the document body itself. Any button tap hides the dialog: it fades out
/// for the configured transition time and is then destroyed. The tap still
/// reaches the button's own application handler.
#[derive(Debug, Clone)]
pub struct DialogView {
    pub core: ViewCore,
    pub title: Option<String>,
    /// Called with the error message when the dialog cannot be shown
    pub on_error: Option<Binding>,
    hiding: bool,
}

impl DialogView {
    pub const KIND: &'static str = "dialog";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            title: None,
            on_error: None,
            hiding: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn on_error(mut self, binding: Binding) -> Self {
        self.on_error = Some(binding);
        self
    }

    /// Whether the dialog is fading out
    pub fn is_hiding(&self) -> bool {
        self.hiding
    }

    /// Start hiding: fade out now, destroy after the transition
    pub fn hide(&mut self, ctx: &mut Context) {
        if self.hiding {
            return;
        }
        self.hiding = true;
        ctx.document_mut().add_class(self.core.id.as_str(), "out");
        let delay = ctx.config().transition_ms;
        ctx.schedule(&self.core.id, "dialog-hide", delay, RetryPolicy::once(), |dialog, ctx, _| {
            if let Err(e) = lifecycle::destroy(dialog, ctx) {
                warn!("Failed to destroy hidden dialog: {}", e);
            }
            ctx.remove_page(dialog);
            TaskStep::Done
        });
    }

    fn report(&self, ctx: &mut Context, message: String) {
        error!("Dialog {} cannot be shown: {}", self.core.id, message);
        let Some(on_error) = self.on_error.clone() else {
            return;
        };
        let mut event = DomEvent::new("error", self.core.id.as_str());
        if let Err(e) = ctx.call_handler(&on_error, &mut event, false, vec![Value::String(message)]) {
            error!("Error handler of dialog {} failed: {}", self.core.id, e);
        }
    }

    /// Mount a designed dialog; the context owns it until it is hidden
    pub fn open(ctx: &mut Context, dialog: ViewRef) -> Result<ViewRef, ViewError> {
        ctx.add_page(&dialog);
        if let Err(e) = lifecycle::mount(&dialog, ctx, None) {
            ctx.remove_page(&dialog);
            return Err(e);
        }
        Ok(dialog)
    }

    /// Show a message with a single OK button
    pub fn alert(
        ctx: &mut Context,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<ViewRef, ViewError> {
        let ok: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value("OK"));
        let dialog: ViewRef = DialogView::new()
            .title(title)
            .design(ctx, ViewConfig::new().value(message.into()).child("ok", ok));
        Self::open(ctx, dialog)
    }

    /// Ask a question; `on_confirm` runs when OK is tapped
    pub fn confirm(
        ctx: &mut Context,
        title: impl Into<String>,
        message: impl Into<String>,
        on_confirm: Binding,
    ) -> Result<ViewRef, ViewError> {
        let cancel: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value("Cancel"));
        let ok: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value("OK").on("tap", on_confirm));
        let dialog: ViewRef = DialogView::new().title(title).design(
            ctx,
            ViewConfig::new()
                .value(message.into())
                .child_order(["cancel", "ok"])
                .child("cancel", cancel)
                .child("ok", ok),
        );
        Self::open(ctx, dialog)
    }
}

impl Default for DialogView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for DialogView {
    view_core!();

    fn render_mode(&self) -> RenderMode {
        RenderMode::SelfAttaching
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let id = self.core.id.clone();
        for (_, button) in self.core.child_views.resolved() {
            if let Ok(mut button) = button.try_borrow_mut() {
                let binding = Binding::on_view(&id, "dismiss");
                button.core_mut().internal_events.insert("tap".to_string(), binding);
            }
        }

        let mut content = Node::element("div")
            .with_id(id.sub("content"))
            .with_attr("data-role", "content")
            .with_child(Node::element("p").with_text(self.core.value_text()));
        content = content.with_children(lifecycle::render_children(ctx, &self.core));

        let mut dialog = Node::element("div")
            .with_id(&id)
            .with_attr("data-role", "dialog")
            .with_class("ui-dialog")
            .with_optional_class(self.core.css_class.as_deref());
        if let Some(title) = &self.title {
            dialog = dialog.with_child(
                Node::element("div")
                    .with_id(id.sub("header"))
                    .with_attr("data-role", "header")
                    .with_child(Node::element("h1").with_text(title.clone())),
            );
        }
        let dialog = dialog.with_child(content);

        if let Err(e) = ctx.document_mut().insert(None, &dialog) {
            self.report(ctx, e.to_string());
            return Err(e.into());
        }
        Ok(None)
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "dialog");
        Ok(())
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        if action != "dismiss" {
            return Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            });
        }
        let value = ctx
            .registry()
            .get(&call.element_id)
            .and_then(|button| button.try_borrow().ok().map(|b| b.core().value.clone()))
            .unwrap_or(Value::Null);
        self.hide(ctx);
        Ok(HandlerOutcome::Forward(vec![value]))
    }

    fn responds_to(&self, action: &str) -> bool {
        action == "dismiss"
    }
}
