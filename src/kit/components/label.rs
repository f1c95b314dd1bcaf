// Label widget for OrbitKit

use crate::component::{Context, Node, View, ViewCore, ViewError};

/// Text display, usually bound to a property
#[derive(Debug, Clone)]
pub struct LabelView {
    pub core: ViewCore,
}

impl LabelView {
    pub const KIND: &'static str = "label";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
        }
    }
}

impl Default for LabelView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for LabelView {
    view_core!();

    fn render(&mut self, _ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        Ok(Some(
            Node::element("span")
                .with_id(&self.core.id)
                .with_class("ui-label")
                .with_optional_class(self.core.css_class.as_deref())
                .with_text(self.core.value_text()),
        ))
    }

    /// Replace the text node only
    fn render_update(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        let text = self.core.value_text();
        ctx.document_mut().set_text(self.core.id.as_str(), &text)?;
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["tap"]
    }
}
