// Page widget for OrbitKit

use crate::component::{lifecycle, Context, Node, View, ViewCore, ViewError};

/// Root of a view tree
///
/// A page's whole subtree is rendered into one markup tree and inserted into
/// the document with a single insertion when the page is first shown.
#[derive(Debug, Clone)]
pub struct PageView {
    pub core: ViewCore,
    /// Text of the header toolbar, if any
    pub title: Option<String>,
}

impl PageView {
    pub const KIND: &'static str = "page";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            title: None,
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new()
        }
    }
}

impl Default for PageView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for PageView {
    view_core!();

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let mut page = Node::element("div")
            .with_id(&self.core.id)
            .with_attr("data-role", "page")
            .with_class("ui-page")
            .with_optional_class(self.core.css_class.as_deref());

        if let Some(title) = &self.title {
            page = page.with_child(
                Node::element("div")
                    .with_id(self.core.id.sub("header"))
                    .with_attr("data-role", "header")
                    .with_child(Node::element("h1").with_text(title.clone())),
            );
        }

        let content = Node::element("div")
            .with_id(self.core.id.sub("content"))
            .with_attr("data-role", "content")
            .with_children(lifecycle::render_children(ctx, &self.core));
        Ok(Some(page.with_child(content)))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "page");
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["swipeleft", "swiperight", "pageshow"]
    }
}
