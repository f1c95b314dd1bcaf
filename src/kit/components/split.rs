// Split view widget for OrbitKit

use log::{debug, warn};

use crate::component::{lifecycle, Context, Node, View, ViewCore, ViewError, ViewId};
use crate::layout::{Orientation, Pane, SplitLayout};

/// Menu and content side by side in landscape, content only in portrait
///
/// Expects children named `menu` and `content`. Widths are recomputed when
/// themed and on every orientation change; the longer pane becomes scrollable
/// once its content is taller than the viewport minus the toolbars.
#[derive(Debug, Clone)]
pub struct SplitView {
    pub core: ViewCore,
    pub orientation: Option<Orientation>,
    /// Pane that was made scrollable
    pub scrolling: Option<Pane>,
}

impl SplitView {
    pub const KIND: &'static str = "split";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            orientation: None,
            scrolling: None,
        }
    }

    fn pane_id(&self, name: &str) -> Option<ViewId> {
        lifecycle::id_of(self.core.child_views.get(name)?)
    }

    /// Recompute the pane widths for the current viewport
    pub fn layout(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        let (Some(menu), Some(content)) = (self.pane_id("menu"), self.pane_id("content")) else {
            warn!("Split view {} needs a 'menu' and a 'content' child", self.core.id);
            return Ok(());
        };
        let viewport = ctx.document().viewport();
        let orientation = Orientation::from_size(viewport);
        let split = SplitLayout::new(ctx.config().split_landscape_ratio);
        let (menu_width, content_width) = split.widths(orientation);

        let id = self.core.id.as_str();
        let document = ctx.document_mut();
        document.remove_class(id, orientation.opposite_class());
        document.add_class(id, orientation.css_class());
        document.set_style(menu.as_str(), "width", &format!("{menu_width}%"))?;
        document.set_style(content.as_str(), "width", &format!("{content_width}%"))?;
        document.set_style(menu.as_str(), "display", if menu_width == 0 { "none" } else { "block" })?;
        self.orientation = Some(orientation);

        if self.scrolling.is_none() {
            self.attach_scrolling(ctx, &menu, &content, viewport.height);
        }
        Ok(())
    }

    fn attach_scrolling(&mut self, ctx: &mut Context, menu: &ViewId, content: &ViewId, viewport_height: f64) {
        let document = ctx.document();
        let (Some(menu_size), Some(content_size)) =
            (document.measure(menu.as_str()), document.measure(content.as_str()))
        else {
            debug!("Panes of split view {} are not laid out yet", self.core.id);
            return;
        };
        let pane = SplitLayout::longer_pane(menu_size.height, content_size.height);
        let (pane_id, height) = match pane {
            Pane::Menu => (menu, menu_size.height),
            Pane::Content => (content, content_size.height),
        };
        if !SplitLayout::needs_scroll(height, viewport_height, ctx.config().toolbar_height) {
            return;
        }

        let document = ctx.document_mut();
        document.add_class(pane_id.as_str(), "ui-scrollable");
        if let Err(e) = document.set_style(pane_id.as_str(), "overflow-y", "auto") {
            warn!("Cannot make {} scrollable: {}", pane_id, e);
            return;
        }
        self.scrolling = Some(pane);
    }
}

impl Default for SplitView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for SplitView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        for name in ["menu", "content"] {
            if self.core.child_views.get(name).is_none() {
                let missing = ViewError::MissingChild {
                    parent: self.core.id.clone(),
                    name: name.to_string(),
                };
                warn!("{}", missing);
            }
        }
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let mut split = Node::element("div")
            .with_id(&self.core.id)
            .with_class("ui-splitview")
            .with_optional_class(self.core.css_class.as_deref());
        for name in ["menu", "content"] {
            if let Some(pane) = self.core.child(name) {
                if let Some(node) = lifecycle::render_child(ctx, &self.core.id, name, &pane) {
                    split = split.with_child(node.with_class(format!("ui-splitview-{name}")));
                }
            }
        }
        Ok(Some(split))
    }

    fn child_order(&self) -> Vec<crate::component::ViewRef> {
        ["menu", "content"]
            .into_iter()
            .filter_map(|name| self.core.child(name))
            .collect()
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "splitview");
        self.layout(ctx)
    }

    fn orientation_did_change(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        self.layout(ctx)
    }
}
