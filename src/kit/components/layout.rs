// Container widget for OrbitKit

use crate::component::{lifecycle, Context, Node, View, ViewCore, ViewError};

/// Layout direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Children stacked vertically
    #[default]
    Column,
    /// Children side by side
    Row,
}

impl Direction {
    fn css_class(self) -> &'static str {
        match self {
            Direction::Column => "ui-layout-column",
            Direction::Row => "ui-layout-row",
        }
    }
}

/// Generic composite holding named child views
#[derive(Debug, Clone)]
pub struct ContainerView {
    pub core: ViewCore,
    pub direction: Direction,
}

impl ContainerView {
    pub const KIND: &'static str = "container";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            direction: Direction::Column,
        }
    }

    pub fn row() -> Self {
        Self {
            direction: Direction::Row,
            ..Self::new()
        }
    }
}

impl Default for ContainerView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ContainerView {
    view_core!();

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let children = lifecycle::render_children(ctx, &self.core);
        Ok(Some(
            Node::element("div")
                .with_id(&self.core.id)
                .with_class("ui-container")
                .with_class(self.direction.css_class())
                .with_optional_class(self.core.css_class.as_deref())
                .with_children(children),
        ))
    }
}
