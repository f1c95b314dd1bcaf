// Dashboard widget for OrbitKit

use log::{debug, error, trace};
use serde_json::Value;

use crate::component::{
    lifecycle, with_view, ChildViews, Context, Design, Node, RetryPolicy, TaskId, TaskStep, View,
    ViewConfig, ViewCore, ViewError, ViewRef,
};
use crate::events::{Binding, EventRegistration, HandlerCall, HandlerOutcome};
use crate::kit::components::ButtonView;
use crate::layout::LineLayout;

/// Storage name of the persisted item order
const STORAGE_NAME: &str = "dashboard";

/// Grid of launcher items whose order the user can rearrange
///
/// Holding a finger on the dashboard for `taphold_ms` enters edit mode. In
/// edit mode the normal bindings of the dashboard and its items are replaced
/// by drag and drop bindings; a tap leaves edit mode and persists the order.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub core: ViewCore,
    pub columns: usize,
    editing: bool,
    hold_task: Option<TaskId>,
    dragged: Option<String>,
}

impl DashboardView {
    pub const KIND: &'static str = "dashboard";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            columns: 3,
            editing: false,
            hold_task: None,
            dragged: None,
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// One button per value, ready to hand to `set_items`
    pub fn items_from_values(ctx: &mut Context, values: &[Value]) -> Vec<ViewRef> {
        values
            .iter()
            .map(|value| {
                let item: ViewRef = ButtonView::new().design(ctx, ViewConfig::new().value(value.clone()));
                item
            })
            .collect()
    }

    /// Values of the items in display order
    pub fn item_values(&self) -> Vec<Value> {
        self.core
            .child_views
            .resolved()
            .iter()
            .filter_map(|(_, item)| item.try_borrow().ok().map(|v| v.core().value.clone()))
            .collect()
    }

    /// Replace the items
    ///
    /// A stored order is applied when it has exactly as many entries as
    /// `items` and every entry matches an item value; otherwise the incoming
    /// order is kept.
    pub fn set_items(&mut self, ctx: &mut Context, items: Vec<ViewRef>) -> Result<(), ViewError> {
        for (_, item) in self.core.child_views.resolved() {
            lifecycle::destroy(&item, ctx)?;
        }

        let items = match ctx.restore::<Vec<Value>>(STORAGE_NAME) {
            Some(stored) if stored.len() == items.len() => {
                Self::apply_order(&stored, &items).unwrap_or(items)
            }
            Some(stored) => {
                debug!(
                    "Stored dashboard order has {} entries for {} items, keeping the incoming order",
                    stored.len(),
                    items.len()
                );
                items
            }
            None => items,
        };

        let mut children = ChildViews::new();
        for (index, item) in items.into_iter().enumerate() {
            children.insert(format!("item{index}"), item);
        }
        self.core.child_views = children;
        self.refresh(ctx)
    }

    fn apply_order(stored: &[Value], items: &[ViewRef]) -> Option<Vec<ViewRef>> {
        let values: Vec<Value> = items
            .iter()
            .map(|item| item.try_borrow().map(|v| v.core().value.clone()).unwrap_or(Value::Null))
            .collect();
        let mut used = vec![false; items.len()];
        let mut ordered = Vec::with_capacity(items.len());
        for wanted in stored {
            let index = (0..items.len()).find(|&i| !used[i] && &values[i] == wanted)?;
            used[index] = true;
            ordered.push(items[index].clone());
        }
        Some(ordered)
    }

    /// Write the current order to the store
    pub fn persist(&self, ctx: &mut Context) {
        if let Err(e) = ctx.save_json(STORAGE_NAME, &self.item_values()) {
            error!("Failed to persist the order of dashboard {}: {}", self.core.id, e);
        }
    }

    /// Move the item at `from` to position `to`, both 0-based
    pub fn move_item(&mut self, ctx: &mut Context, from: usize, to: usize) -> Result<bool, ViewError> {
        let mut names = self.core.child_views.names().to_vec();
        if from >= names.len() || to >= names.len() {
            debug!("Dashboard {} ignores a move from {} to {}", self.core.id, from, to);
            return Ok(false);
        }
        if from == to {
            return Ok(false);
        }
        let name = names.remove(from);
        names.insert(to, name);
        self.core.child_views.reorder(names);
        self.persist(ctx);
        self.refresh(ctx)?;
        Ok(true)
    }

    fn row_id(&self, row: usize) -> String {
        self.core.id.sub(&format!("row{row}"))
    }

    fn grid(&self, ctx: &mut Context) -> Vec<Node> {
        let cells = lifecycle::render_children(ctx, &self.core);
        let layout = LineLayout::new(cells.len(), self.columns);
        let mut cells = cells.into_iter();
        (1..=layout.lines())
            .map(|row| {
                let count = layout.items_in_line(row).count();
                Node::element("div")
                    .with_id(self.row_id(row))
                    .with_class("ui-dashboard-row")
                    .with_children(cells.by_ref().take(count))
            })
            .collect()
    }

    /// Re-render the items in place after a change of items or order
    fn refresh(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        if !self.core.is_attached() {
            return Ok(());
        }
        for (_, item) in self.core.child_views.resolved() {
            lifecycle::detach(&item, ctx)?;
        }
        let rows = self.grid(ctx);
        ctx.document_mut().replace_children(self.core.id.as_str(), &rows)?;
        for (_, item) in self.core.child_views.resolved() {
            lifecycle::activate(&item, ctx)?;
        }
        if self.editing {
            self.unbind_all(ctx);
            self.bind_edit_events(ctx);
        }
        Ok(())
    }

    fn index_of_element(&self, element_id: &str) -> Option<usize> {
        self.core
            .child_views
            .resolved()
            .iter()
            .position(|(_, item)| lifecycle::id_of(item).is_some_and(|id| id.as_str() == element_id))
    }

    fn bind_edit_events(&mut self, ctx: &mut Context) {
        let id = self.core.id.clone();
        ctx.register_event(
            EventRegistration::new("tap", id.as_str())
                .internal(Some(Binding::on_view(&id, "stop_editing"))),
        );
        for (_, item) in self.core.child_views.resolved() {
            let Some(item_id) = lifecycle::id_of(&item) else {
                continue;
            };
            for (event, action) in [("dragstart", "drag_item"), ("drop", "drop_item")] {
                ctx.register_event(
                    EventRegistration::new(event, item_id.as_str())
                        .internal(Some(Binding::on_view(&id, action))),
                );
            }
        }
    }

    fn unbind_all(&self, ctx: &mut Context) {
        ctx.unregister_events(self.core.id.as_str());
        for (_, item) in self.core.child_views.resolved() {
            if let Some(item_id) = lifecycle::id_of(&item) {
                ctx.unregister_events(item_id.as_str());
            }
        }
    }

    /// Swap every binding for the drag and drop set
    pub fn start_editing(&mut self, ctx: &mut Context) {
        self.hold_task = None;
        if self.editing {
            return;
        }
        self.editing = true;
        self.unbind_all(ctx);
        self.bind_edit_events(ctx);
        ctx.document_mut().add_class(self.core.id.as_str(), "ui-dashboard-editing");
        trace!("Dashboard {} entered edit mode", self.core.id);
    }

    /// Restore the normal bindings and persist the order
    pub fn stop_editing(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        if !self.editing {
            return Ok(());
        }
        self.editing = false;
        self.dragged = None;
        self.unbind_all(ctx);
        ctx.document_mut().remove_class(self.core.id.as_str(), "ui-dashboard-editing");
        ctx.bind_view_events(&self.core, self.recommended_events());
        for (_, item) in self.core.child_views.resolved() {
            lifecycle::register_events(&item, ctx)?;
        }
        self.persist(ctx);
        trace!("Dashboard {} left edit mode", self.core.id);
        Ok(())
    }

    fn hold_start(&mut self, ctx: &mut Context) {
        if self.editing || self.hold_task.is_some() {
            return;
        }
        let delay = ctx.config().taphold_ms;
        let task = ctx.schedule(&self.core.id, "dashboard-hold", delay, RetryPolicy::once(), |view, ctx, _| {
            with_view::<DashboardView, _>(view, |dashboard| dashboard.start_editing(ctx));
            TaskStep::Done
        });
        self.hold_task = Some(task);
    }

    fn hold_cancel(&mut self, ctx: &mut Context) {
        if let Some(task) = self.hold_task.take() {
            ctx.cancel_task(task);
        }
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for DashboardView {
    view_core!();

    /// Also runs on copies, which must not share the original's hold task
    fn did_design(&mut self, _ctx: &mut Context) {
        self.editing = false;
        self.hold_task = None;
        self.dragged = None;
        for (event, action) in [("touchstart", "hold_start"), ("touchend", "hold_cancel")] {
            let binding = Binding::on_view(&self.core.id, action);
            self.core.internal_events.insert(event.to_string(), binding);
        }
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        Ok(Some(
            Node::element("div")
                .with_id(&self.core.id)
                .with_class("ui-dashboard")
                .with_optional_class(self.core.css_class.as_deref())
                .with_children(self.grid(ctx)),
        ))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "dashboard");
        Ok(())
    }

    /// Rebinding always returns to normal mode
    fn register_events(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        if self.editing {
            debug!("Dashboard {} leaves edit mode on rebind", self.core.id);
            self.editing = false;
            self.dragged = None;
            self.unbind_all(ctx);
            ctx.document_mut().remove_class(self.core.id.as_str(), "ui-dashboard-editing");
        }
        ctx.bind_view_events(&self.core, self.recommended_events());
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["touchstart", "touchend", "tap", "dragstart", "drop"]
    }

    fn will_destroy(&mut self, ctx: &mut Context) {
        self.hold_cancel(ctx);
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        match action {
            "hold_start" => self.hold_start(ctx),
            "hold_cancel" => self.hold_cancel(ctx),
            "stop_editing" => self.stop_editing(ctx)?,
            "drag_item" => self.dragged = Some(call.element_id.clone()),
            "drop_item" => {
                let from = self.dragged.take().and_then(|id| self.index_of_element(&id));
                let to = self.index_of_element(&call.element_id);
                if let (Some(from), Some(to)) = (from, to) {
                    self.move_item(ctx, from, to)?;
                }
                call.event.stop_propagation();
            }
            _ => {
                return Err(ViewError::UnknownAction {
                    id: self.core.id.clone(),
                    action: action.to_string(),
                })
            }
        }
        Ok(HandlerOutcome::Consumed)
    }

    fn responds_to(&self, action: &str) -> bool {
        matches!(
            action,
            "hold_start" | "hold_cancel" | "stop_editing" | "drag_item" | "drop_item"
        )
    }
}
