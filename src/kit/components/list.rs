// List widgets for OrbitKit

use log::{debug, warn};
use serde_json::Value;

use crate::component::{
    lifecycle, with_view, ChildViews, Context, Node, View, ViewCore, ViewError, ViewRef,
};
use crate::events::{Binding, HandlerCall, HandlerOutcome};
use crate::state::Record;
use crate::template::{substitute_value, value_to_text};

/// One row of a list
///
/// Its children are the sub-views of the row (labels, thumbnails); a tap on
/// the row forwards the row's model id.
#[derive(Debug, Clone)]
pub struct ListItemView {
    pub core: ViewCore,
    /// Stable identifier of the record shown
    pub model_id: Option<String>,
}

impl ListItemView {
    pub const KIND: &'static str = "list_item";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            model_id: None,
        }
    }
}

impl Default for ListItemView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ListItemView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        let binding = Binding::on_view(&self.core.id, "select_item");
        self.core.internal_events.insert("tap".to_string(), binding);
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let mut item = Node::element("li")
            .with_id(&self.core.id)
            .with_class("ui-li")
            .with_optional_class(self.core.css_class.as_deref());
        if let Some(model_id) = &self.model_id {
            item = item.with_attr("data-model-id", model_id.clone());
        }
        if self.core.child_views.is_empty() {
            item = item.with_text(self.core.value_text());
        }
        Ok(Some(item.with_children(lifecycle::render_children(ctx, &self.core))))
    }

    fn render_update(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        if self.core.child_views.is_empty() {
            let text = self.core.value_text();
            ctx.document_mut().set_text(self.core.id.as_str(), &text)?;
        }
        Ok(())
    }

    fn recommended_events(&self) -> &'static [&'static str] {
        &["tap", "taphold", "swipeleft", "swiperight"]
    }

    fn perform(
        &mut self,
        _ctx: &mut Context,
        action: &str,
        _call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        match action {
            "select_item" => {
                let model_id = self.model_id.clone().map(Value::String).unwrap_or(Value::Null);
                Ok(HandlerOutcome::Forward(vec![model_id]))
            }
            _ => Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            }),
        }
    }

    fn responds_to(&self, action: &str) -> bool {
        action == "select_item"
    }
}

/// A change to one named sub-view of a list item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub key: String,
    pub value: Value,
}

impl ItemUpdate {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// List rendered from a template and a sequence of records
///
/// The template is deep-cloned once per record and `<%= field %>` placeholders
/// in the values of the copy and its descendants are filled from the record.
/// Each item is keyed by a model id taken from `id_name`, then `index_name`,
/// then its position, so single items can be patched or removed later without
/// re-rendering the list.
#[derive(Clone)]
pub struct ListView {
    pub core: ViewCore,
    pub template: Option<ViewRef>,
    pub id_name: String,
    pub index_name: Option<String>,
    pub inset: bool,
    /// Application handler receiving the model id of a tapped item
    pub on_select: Option<Binding>,
    /// Items from a bound value are built on the next render
    pending: bool,
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("core", &self.core)
            .field("template", &self.template.is_some())
            .field("id_name", &self.id_name)
            .field("index_name", &self.index_name)
            .field("inset", &self.inset)
            .field("on_select", &self.on_select)
            .field("pending", &self.pending)
            .finish()
    }
}

impl ListView {
    pub const KIND: &'static str = "list";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            template: None,
            id_name: "id".to_string(),
            index_name: None,
            inset: false,
            on_select: None,
            pending: false,
        }
    }

    pub fn template(mut self, template: ViewRef) -> Self {
        self.template = Some(template);
        self
    }

    pub fn id_name(mut self, name: impl Into<String>) -> Self {
        self.id_name = name.into();
        self
    }

    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn inset(mut self) -> Self {
        self.inset = true;
        self
    }

    pub fn on_select(mut self, binding: Binding) -> Self {
        self.on_select = Some(binding);
        self
    }

    fn item_name(model_id: &str) -> String {
        format!("item_{model_id}")
    }

    fn model_id_of(&self, record: &dyn Record, position: usize) -> String {
        record
            .field(&self.id_name)
            .filter(|v| !v.is_null())
            .or_else(|| {
                self.index_name
                    .as_ref()
                    .and_then(|name| record.field(name))
                    .filter(|v| !v.is_null())
            })
            .map(|v| value_to_text(&v))
            .unwrap_or_else(|| position.to_string())
    }

    /// Model ids in display order
    pub fn model_ids(&self) -> Vec<String> {
        self.core
            .child_views
            .names()
            .iter()
            .filter_map(|name| name.strip_prefix("item_").map(str::to_string))
            .collect()
    }

    /// Item showing a model id
    pub fn item(&self, model_id: &str) -> Option<ViewRef> {
        self.core.child(&Self::item_name(model_id))
    }

    /// The item template, which has to be a `ListItemView`
    fn item_template(&self) -> Result<ViewRef, ViewError> {
        let template = self.template.clone().ok_or_else(|| ViewError::MissingChild {
            parent: self.core.id.clone(),
            name: "template".to_string(),
        })?;
        let is_item = template
            .try_borrow()
            .map_err(|_| ViewError::Busy("list template is borrowed".to_string()))?
            .as_any()
            .is::<ListItemView>();
        if !is_item {
            return Err(ViewError::WrongChildType {
                parent: self.core.id.clone(),
                name: "template".to_string(),
                expected: ListItemView::KIND,
            });
        }
        Ok(template)
    }

    /// Replace the items with one per record
    ///
    /// A missing template or one that is not a `ListItemView` is logged and
    /// leaves the list unchanged.
    pub fn set_items<R: Record>(&mut self, ctx: &mut Context, records: &[R]) -> Result<(), ViewError> {
        let template = match self.item_template() {
            Ok(template) => template,
            Err(e) => {
                warn!("{}, no items built", e);
                return Ok(());
            }
        };
        self.pending = false;

        for (_, item) in self.core.child_views.resolved() {
            lifecycle::destroy(&item, ctx)?;
        }

        let mut items = ChildViews::new();
        for (position, record) in records.iter().enumerate() {
            let model_id = self.model_id_of(record, position);
            let name = Self::item_name(&model_id);
            if items.get(&name).is_some() {
                warn!("List {} has a duplicate model id {}, skipping", self.core.id, model_id);
                continue;
            }

            let item = lifecycle::deep_clone(&template, ctx)?;
            lifecycle::walk(&item, &mut |view| {
                if let Ok(mut view) = view.try_borrow_mut() {
                    let value = substitute_value(&view.core().value, record);
                    view.core_mut().value = value;
                }
            });
            with_view::<ListItemView, _>(&item, |item| item.model_id = Some(model_id.clone()));
            if let Some(on_select) = &self.on_select {
                item.borrow_mut()
                    .core_mut()
                    .events
                    .insert("tap".to_string(), on_select.clone());
            }
            items.insert(name, item);
        }
        self.core.child_views = items;

        if self.core.is_attached() {
            let nodes = lifecycle::render_children(ctx, &self.core);
            ctx.document_mut().replace_children(self.core.id.as_str(), &nodes)?;
            for (_, item) in self.core.child_views.resolved() {
                lifecycle::activate(&item, ctx)?;
            }
        }
        Ok(())
    }

    /// Patch named sub-views of one item
    ///
    /// Returns the number of sub-views changed; nothing else in the list is
    /// touched.
    pub fn update_list_item_view(
        &mut self,
        ctx: &mut Context,
        model_id: &str,
        updates: &[ItemUpdate],
    ) -> Result<usize, ViewError> {
        let Some(item) = self.item(model_id) else {
            warn!("List {} has no item with model id {}", self.core.id, model_id);
            return Ok(0);
        };
        let mut changed = 0;
        for update in updates {
            match lifecycle::find_descendant(&item, &update.key) {
                Some(view) => {
                    lifecycle::update(&view, ctx, update.value.clone())?;
                    changed += 1;
                }
                None => warn!(
                    "Item {} of list {} has no sub-view named '{}'",
                    model_id, self.core.id, update.key
                ),
            }
        }
        Ok(changed)
    }

    /// Destroy one item
    pub fn remove_item(&mut self, ctx: &mut Context, model_id: &str) -> Result<bool, ViewError> {
        match self.core.child_views.remove(&Self::item_name(model_id)) {
            Some(item) => {
                lifecycle::destroy(&item, ctx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ListView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        if let Err(e) = self.item_template() {
            warn!("{}", e);
        }
        self.pending = self.core.value.is_array();
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        if self.pending || (self.core.child_views.is_empty() && self.core.value.is_array()) {
            let records = self.core.value.as_array().cloned().unwrap_or_default();
            self.set_items(ctx, &records)?;
        }
        Ok(Some(
            Node::element("ul")
                .with_id(&self.core.id)
                .with_attr("data-role", "listview")
                .with_class("ui-listview")
                .with_optional_class(self.inset.then_some("ui-listview-inset"))
                .with_optional_class(self.core.css_class.as_deref())
                .with_children(lifecycle::render_children(ctx, &self.core)),
        ))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "listview");
        Ok(())
    }

    /// An array value replaces the items
    fn set_value(&mut self, ctx: &mut Context, value: Value) -> Result<(), ViewError> {
        self.core.value = value;
        match self.core.value.as_array().cloned() {
            Some(records) if self.core.is_attached() => self.set_items(ctx, &records),
            Some(_) => {
                self.pending = true;
                Ok(())
            }
            None => {
                debug!("List {} ignores a non-array value", self.core.id);
                Ok(())
            }
        }
    }
}
