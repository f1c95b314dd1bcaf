// Tab bar widget for OrbitKit

use std::collections::HashMap;

use log::warn;
use serde_json::Value;

use crate::component::{lifecycle, Context, Node, View, ViewCore, ViewError, ViewId};
use crate::events::{Binding, HandlerCall, HandlerOutcome};

/// Navigation bar whose tabs switch the visible page
///
/// Each tab is a named child (usually a `ButtonView`) linked to a page id.
/// A tab bar belongs to one page; pages sharing a bar get their own copy
/// through `lifecycle::deep_clone`.
#[derive(Debug, Clone)]
pub struct TabBarView {
    pub core: ViewCore,
    /// Tab name -> page shown by the tab
    pub pages: HashMap<String, ViewId>,
    /// Name of the highlighted tab
    pub selected: Option<String>,
}

impl TabBarView {
    pub const KIND: &'static str = "tab_bar";

    pub fn new() -> Self {
        Self {
            core: ViewCore::new(Self::KIND),
            pages: HashMap::new(),
            selected: None,
        }
    }

    /// Link a tab to a page
    pub fn link(mut self, tab: impl Into<String>, page: &ViewId) -> Self {
        self.pages.insert(tab.into(), page.clone());
        self
    }

    pub fn selected(mut self, tab: impl Into<String>) -> Self {
        self.selected = Some(tab.into());
        self
    }

    fn tab_named_by_element(&self, element_id: &str) -> Option<String> {
        self.core
            .child_views
            .resolved()
            .into_iter()
            .find(|(_, tab)| lifecycle::id_of(tab).is_some_and(|id| id.as_str() == element_id))
            .map(|(name, _)| name)
    }

    fn highlight(&self, ctx: &mut Context) {
        for (name, tab) in self.core.child_views.resolved() {
            let Some(id) = lifecycle::id_of(&tab) else {
                continue;
            };
            if self.selected.as_deref() == Some(name.as_str()) {
                ctx.document_mut().add_class(id.as_str(), "ui-btn-active");
            } else {
                ctx.document_mut().remove_class(id.as_str(), "ui-btn-active");
            }
        }
    }
}

impl Default for TabBarView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TabBarView {
    view_core!();

    fn did_design(&mut self, _ctx: &mut Context) {
        for name in self.core.child_views.unresolved() {
            if self.pages.contains_key(&name) {
                warn!("Tab '{}' of {} is linked to a page but has no view", name, self.core.id);
            }
        }
        for (name, _) in self.core.child_views.resolved() {
            if !self.pages.contains_key(&name) {
                warn!("Tab '{}' of {} is not linked to a page", name, self.core.id);
            }
        }
    }

    fn render(&mut self, ctx: &mut Context) -> Result<Option<Node>, ViewError> {
        let tabs = self.core.child_views.resolved();
        let mut list = Node::element("ul").with_class(format!("ui-grid-{}", tabs.len().min(5)));

        for (index, (name, tab)) in tabs.iter().enumerate() {
            if let Ok(mut tab) = tab.try_borrow_mut() {
                let binding = Binding::on_view(&self.core.id, "switch_tab");
                tab.core_mut().internal_events.insert("tap".to_string(), binding);
            }
            if let Some(node) = lifecycle::render_child(ctx, &self.core.id, name, tab) {
                let block = format!("ui-block-{}", (b'a' + (index % 5) as u8) as char);
                list = list.with_child(Node::element("li").with_class(block).with_child(node));
            }
        }

        Ok(Some(
            Node::element("div")
                .with_id(&self.core.id)
                .with_attr("data-role", "navbar")
                .with_class("ui-navbar")
                .with_optional_class(self.core.css_class.as_deref())
                .with_child(list),
        ))
    }

    fn theme(&mut self, ctx: &mut Context) -> Result<(), ViewError> {
        ctx.enhance(&self.core.id, "navbar");
        self.highlight(ctx);
        Ok(())
    }

    fn perform(
        &mut self,
        ctx: &mut Context,
        action: &str,
        call: &mut HandlerCall,
    ) -> Result<HandlerOutcome, ViewError> {
        if action != "switch_tab" {
            return Err(ViewError::UnknownAction {
                id: self.core.id.clone(),
                action: action.to_string(),
            });
        }
        let Some(tab) = self.tab_named_by_element(&call.element_id) else {
            warn!("Tab bar {} has no tab for element {}", self.core.id, call.element_id);
            return Ok(HandlerOutcome::Consumed);
        };
        let Some(page) = self.pages.get(&tab).cloned() else {
            warn!("Tab '{}' of {} is not linked to a page", tab, self.core.id);
            return Ok(HandlerOutcome::Consumed);
        };

        self.selected = Some(tab.clone());
        self.highlight(ctx);
        ctx.show_page_by_id(&page)?;
        Ok(HandlerOutcome::Forward(vec![Value::String(tab)]))
    }

    fn responds_to(&self, action: &str) -> bool {
        action == "switch_tab"
    }
}
