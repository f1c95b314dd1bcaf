//! Registry resolving view ids to live views

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use crate::component::{ViewId, ViewRef, WeakViewRef};

/// Id -> view lookup table
///
/// Entries are non-owning: a view is kept alive by its parent (or by the
/// context for pages), never by the registry.
#[derive(Default)]
pub struct ViewRegistry {
    views: HashMap<ViewId, WeakViewRef>,
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("views", &format!("[{} views]", self.views.len()))
            .finish()
    }
}

fn same_view(a: &ViewRef, b: &ViewRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view under its own id
    pub fn register(&mut self, view: &ViewRef) {
        let id = match view.try_borrow() {
            Ok(v) => v.core().id.clone(),
            Err(_) => {
                warn!("Cannot register a view while it is mutably borrowed");
                return;
            }
        };
        self.register_as(id, view);
    }

    /// Register a view under an explicit id
    ///
    /// A different live view under the same id is replaced; the last
    /// registration wins.
    pub fn register_as(&mut self, id: ViewId, view: &ViewRef) {
        if let Some(existing) = self.views.get(&id).and_then(|weak| weak.upgrade()) {
            if same_view(&existing, view) {
                return;
            }
            warn!("View id {} already registered to another view, rebinding", id);
        }
        debug!("Registered view {}", id);
        self.views.insert(id, Rc::downgrade(view));
    }

    /// Resolve an id; unknown or dropped views yield `None`
    pub fn get_view_by_id(&self, id: &ViewId) -> Option<ViewRef> {
        self.views.get(id).and_then(|weak| weak.upgrade())
    }

    /// Resolve a raw element id
    pub fn get(&self, id: &str) -> Option<ViewRef> {
        self.get_view_by_id(&ViewId::from(id))
    }

    pub fn contains(&self, id: &ViewId) -> bool {
        self.get_view_by_id(id).is_some()
    }

    /// Remove an entry; unknown ids are ignored
    pub fn unregister(&mut self, id: &ViewId) {
        if self.views.remove(id).is_some() {
            debug!("Unregistered view {}", id);
        }
    }

    /// Ids of all live views
    pub fn ids(&self) -> Vec<ViewId> {
        self.views
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of live views
    pub fn len(&self) -> usize {
        self.views.values().filter(|weak| weak.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Context, Design, View, ViewConfig};
    use crate::kit::components::LabelView;

    #[test]
    fn test_lookup_of_unknown_id_is_none() {
        let registry = ViewRegistry::new();
        assert!(registry.get("m_unknown").is_none());
    }

    #[test]
    fn test_design_registers_and_unregister_is_idempotent() {
        let mut ctx = Context::in_memory();
        let label = LabelView::new().design(&mut ctx, ViewConfig::new().value("hi"));
        let id = label.borrow().core().id.clone();

        let found = ctx.registry().get_view_by_id(&id).expect("registered");
        let label_ref: ViewRef = label.clone();
        assert!(same_view(&found, &label_ref));

        ctx.registry_mut().unregister(&id);
        ctx.registry_mut().unregister(&id);
        assert!(ctx.registry().get_view_by_id(&id).is_none());
    }

    #[test]
    fn test_register_same_id_rebinds_to_last_view() {
        let mut ctx = Context::in_memory();
        let first: ViewRef = LabelView::new().design(&mut ctx, ViewConfig::new());
        let second: ViewRef = LabelView::new().design(&mut ctx, ViewConfig::new());
        let id = ViewId::from("m_shared");

        let mut registry = ViewRegistry::new();
        registry.register_as(id.clone(), &first);
        registry.register_as(id.clone(), &second);

        let found = registry.get_view_by_id(&id).expect("rebound");
        assert!(same_view(&found, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dropped_views_are_not_resolved() {
        let mut ctx = Context::in_memory();
        let id = {
            let label = LabelView::new().design(&mut ctx, ViewConfig::new());
            let id = label.borrow().core().id.clone();
            id
        };
        assert!(ctx.registry().get_view_by_id(&id).is_none());
        assert!(!ctx.registry().ids().contains(&id));
    }
}
