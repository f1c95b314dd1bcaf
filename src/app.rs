//! Application driver
//!
//! Owns the [`Context`] and connects it to the host: events queued by the
//! document are pumped into the dispatcher, the task clock is advanced, and
//! viewport changes are forwarded to the visible page.

use std::collections::HashSet;

use log::{debug, info};

use crate::component::{Context, ViewError, ViewRef};
use crate::config::AppConfig;
use crate::layout::Size;
use crate::platform::{Document, MemoryDocument};
use crate::storage::{KeyValueStore, MemoryStore};

/// A running application
#[derive(Debug)]
pub struct Application {
    ctx: Context,
}

impl Application {
    pub fn new(config: AppConfig, document: Box<dyn Document>, store: Box<dyn KeyValueStore>) -> Self {
        info!("Starting {}", config.app_name);
        Self {
            ctx: Context::new(config, document, store),
        }
    }

    /// Application over an in-memory document and store
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Box::new(MemoryDocument::new()), Box::new(MemoryStore::new()))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// The host document as a `MemoryDocument`, if it is one
    pub fn memory_document(&mut self) -> Option<&mut MemoryDocument> {
        self.ctx.document_as::<MemoryDocument>()
    }

    pub fn add_page(&mut self, page: &ViewRef) {
        self.ctx.add_page(page);
    }

    pub fn show_page(&mut self, page: &ViewRef) -> Result<(), ViewError> {
        self.ctx.show_page(page)
    }

    /// Dispatch every event the document has queued
    ///
    /// Entries of one interaction share a sequence number; once a handler
    /// stops propagation, the remaining entries of that interaction are
    /// skipped. Returns the number of handlers invoked.
    pub fn pump(&mut self) -> usize {
        let queued = self.ctx.document_mut().drain_events();
        let mut stopped = HashSet::new();
        let mut handled = 0;

        for entry in queued {
            if stopped.contains(&entry.seq) {
                debug!("Propagation of '{}' stopped before {}", entry.event.kind, entry.element_id);
                continue;
            }
            let mut event = entry.event;
            handled += self.ctx.dispatch_event(&entry.element_id, &mut event);
            if event.is_propagation_stopped() {
                stopped.insert(entry.seq);
            }
        }
        handled
    }

    /// Advance the task clock, returning the number of task runs
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        self.ctx.advance_clock(elapsed_ms)
    }

    /// The viewport was resized
    ///
    /// Only an in-memory document takes the new size from here; a browser
    /// reports its own.
    pub fn resize(&mut self, size: Size) {
        if let Some(document) = self.memory_document() {
            document.set_viewport(size);
        }
        self.ctx.viewport_did_change();
    }

    /// Destroy every page and drop all pending work
    pub fn shutdown(&mut self) {
        info!("Shutting down {}", self.ctx.config().app_name);
        self.ctx.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Design, View, ViewConfig};
    use crate::events::{Binding, HandlerOutcome};
    use crate::kit::components::{ButtonView, PageView};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_pump_dispatches_queued_taps() {
        let mut app = Application::in_memory(AppConfig::default());
        let taps = Rc::new(RefCell::new(Vec::new()));
        let seen = taps.clone();
        let ctx = app.context_mut();
        let button = ButtonView::new().design(
            ctx,
            ViewConfig::new().value("Go").on(
                "tap",
                Binding::callback(move |_, call| {
                    seen.borrow_mut().push(call.args.clone());
                    HandlerOutcome::Consumed
                }),
            ),
        );
        let button_ref: ViewRef = button.clone();
        let page: ViewRef = PageView::new().design(ctx, ViewConfig::new().child("go", button_ref));
        app.show_page(&page).unwrap();

        let id = button.borrow().core().id.clone();
        app.memory_document().unwrap().fire(id.as_str(), "tap");
        assert_eq!(app.pump(), 2);
        assert_eq!(taps.borrow().len(), 1);
        assert_eq!(app.pump(), 0);
    }

    #[test]
    fn test_shutdown_empties_the_registry() {
        let mut app = Application::in_memory(AppConfig::default());
        let page: ViewRef = PageView::new().design(app.context_mut(), ViewConfig::new());
        app.show_page(&page).unwrap();
        assert!(!app.context().registry().is_empty());

        app.shutdown();
        assert!(app.context().registry().is_empty());
        assert!(app.context().current_page().is_none());
    }
}
