//! Application-scoped context passed through the rendering pipeline

use std::any::Any;

use log::{debug, warn};

use crate::component::lifecycle;
use crate::component::scheduler::TaskQueue;
use crate::component::{ViewError, ViewId, ViewRef, ViewRegistry};
use crate::config::AppConfig;
use crate::events::Dispatcher;
use crate::kit::theme::{ClassThemeEngine, ThemeEngine};
use crate::platform::{Document, MemoryDocument};
use crate::state::Observables;
use crate::storage::{KeyValueStore, MemoryStore};

/// Everything a view needs besides itself: the registry, the host document,
/// the event dispatcher, deferred tasks, theming, storage and bound content.
///
/// One context exists per application run. Views never hold on to it; it is
/// passed as `&mut Context` to every lifecycle hook.
pub struct Context {
    pub(crate) registry: ViewRegistry,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) tasks: TaskQueue,
    pub(crate) observables: Observables,
    document: Box<dyn Document>,
    theme_engine: Box<dyn ThemeEngine>,
    store: Box<dyn KeyValueStore>,
    config: AppConfig,
    pages: Vec<ViewRef>,
    current_page: Option<ViewId>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .field("tasks", &self.tasks)
            .field("config", &self.config)
            .field("current_page", &self.current_page)
            .finish()
    }
}

impl Context {
    /// Create a context over a host document and store
    pub fn new(
        config: AppConfig,
        document: Box<dyn Document>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let theme_engine = Box::new(ClassThemeEngine::new(config.default_swatch.clone()));
        Self {
            registry: ViewRegistry::new(),
            dispatcher: Dispatcher::new(),
            tasks: TaskQueue::new(),
            observables: Observables::new(),
            document,
            theme_engine,
            store,
            config,
            pages: Vec::new(),
            current_page: None,
        }
    }

    /// Context over an in-memory document and store with default configuration
    pub fn in_memory() -> Self {
        Self::new(
            AppConfig::default(),
            Box::new(MemoryDocument::new()),
            Box::new(MemoryStore::new()),
        )
    }

    /// Replace the theme engine
    pub fn set_theme_engine(&mut self, engine: Box<dyn ThemeEngine>) {
        self.theme_engine = engine;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn document(&self) -> &dyn Document {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> &mut dyn Document {
        self.document.as_mut()
    }

    /// Downcast the host document, e.g. to drive a `MemoryDocument` in tests
    pub fn document_as<T: Any>(&mut self) -> Option<&mut T> {
        self.document.as_any_mut().downcast_mut::<T>()
    }

    pub fn theme_engine(&self) -> &dyn ThemeEngine {
        self.theme_engine.as_ref()
    }

    /// Downcast the theme engine
    pub fn theme_engine_as<T: Any>(&self) -> Option<&T> {
        self.theme_engine.as_any().downcast_ref::<T>()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Issue a fresh view id
    pub fn next_view_id(&self) -> ViewId {
        ViewId::generate(&self.config.id_prefix)
    }

    /// Resolve a view id
    pub fn view(&self, id: &ViewId) -> Option<ViewRef> {
        self.registry.get_view_by_id(id)
    }

    /// Hand an element to the theme engine
    pub fn enhance(&mut self, id: &ViewId, widget: &str) -> bool {
        self.theme_engine
            .enhance(self.document.as_mut(), id.as_str(), widget)
    }

    pub fn current_page(&self) -> Option<&ViewId> {
        self.current_page.as_ref()
    }

    /// Pages added or shown so far; the context owns them
    pub fn pages(&self) -> &[ViewRef] {
        &self.pages
    }

    /// Keep a page alive until it is shown or the context is torn down
    ///
    /// The registry only holds weak handles, so pages reached later through
    /// `show_page_by_id` must be owned here.
    pub fn add_page(&mut self, page: &ViewRef) {
        if !self.pages.iter().any(|p| lifecycle::same(p, page)) {
            self.pages.push(page.clone());
        }
    }

    /// Stop owning a page; `false` when it was not owned
    pub fn remove_page(&mut self, page: &ViewRef) -> bool {
        let before = self.pages.len();
        self.pages.retain(|p| !lifecycle::same(p, page));
        before != self.pages.len()
    }

    /// Make a page the visible one
    ///
    /// The first time a page is shown its whole tree is rendered, inserted
    /// with a single document insertion, themed and bound. Later visits only
    /// toggle visibility and rebind the page-scoped events.
    pub fn show_page(&mut self, page: &ViewRef) -> Result<(), ViewError> {
        let (id, phase) = {
            let page = page
                .try_borrow()
                .map_err(|_| ViewError::Busy("page is borrowed".to_string()))?;
            (page.core().id.clone(), page.core().phase())
        };
        if self.current_page.as_ref() == Some(&id) {
            debug!("Page {} is already shown", id);
            return Ok(());
        }

        if let Some(previous) = self.current_page.take() {
            self.document.add_class(previous.as_str(), "ui-page-hidden");
            self.release_page_events(&previous);
        }

        self.current_page = Some(id.clone());
        self.add_page(page);

        match phase {
            super::LifecyclePhase::Unconfigured => lifecycle::mount(page, self, None),
            super::LifecyclePhase::Destroyed => Err(ViewError::InvalidLifecycleTransition {
                id,
                phase,
                operation: "show",
            }),
            _ => {
                self.document.remove_class(id.as_str(), "ui-page-hidden");
                lifecycle::register_events(page, self)
            }
        }
    }

    /// Show a page by id, e.g. from a tab bar handler
    pub fn show_page_by_id(&mut self, id: &ViewId) -> Result<(), ViewError> {
        let page = self
            .view(id)
            .or_else(|| self.pages.iter().find(|p| lifecycle::id_of(p).as_ref() == Some(id)).cloned())
            .ok_or_else(|| ViewError::UnknownView(id.clone()))?;
        self.show_page(&page)
    }

    /// The viewport changed size or orientation
    pub fn viewport_did_change(&mut self) {
        let Some(id) = self.current_page.clone() else {
            return;
        };
        match self.view(&id) {
            Some(page) => lifecycle::orientation_changed(&page, self),
            None => warn!("Current page {} is not registered", id),
        }
    }

    /// Destroy every page and forget all state
    pub fn teardown(&mut self) {
        let pages = std::mem::take(&mut self.pages);
        for page in &pages {
            if let Err(e) = lifecycle::destroy(page, self) {
                warn!("Failed to destroy page during teardown: {}", e);
            }
        }
        self.current_page = None;
        self.tasks.clear();
        self.dispatcher.clear();
        self.registry.clear();
    }
}
