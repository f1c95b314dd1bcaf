// Core module of the Orbit mobile view library
pub mod app;
pub mod component;
pub mod config;
pub mod events;
pub mod kit;
pub mod layout;
pub mod platform;
pub mod state;
pub mod storage;
pub mod template;

/// Version of the Orbit mobile view library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export of common types for convenience
pub mod prelude {
    pub use crate::app::Application;
    pub use crate::component::{
        design, lifecycle, with_view, ChildViews, Context, Design, LifecyclePhase, Node,
        RenderMode, View, ViewConfig, ViewCore, ViewError, ViewId, ViewRef, ViewRegistry,
    };
    pub use crate::config::AppConfig;
    pub use crate::events::{
        Action, ActionTable, Binding, DomEvent, EventRegistration, HandlerCall, HandlerChain,
        HandlerOutcome, Responder, Target,
    };
    pub use crate::kit::prelude::*;
    pub use crate::platform::{Document, MemoryDocument};
    pub use crate::state::{ContentBinding, Model, Record};
    pub use crate::storage::{KeyValueStore, MemoryStore};
}

pub use component::ViewError;
pub use platform::PlatformError;

/// Errors that can occur in the Orbit mobile view library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("View error: {0}")]
    View(#[from] ViewError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Storage error: {0}")]
    Storage(String),
}
