//! Error types for view operations

use crate::component::{LifecyclePhase, ViewId};
use crate::platform::PlatformError;

/// Errors that can occur during view operations
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Invalid lifecycle transition
    #[error("Invalid lifecycle transition: cannot {operation} view {id} while in {phase:?} phase")]
    InvalidLifecycleTransition {
        id: ViewId,
        phase: LifecyclePhase,
        operation: &'static str,
    },

    /// The view is borrowed elsewhere, usually because it is the one currently handling an event
    #[error("View is busy: {0}")]
    Busy(String),

    /// Registry lookup miss
    #[error("View {0} not found in registry")]
    UnknownView(ViewId),

    /// Late-bound action name that the target does not know
    #[error("View {id} does not respond to action '{action}'")]
    UnknownAction { id: ViewId, action: String },

    /// Binding descriptor without a resolvable action
    #[error("Unresolvable handler: {0}")]
    UnresolvedHandler(String),

    /// Declared child view that has no instance
    #[error("Missing child view '{name}' in {parent}")]
    MissingChild { parent: ViewId, name: String },

    /// Child view of an unexpected kind
    #[error("Child view '{name}' of {parent} must be a {expected}")]
    WrongChildType {
        parent: ViewId,
        name: String,
        expected: &'static str,
    },

    /// Error from the host document
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
