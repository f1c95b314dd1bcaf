// Theme engine seam for OrbitKit

use std::any::Any;
use std::collections::HashMap;

use log::trace;

use crate::platform::Document;

/// Applies native-looking chrome to an element once it is in the document
///
/// Widgets call this from `theme()`; the element and its subtree are
/// guaranteed to exist and stay in place for the duration of the call.
pub trait ThemeEngine {
    /// Enhance the element `id` as a `widget`; `false` when the element is
    /// missing
    fn enhance(&mut self, document: &mut dyn Document, id: &str, widget: &str) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Default engine: marks enhanced elements with `ui-<widget>` and the
/// swatch's body class
#[derive(Debug, Clone)]
pub struct ClassThemeEngine {
    swatch: String,
    enhanced: HashMap<String, usize>,
}

impl ClassThemeEngine {
    pub fn new(swatch: impl Into<String>) -> Self {
        Self {
            swatch: swatch.into(),
            enhanced: HashMap::new(),
        }
    }

    pub fn swatch(&self) -> &str {
        &self.swatch
    }

    /// How often an element has been enhanced
    pub fn enhancements(&self, id: &str) -> usize {
        self.enhanced.get(id).copied().unwrap_or(0)
    }
}

impl Default for ClassThemeEngine {
    fn default() -> Self {
        Self::new("c")
    }
}

impl ThemeEngine for ClassThemeEngine {
    fn enhance(&mut self, document: &mut dyn Document, id: &str, widget: &str) -> bool {
        if !document.contains(id) {
            return false;
        }
        document.add_class(id, &format!("ui-{widget}"));
        document.add_class(id, &format!("ui-body-{}", self.swatch));
        *self.enhanced.entry(id.to_string()).or_insert(0) += 1;
        trace!("Enhanced {} as {}", id, widget);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Node;
    use crate::platform::MemoryDocument;

    #[test]
    fn test_enhance_adds_widget_and_swatch_classes() {
        let mut doc = MemoryDocument::new();
        doc.insert(None, &Node::element("a").with_id("m_1")).unwrap();
        let mut engine = ClassThemeEngine::new("b");

        assert!(engine.enhance(&mut doc, "m_1", "btn"));
        assert!(doc.has_class("m_1", "ui-btn"));
        assert!(doc.has_class("m_1", "ui-body-b"));
        assert_eq!(engine.enhancements("m_1"), 1);
        assert!(!engine.enhance(&mut doc, "m_2", "btn"));
    }
}
