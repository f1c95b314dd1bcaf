// OrbitKit widget set

/// Accessors every widget implements the same way
macro_rules! view_core {
    () => {
        fn core(&self) -> &$crate::component::ViewCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::component::ViewCore {
            &mut self.core
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

// Structure
pub mod layout;
pub mod page;

// Leaves
pub mod button;
pub mod input;
pub mod label;

// Composites
pub mod button_group;
pub mod carousel;
pub mod dashboard;
pub mod dialog;
pub mod list;
pub mod split;
pub mod tab_bar;

pub use button::{ButtonVariant, ButtonView};
pub use button_group::ButtonGroupView;
pub use carousel::CarouselView;
pub use dashboard::DashboardView;
pub use dialog::DialogView;
pub use input::{InputType, TextFieldView};
pub use label::LabelView;
pub use layout::{ContainerView, Direction};
pub use list::{ItemUpdate, ListItemView, ListView};
pub use page::PageView;
pub use split::SplitView;
pub use tab_bar::TabBarView;
