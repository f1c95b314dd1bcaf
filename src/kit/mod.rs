// OrbitKit: theming seam and widgets for Orbit mobile views

pub mod components;
pub mod theme;

/// Re-export of the widgets for convenience
pub mod prelude {
    pub use crate::kit::components::{
        ButtonGroupView, ButtonVariant, ButtonView, CarouselView, ContainerView, DashboardView,
        DialogView, Direction, InputType, ItemUpdate, LabelView, ListItemView, ListView, PageView,
        SplitView, TabBarView, TextFieldView,
    };
    pub use crate::kit::theme::{ClassThemeEngine, ThemeEngine};
}
