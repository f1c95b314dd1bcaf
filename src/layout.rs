//! Layout arithmetic for composite views
//!
//! Pure calculations shared by the widgets: grouping items into lines,
//! responsive two-pane splits and carousel paging. Nothing here touches the
//! document.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// A 2D size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Whether the size has any extent
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Items grouped into lines of a fixed length
///
/// Item indices are 1-based, matching the line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLayout {
    count: usize,
    per_line: usize,
}

impl LineLayout {
    /// A `per_line` of zero puts everything on one line
    pub fn new(count: usize, per_line: usize) -> Self {
        let per_line = if per_line == 0 { count.max(1) } else { per_line };
        Self { count, per_line }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn per_line(&self) -> usize {
        self.per_line
    }

    /// Number of lines
    pub fn lines(&self) -> usize {
        self.count.div_ceil(self.per_line)
    }

    /// Line of a 1-based item index
    pub fn line_of(&self, index: usize) -> usize {
        index.div_ceil(self.per_line)
    }

    /// 1-based item indices on a line; empty for a line that does not exist
    pub fn items_in_line(&self, line: usize) -> RangeInclusive<usize> {
        if line == 0 || line > self.lines() {
            return 1..=0;
        }
        let first = (line - 1) * self.per_line + 1;
        let last = (line * self.per_line).min(self.count);
        first..=last
    }

    /// Corner classes of an item: the first and last items of the first and
    /// last lines round their outer corners
    pub fn corner_classes(&self, index: usize) -> Vec<&'static str> {
        if index == 0 || index > self.count {
            return Vec::new();
        }
        let line = self.line_of(index);
        let items = self.items_in_line(line);
        let first_in_line = index == *items.start();
        let last_in_line = index == *items.end();

        let mut classes = Vec::new();
        if line == 1 {
            if first_in_line {
                classes.push("ui-corner-tl");
            }
            if last_in_line {
                classes.push("ui-corner-tr");
            }
        }
        if line == self.lines() {
            if first_in_line {
                classes.push("ui-corner-bl");
            }
            if last_in_line {
                classes.push("ui-corner-br");
            }
        }
        classes
    }
}

/// Orientation of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_size(size: Size) -> Self {
        if size.width > size.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    /// The class of the other orientation
    pub fn opposite_class(self) -> &'static str {
        match self {
            Orientation::Portrait => "landscape",
            Orientation::Landscape => "portrait",
        }
    }
}

/// One pane of a split layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Menu,
    Content,
}

/// Menu and content panes side by side in landscape
///
/// In portrait the content takes the full width and the menu is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLayout {
    menu_percent: u32,
}

impl SplitLayout {
    pub fn new(menu_percent: u32) -> Self {
        Self {
            menu_percent: menu_percent.min(100),
        }
    }

    /// Percent widths of (menu, content)
    pub fn widths(&self, orientation: Orientation) -> (u32, u32) {
        match orientation {
            Orientation::Landscape => (self.menu_percent, 100 - self.menu_percent),
            Orientation::Portrait => (0, 100),
        }
    }

    /// Whether content of this height overflows the viewport minus the space
    /// reserved for toolbars
    pub fn needs_scroll(content_height: f64, viewport_height: f64, reserved: f64) -> bool {
        content_height > viewport_height - reserved
    }

    /// The taller pane; ties go to the content
    pub fn longer_pane(menu_height: f64, content_height: f64) -> Pane {
        if menu_height > content_height {
            Pane::Menu
        } else {
            Pane::Content
        }
    }
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Horizontal paging of equally wide pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paging {
    page_width: f64,
    pages: usize,
}

impl Paging {
    pub fn new(page_width: f64, pages: usize) -> Self {
        Self {
            page_width: page_width.max(0.0),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    /// Clamp a page index into range
    pub fn clamp(&self, page: isize) -> usize {
        if self.pages == 0 || page < 0 {
            return 0;
        }
        (page as usize).min(self.pages - 1)
    }

    /// Scroll offset that shows a page
    pub fn offset_for(&self, page: usize) -> f64 {
        self.clamp(isize::try_from(page).unwrap_or(isize::MAX)) as f64 * self.page_width
    }

    /// Page nearest to a scroll offset
    pub fn snap(&self, offset: f64) -> usize {
        if self.page_width <= 0.0 {
            return 0;
        }
        self.clamp((offset / self.page_width).round() as isize)
    }

    /// Width of the strip holding every page
    pub fn track_width(&self) -> f64 {
        self.page_width * self.pages as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_items_two_per_line() {
        let layout = LineLayout::new(5, 2);
        assert_eq!(layout.lines(), 3);
        assert_eq!(layout.line_of(5), 3);
        assert_eq!(layout.items_in_line(3), 5..=5);
        assert_eq!(layout.corner_classes(5), vec!["ui-corner-bl", "ui-corner-br"]);
        assert_eq!(layout.corner_classes(3), Vec::<&str>::new());
    }

    #[test]
    fn test_four_items_two_per_line() {
        let layout = LineLayout::new(4, 2);
        assert_eq!(layout.lines(), 2);
        assert_eq!(
            (1..=4).map(|i| layout.line_of(i)).collect::<Vec<_>>(),
            vec![1, 1, 2, 2]
        );
        assert_eq!(layout.items_in_line(2), 3..=4);
        assert_eq!(layout.corner_classes(1), vec!["ui-corner-tl"]);
        assert_eq!(layout.corner_classes(2), vec!["ui-corner-tr"]);
    }

    #[test]
    fn test_single_line_rounds_all_corners() {
        let layout = LineLayout::new(3, 0);
        assert_eq!(layout.lines(), 1);
        assert_eq!(layout.corner_classes(1), vec!["ui-corner-tl", "ui-corner-bl"]);
        assert_eq!(layout.corner_classes(3), vec!["ui-corner-tr", "ui-corner-br"]);
        assert_eq!(LineLayout::new(0, 2).lines(), 0);
    }

    #[test]
    fn test_split_widths() {
        let split = SplitLayout::new(30);
        assert_eq!(split.widths(Orientation::Landscape), (30, 70));
        assert_eq!(split.widths(Orientation::Portrait), (0, 100));
        assert_eq!(
            Orientation::from_size(Size::new(480.0, 320.0)),
            Orientation::Landscape
        );
        assert!(SplitLayout::needs_scroll(500.0, 480.0, 44.0));
        assert!(!SplitLayout::needs_scroll(400.0, 480.0, 44.0));
        assert_eq!(SplitLayout::longer_pane(300.0, 900.0), Pane::Content);
    }

    #[test]
    fn test_paging_snaps_to_nearest_page() {
        let paging = Paging::new(320.0, 4);
        assert_eq!(paging.snap(0.0), 0);
        assert_eq!(paging.snap(170.0), 1);
        assert_eq!(paging.snap(5000.0), 3);
        assert_eq!(paging.clamp(-2), 0);
        assert_eq!(paging.offset_for(2), 640.0);
        assert_eq!(paging.track_width(), 1280.0);
        assert_eq!(Paging::new(0.0, 3).snap(100.0), 0);
    }

    #[test]
    fn test_lines_out_of_range_are_empty() {
        let layout = LineLayout::new(5, 2);
        assert_eq!(layout.items_in_line(0).count(), 0);
        assert_eq!(layout.items_in_line(4).count(), 0);
        assert_eq!(LineLayout::new(0, 3).items_in_line(1).count(), 0);
    }

    #[test]
    fn test_huge_page_index_clamps_to_last_page() {
        let paging = Paging::new(320.0, 4);
        assert_eq!(paging.offset_for(usize::MAX), 960.0);
        assert_eq!(paging.offset_for(isize::MAX as usize + 1), 960.0);
    }
}
