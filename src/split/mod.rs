//! Dual-pane split layout and the draggable divider.
//!
//! The split is a percentage in [10, 90] giving the editor pane's share of
//! the width; the preview pane gets the remainder minus a one-column
//! divider. Only drag gestures mutate the split.

use ratatui::layout::Rect;

/// Minimum editor-pane share of the width, in percent.
pub const MIN_SPLIT_PERCENT: f64 = 10.0;
/// Maximum editor-pane share of the width, in percent.
pub const MAX_SPLIT_PERCENT: f64 = 90.0;
/// Divider width in terminal columns.
pub const DIVIDER_WIDTH: u16 = 1;

/// The three horizontal regions of the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneAreas {
    pub editor: Rect,
    pub divider: Rect,
    pub preview: Rect,
}

/// Tracks the divider position and the drag gesture state.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLayout {
    percent: f64,
    dragging: bool,
}

impl SplitLayout {
    /// Create a split at the given percentage, clamped to [10, 90].
    pub fn new(percent: f64) -> Self {
        Self {
            percent: percent.clamp(MIN_SPLIT_PERCENT, MAX_SPLIT_PERCENT),
            dragging: false,
        }
    }

    /// Current editor-pane share in percent.
    pub const fn percent(&self) -> f64 {
        self.percent
    }

    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Mouse-down on the divider: enter the dragging state.
    pub const fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Mouse-up anywhere: leave the dragging state.
    pub const fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Recompute the split from a pointer column during a drag.
    ///
    /// Ignored when no drag is active. The column is taken relative to the
    /// container rect and clamped so the result always lands in [10, 90],
    /// including for pointer positions outside the container.
    pub fn drag_to(&mut self, column: u16, container: Rect) {
        if !self.dragging || container.width == 0 {
            return;
        }
        let relative = f64::from(column.saturating_sub(container.x));
        let raw = relative / f64::from(container.width) * 100.0;
        self.percent = raw.clamp(MIN_SPLIT_PERCENT, MAX_SPLIT_PERCENT);
    }

    /// Split a container into editor, divider, and preview rects.
    pub fn areas(&self, container: Rect) -> PaneAreas {
        let usable = container.width.saturating_sub(DIVIDER_WIDTH);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let editor_width =
            ((f64::from(usable) * self.percent / 100.0).round() as u16).min(usable);

        let editor = Rect::new(container.x, container.y, editor_width, container.height);
        let divider = Rect::new(
            container.x + editor_width,
            container.y,
            DIVIDER_WIDTH.min(container.width),
            container.height,
        );
        let preview = Rect::new(
            divider.x + divider.width,
            container.y,
            usable.saturating_sub(editor_width),
            container.height,
        );
        PaneAreas {
            editor,
            divider,
            preview,
        }
    }

    /// Whether a pointer column lands on the divider.
    pub fn hit_divider(&self, column: u16, container: Rect) -> bool {
        let areas = self.areas(container);
        column >= areas.divider.x && column < areas.divider.x + areas.divider.width
    }
}

impl Default for SplitLayout {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    #[test]
    fn test_new_clamps_out_of_range_percent() {
        assert!((SplitLayout::new(0.0).percent() - MIN_SPLIT_PERCENT).abs() < f64::EPSILON);
        assert!((SplitLayout::new(100.0).percent() - MAX_SPLIT_PERCENT).abs() < f64::EPSILON);
        assert!((SplitLayout::new(50.0).percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_is_even_split() {
        assert!((SplitLayout::default().percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_areas_partition_the_container() {
        let split = SplitLayout::new(50.0);
        let areas = split.areas(container());
        assert_eq!(
            areas.editor.width + areas.divider.width + areas.preview.width,
            100
        );
        assert_eq!(areas.divider.x, areas.editor.x + areas.editor.width);
        assert_eq!(areas.preview.x, areas.divider.x + areas.divider.width);
    }

    #[test]
    fn test_drag_requires_mouse_down() {
        let mut split = SplitLayout::new(50.0);
        split.drag_to(10, container());
        assert!((split.percent() - 50.0).abs() < f64::EPSILON, "no drag without mouse-down");
    }

    #[test]
    fn test_drag_protocol_moves_divider() {
        let mut split = SplitLayout::new(50.0);
        split.begin_drag();
        assert!(split.is_dragging());

        split.drag_to(30, container());
        assert!((split.percent() - 30.0).abs() < 0.5);

        split.end_drag();
        assert!(!split.is_dragging());

        // Moves after mouse-up are ignored.
        split.drag_to(80, container());
        assert!((split.percent() - 30.0).abs() < 0.5);
    }

    #[test]
    fn test_drag_clamps_far_left() {
        let mut split = SplitLayout::new(50.0);
        split.begin_drag();
        split.drag_to(0, container());
        assert!((split.percent() - MIN_SPLIT_PERCENT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_clamps_far_right_and_outside_container() {
        let mut split = SplitLayout::new(50.0);
        split.begin_drag();
        split.drag_to(u16::MAX, container());
        assert!((split.percent() - MAX_SPLIT_PERCENT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_with_offset_container() {
        let area = Rect::new(20, 0, 100, 40);
        let mut split = SplitLayout::new(50.0);
        split.begin_drag();
        split.drag_to(90, area); // 70 columns into a 100-wide container
        assert!((split.percent() - 70.0).abs() < 0.5);
    }

    #[test]
    fn test_hit_divider_only_on_divider_column() {
        let split = SplitLayout::new(50.0);
        let areas = split.areas(container());
        assert!(split.hit_divider(areas.divider.x, container()));
        assert!(!split.hit_divider(areas.divider.x - 1, container()));
        assert!(!split.hit_divider(areas.divider.x + DIVIDER_WIDTH, container()));
    }

    #[test]
    fn test_zero_width_container_is_safe() {
        let mut split = SplitLayout::new(50.0);
        split.begin_drag();
        split.drag_to(10, Rect::new(0, 0, 0, 0));
        let areas = split.areas(Rect::new(0, 0, 0, 0));
        assert_eq!(areas.editor.width, 0);
        assert_eq!(areas.preview.width, 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn percent_always_in_bounds(
                start in 0.0..100.0f64,
                column in 0..u16::MAX,
                width in 1..500u16,
            ) {
                let mut split = SplitLayout::new(start);
                split.begin_drag();
                split.drag_to(column, Rect::new(0, 0, width, 40));
                prop_assert!(split.percent() >= MIN_SPLIT_PERCENT);
                prop_assert!(split.percent() <= MAX_SPLIT_PERCENT);
            }

            #[test]
            fn areas_never_overflow_container(
                percent in 0.0..100.0f64,
                width in 2..500u16,
                height in 1..200u16,
            ) {
                let split = SplitLayout::new(percent);
                let container = Rect::new(0, 0, width, height);
                let areas = split.areas(container);
                prop_assert_eq!(
                    areas.editor.width + areas.divider.width + areas.preview.width,
                    width
                );
            }
        }
    }
}
