//! # Layout Engine
//!
//! Two passes over the widget tree, both driven from the root.
//!
//! ## Phase 1: wanted size (bottom-up)
//!
//! Children first, then the widget. Each kind reports the box it would like
//! to have, without margins. The generic rule is the union of every
//! non-collapsed child's wanted size plus margins, but at least `sizeHint`.
//!
//! ## Phase 2: layout (top-down)
//!
//! ```text
//! bounds ──shrink(margins)──► area ──align──► actual_bounds
//!                                                  │
//!                                       shrink(paddings)
//!                                                  ▼
//!                                      layout_children(child_area)
//! ```
//!
//! Containers place their children inside the child area. A container that
//! runs out of room sets `hidden_by_layout` on the children it dropped; such
//! a child is treated as collapsed no matter what its `visibility` says.

mod canvas;
mod dock;
mod flow;
mod grid;
mod stack;
mod tab;

use farsight_shared::{HAlignment, ImageScaling, Orientation, PropertyId, Rect, Size, UiFont, VAlignment, Visibility, WidgetType};
use tracing::trace;

use crate::context::WidgetContext;
use crate::painter::TextMeasure;
use crate::widget::{Widget, WidgetId, WidgetTree};

/// Effective visibility: layout-driven hiding wins over the property.
#[must_use]
pub fn actual_visibility(widget: &Widget, ctx: &dyn WidgetContext) -> Visibility {
    if widget.hidden_by_layout {
        Visibility::Collapsed
    } else {
        widget.props(ctx).visibility()
    }
}

/// Placement of a widget along one axis of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Center,
    End,
    Stretch,
}

impl From<HAlignment> for Anchor {
    fn from(alignment: HAlignment) -> Self {
        match alignment {
            HAlignment::Left => Self::Start,
            HAlignment::Center => Self::Center,
            HAlignment::Right => Self::End,
            HAlignment::Stretch => Self::Stretch,
        }
    }
}

impl From<VAlignment> for Anchor {
    fn from(alignment: VAlignment) -> Self {
        match alignment {
            VAlignment::Top => Self::Start,
            VAlignment::Middle => Self::Center,
            VAlignment::Bottom => Self::End,
            VAlignment::Stretch => Self::Stretch,
        }
    }
}

impl Anchor {
    /// Returns `(start, length)` of a `wanted` extent inside `[start, start + available)`.
    fn place(self, start: i32, available: i32, wanted: i32) -> (i32, i32) {
        let length = wanted.min(available);
        match self {
            Self::Stretch => (start, available),
            Self::Start => (start, length),
            Self::Center => (start + (available - length) / 2, length),
            Self::End => (start + available - length, length),
        }
    }
}

impl WidgetTree {
    /// Runs both layout phases from the root over `screen`.
    pub fn update_layout(&mut self, ctx: &mut dyn WidgetContext, metrics: &dyn TextMeasure, screen: Rect) {
        let Some(root) = self.root() else {
            return;
        };
        self.update_wanted_size(&*ctx, metrics, root);
        self.layout(ctx, root, screen);
    }

    /// Phase 1 for a subtree: children first, then `id`.
    pub fn update_wanted_size(&mut self, ctx: &dyn WidgetContext, metrics: &dyn TextMeasure, id: WidgetId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.update_wanted_size(ctx, metrics, child);
        }
        let wanted = self.calculate_wanted_size(ctx, metrics, id);
        if let Some(widget) = self.get_mut(id) {
            widget.wanted_size = wanted;
        }
    }

    /// Wanted size of `id` grown by its margins.
    #[must_use]
    pub fn wanted_size_with_margins(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        let Some(widget) = self.get(id) else {
            return Size::ZERO;
        };
        let margins = widget.props(ctx).margins(PropertyId::Margins);
        Size::new(
            widget.wanted_size.width + margins.total_horizontal(),
            widget.wanted_size.height + margins.total_vertical(),
        )
    }

    fn calculate_wanted_size(&mut self, ctx: &dyn WidgetContext, metrics: &dyn TextMeasure, id: WidgetId) -> Size {
        let Some(widget) = self.get(id) else {
            return Size::ZERO;
        };
        match widget.kind() {
            WidgetType::Stack => self.stack_wanted_size(ctx, id),
            WidgetType::Dock => self.dock_wanted_size(ctx, id),
            WidgetType::Grid => self.grid_wanted_size(ctx, id),
            WidgetType::Canvas => self.canvas_wanted_size(ctx, id),
            WidgetType::Tab => self.tab_wanted_size(ctx, metrics, id),
            WidgetType::Label => {
                let props = widget.props(ctx);
                let font: UiFont = props.enumeration(PropertyId::FontFamily);
                metrics.measure_string(&props.string(PropertyId::Text), font, None)
            }
            WidgetType::ComboBox
            | WidgetType::TreeView
            | WidgetType::ListBox
            | WidgetType::TextBox
            | WidgetType::SpinEdit
            | WidgetType::CheckBox
            | WidgetType::RadioButton
            | WidgetType::Slider => Size::new(32, 32),
            WidgetType::ProgressBar => Size::new(256, 32),
            WidgetType::Separator => Size::new(5, 5),
            WidgetType::ScrollBar => match widget.props(ctx).enumeration(PropertyId::Orientation) {
                Orientation::Horizontal => Size::new(64, 24),
                Orientation::Vertical => Size::new(24, 64),
            },
            WidgetType::Picture => {
                let image = widget.props(ctx).resource(PropertyId::Image);
                match ctx.resource(image).and_then(|resource| resource.as_bitmap()) {
                    Some(bitmap) => bitmap.size,
                    None => self.generic_wanted_size(ctx, id),
                }
            }
            _ => self.generic_wanted_size(ctx, id),
        }
    }

    /// Union of the non-collapsed children, at least `sizeHint`.
    fn generic_wanted_size(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        let Some(widget) = self.get(id) else {
            return Size::ZERO;
        };
        let size = widget
            .children
            .iter()
            .filter(|&&child| !self.is_collapsed(ctx, child))
            .fold(Size::ZERO, |size, &child| size.max(self.wanted_size_with_margins(ctx, child)));
        size.max(widget.props(ctx).size(PropertyId::SizeHint))
    }

    /// Collapsed by the user or by the parent's last layout.
    pub(crate) fn is_collapsed(&self, ctx: &dyn WidgetContext, id: WidgetId) -> bool {
        self.get(id)
            .map_or(true, |widget| actual_visibility(widget, ctx) == Visibility::Collapsed)
    }

    /// Collapsed by the `visibility` property alone.
    pub(crate) fn is_user_collapsed(&self, ctx: &dyn WidgetContext, id: WidgetId) -> bool {
        self.get(id)
            .map_or(true, |widget| widget.props(ctx).visibility() == Visibility::Collapsed)
    }

    pub(crate) fn set_hidden_by_layout(&mut self, id: WidgetId, hidden: bool) {
        if let Some(widget) = self.get_mut(id) {
            widget.hidden_by_layout = hidden;
        }
    }

    /// Phase 2: positions `id` inside `bounds` and lays out its children.
    pub fn layout(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, bounds: Rect) {
        let Some(widget) = self.get(id) else {
            return;
        };
        let (actual, child_area) = {
            let props = widget.props(&*ctx);
            let area = bounds.shrink(props.margins(PropertyId::Margins));
            let horizontal = Anchor::from(props.enumeration::<HAlignment>(PropertyId::HorizontalAlignment));
            let vertical = Anchor::from(props.enumeration::<VAlignment>(PropertyId::VerticalAlignment));
            let wanted = widget.wanted_size;
            let (x, width) = horizontal.place(area.x, area.width, wanted.width);
            let (y, height) = vertical.place(area.y, area.height, wanted.height);
            let actual = Rect::new(x, y, width, height);
            (actual, actual.shrink(props.margins(PropertyId::Paddings)))
        };
        trace!("{id} laid out at {actual:?}");

        let kind = widget.kind();
        if let Some(widget) = self.get_mut(id) {
            widget.actual_bounds = actual;
        }

        match kind {
            WidgetType::Stack => self.layout_stack(ctx, id, child_area),
            WidgetType::Dock => self.layout_dock(ctx, id, child_area),
            WidgetType::Grid => self.layout_grid(ctx, id, child_area),
            WidgetType::Canvas => self.layout_canvas(ctx, id, child_area),
            WidgetType::Flow => self.layout_flow(ctx, id, child_area),
            WidgetType::Tab => self.layout_tab(ctx, id, child_area),
            _ => {
                let children = self.children(id).to_vec();
                for child in children {
                    self.layout(ctx, child, child_area);
                }
            }
        }
    }
}

/// Scaling of a picture's bitmap inside its bounds.
///
/// Returns the target rectangle and, for unscaled pictures, the visible part
/// of the source bitmap.
#[must_use]
pub fn picture_placement(bounds: Rect, bitmap: Size, scaling: ImageScaling) -> (Rect, Option<Rect>) {
    let centered = |width: i32, height: i32| {
        Rect::new(
            bounds.x + (bounds.width - width) / 2,
            bounds.y + (bounds.height - height) / 2,
            width,
            height,
        )
    };
    if bitmap.width <= 0 || bitmap.height <= 0 || bounds.height <= 0 {
        return (bounds, None);
    }

    let fit_width = bounds.width as f32 / bitmap.width as f32;
    let fit_height = bounds.height as f32 / bitmap.height as f32;
    let source_aspect = bitmap.width as f32 / bitmap.height as f32;
    let target_aspect = bounds.width as f32 / bounds.height as f32;
    let scaled = |scale: f32| {
        centered(
            (bitmap.width as f32 * scale + 0.5) as i32,
            (bitmap.height as f32 * scale + 0.5) as i32,
        )
    };

    match scaling {
        ImageScaling::None => {
            let width = bitmap.width.min(bounds.width);
            let height = bitmap.height.min(bounds.height);
            (
                Rect::new(bounds.x, bounds.y, width, height),
                Some(Rect::new(0, 0, width, height)),
            )
        }
        ImageScaling::Stretch => (bounds, None),
        ImageScaling::Center => (centered(bitmap.width, bitmap.height), None),
        ImageScaling::Contain => {
            if bitmap.width <= bounds.width && bitmap.height <= bounds.height {
                (scaled(1.0), None)
            } else {
                (scaled(fit_width.min(fit_height)), None)
            }
        }
        ImageScaling::Zoom => {
            let scale = if source_aspect > target_aspect { fit_width } else { fit_height };
            (scaled(scale), None)
        }
        ImageScaling::Cover => {
            let scale = if source_aspect > target_aspect { fit_height } else { fit_width };
            (scaled(scale), None)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::context::LocalContext;
    use crate::painter::FixedMetrics;
    use farsight_shared::{Margins, Value};

    /// Spacer with zero margins and the given wanted size.
    pub(crate) fn fixed(tree: &mut WidgetTree, parent: WidgetId, width: i32, height: i32) -> WidgetId {
        let id = tree.create(WidgetType::Spacer);
        let widget = tree.get_mut(id).unwrap();
        widget.set_literal(PropertyId::Margins, Value::Margins(Margins::uniform(0))).unwrap();
        widget.set_literal(PropertyId::SizeHint, Value::Size(Size::new(width, height))).unwrap();
        tree.append_child(parent, id);
        id
    }

    /// Container of `kind` with zero margins, installed as root.
    pub(crate) fn container(tree: &mut WidgetTree, kind: WidgetType) -> WidgetId {
        let id = tree.create(kind);
        tree.get_mut(id)
            .unwrap()
            .set_literal(PropertyId::Margins, Value::Margins(Margins::uniform(0)))
            .unwrap();
        tree.set_root(Some(id));
        id
    }

    pub(crate) fn run(tree: &mut WidgetTree, ctx: &mut LocalContext, screen: Rect) {
        tree.update_layout(ctx, &FixedMetrics::default(), screen);
    }

    pub(crate) fn bounds(tree: &WidgetTree, id: WidgetId) -> Rect {
        tree.get(id).unwrap().actual_bounds()
    }

    #[test]
    fn test_alignment_inside_slot() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let root = container(&mut tree, WidgetType::Container);
        let child = fixed(&mut tree, root, 20, 10);
        {
            let widget = tree.get_mut(child).unwrap();
            widget.set_literal(PropertyId::HorizontalAlignment, Value::Enumeration(2)).unwrap();
            widget.set_literal(PropertyId::VerticalAlignment, Value::Enumeration(6)).unwrap();
        }
        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 50));
        assert_eq!(bounds(&tree, root), Rect::new(0, 0, 100, 50));
        assert_eq!(bounds(&tree, child), Rect::new(40, 40, 20, 10));
    }

    #[test]
    fn test_margins_and_paddings() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let root = container(&mut tree, WidgetType::Panel);
        tree.get_mut(root)
            .unwrap()
            .set_literal(PropertyId::Paddings, Value::Margins(Margins::new(1, 2, 3, 4)))
            .unwrap();
        let child = fixed(&mut tree, root, 5, 5);
        tree.get_mut(child)
            .unwrap()
            .set_literal(PropertyId::Margins, Value::Margins(Margins::uniform(10)))
            .unwrap();

        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(root).unwrap().wanted_size(), Size::new(25, 25));
        assert_eq!(bounds(&tree, child), Rect::new(11, 12, 76, 74));
    }

    #[test]
    fn test_collapsed_child_ignored_by_generic_rule() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let root = container(&mut tree, WidgetType::Container);
        fixed(&mut tree, root, 10, 10);
        let big = fixed(&mut tree, root, 90, 90);
        tree.get_mut(big)
            .unwrap()
            .set_literal(PropertyId::Visibility, Value::Enumeration(Visibility::Collapsed as u8))
            .unwrap();
        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(root).unwrap().wanted_size(), Size::new(10, 10));
    }

    #[test]
    fn test_label_measures_text() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let label = tree.create(WidgetType::Label);
        tree.get_mut(label).unwrap().set_literal(PropertyId::Text, Value::from("Hello")).unwrap();
        tree.set_root(Some(label));
        run(&mut tree, &mut ctx, Rect::new(0, 0, 200, 100));

        let widget = tree.get(label).unwrap();
        assert_eq!(widget.wanted_size(), Size::new(40, 16));
        // Centered inside the 8px margins.
        assert_eq!(widget.actual_bounds(), Rect::new(80, 42, 40, 16));
    }

    #[test]
    fn test_picture_placement() {
        let bounds = Rect::new(0, 0, 100, 50);
        let bitmap = Size::new(20, 20);
        assert_eq!(picture_placement(bounds, bitmap, ImageScaling::Stretch), (bounds, None));
        assert_eq!(
            picture_placement(bounds, bitmap, ImageScaling::Center).0,
            Rect::new(40, 15, 20, 20)
        );
        assert_eq!(
            picture_placement(bounds, bitmap, ImageScaling::Zoom).0,
            Rect::new(25, 0, 50, 50)
        );
        assert_eq!(
            picture_placement(bounds, bitmap, ImageScaling::Cover).0,
            Rect::new(0, -25, 100, 100)
        );
        assert_eq!(
            picture_placement(bounds, Size::new(200, 50), ImageScaling::Contain).0,
            Rect::new(0, 12, 100, 25)
        );
        assert_eq!(
            picture_placement(bounds, Size::new(200, 80), ImageScaling::None),
            (Rect::new(0, 0, 100, 50), Some(Rect::new(0, 0, 100, 50)))
        );
    }
}
