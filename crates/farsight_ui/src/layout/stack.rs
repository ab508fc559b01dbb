//! Stack: children one after another along the orientation axis.

use farsight_shared::{Orientation, PropertyId, Rect, Size};

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

impl WidgetTree {
    fn orientation(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Orientation {
        self.get(id)
            .map(|widget| widget.props(ctx).enumeration(PropertyId::Orientation))
            .unwrap_or_default()
    }

    pub(crate) fn stack_wanted_size(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        let orientation = self.orientation(ctx, id);
        let mut size = Size::ZERO;
        for &child in self.children(id) {
            if self.is_collapsed(ctx, child) {
                continue;
            }
            let wanted = self.wanted_size_with_margins(ctx, child);
            match orientation {
                Orientation::Vertical => {
                    size.width = size.width.max(wanted.width);
                    size.height += wanted.height;
                }
                Orientation::Horizontal => {
                    size.width += wanted.width;
                    size.height = size.height.max(wanted.height);
                }
            }
        }

        let paddings = self
            .get(id)
            .map(|widget| widget.props(ctx).margins(PropertyId::Paddings))
            .unwrap_or_default();
        Size::new(
            size.width + paddings.total_horizontal(),
            size.height + paddings.total_vertical(),
        )
    }

    pub(crate) fn layout_stack(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let orientation = self.orientation(&*ctx, id);
        let mut cursor = match orientation {
            Orientation::Vertical => area.y,
            Orientation::Horizontal => area.x,
        };

        let children = self.children(id).to_vec();
        for child in children {
            if self.is_collapsed(&*ctx, child) {
                continue;
            }
            let wanted = self.wanted_size_with_margins(&*ctx, child);
            let slot = match orientation {
                Orientation::Vertical => {
                    let slot = Rect::new(area.x, cursor, area.width, wanted.height);
                    cursor += wanted.height;
                    slot
                }
                Orientation::Horizontal => {
                    let slot = Rect::new(cursor, area.y, wanted.width, area.height);
                    cursor += wanted.width;
                    slot
                }
            };
            self.layout(ctx, child, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bounds, container, fixed, run};
    use crate::context::LocalContext;
    use crate::widget::WidgetTree;
    use farsight_shared::{Margins, Orientation, EnumCode, PropertyId, Rect, Size, Value, Visibility, WidgetType};

    #[test]
    fn test_vertical_stack() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let stack = container(&mut tree, WidgetType::Stack);
        let a = fixed(&mut tree, stack, 10, 20);
        let b = fixed(&mut tree, stack, 30, 5);

        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(stack).unwrap().wanted_size(), Size::new(30, 25));
        let (first, second) = (bounds(&tree, a), bounds(&tree, b));
        assert_eq!((first.y, first.height), (0, 20));
        assert_eq!((second.y, second.height), (20, 5));
    }

    #[test]
    fn test_horizontal_stack_with_paddings_and_collapsed_child() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let stack = container(&mut tree, WidgetType::Stack);
        {
            let widget = tree.get_mut(stack).unwrap();
            widget
                .set_literal(PropertyId::Orientation, Value::Enumeration(Orientation::Horizontal.code()))
                .unwrap();
            widget.set_literal(PropertyId::Paddings, Value::Margins(Margins::uniform(2))).unwrap();
        }
        let a = fixed(&mut tree, stack, 10, 20);
        let gone = fixed(&mut tree, stack, 50, 50);
        let b = fixed(&mut tree, stack, 30, 5);
        tree.get_mut(gone)
            .unwrap()
            .set_literal(PropertyId::Visibility, Value::Enumeration(Visibility::Collapsed.code()))
            .unwrap();

        run(&mut tree, &mut ctx, Rect::new(0, 0, 100, 100));
        assert_eq!(tree.get(stack).unwrap().wanted_size(), Size::new(44, 24));
        assert_eq!(bounds(&tree, a), Rect::new(2, 2, 10, 96));
        assert_eq!(bounds(&tree, b), Rect::new(12, 2, 30, 96));
    }
}
