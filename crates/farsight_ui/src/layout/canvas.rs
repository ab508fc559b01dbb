//! Canvas: absolute placement at each child's `left`/`top`.

use farsight_shared::{PropertyId, Rect, Size};

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

impl WidgetTree {
    fn canvas_offset(&self, ctx: &dyn WidgetContext, id: WidgetId) -> (i32, i32) {
        self.get(id).map_or((0, 0), |widget| {
            let props = widget.props(ctx);
            (props.integer(PropertyId::Left), props.integer(PropertyId::Top))
        })
    }

    pub(crate) fn canvas_wanted_size(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        self.children(id)
            .iter()
            .filter(|&&child| !self.is_user_collapsed(ctx, child))
            .fold(Size::ZERO, |size, &child| {
                let (left, top) = self.canvas_offset(ctx, child);
                let wanted = self.wanted_size_with_margins(ctx, child);
                size.max(Size::new(left + wanted.width, top + wanted.height))
            })
    }

    pub(crate) fn layout_canvas(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let children = self.children(id).to_vec();
        for child in children {
            if self.is_user_collapsed(&*ctx, child) {
                continue;
            }
            let (left, top) = self.canvas_offset(&*ctx, child);
            let wanted = self.wanted_size_with_margins(&*ctx, child);
            let bounds = Rect::new(area.x + left, area.y + top, wanted.width, wanted.height);
            self.layout(ctx, child, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bounds, container, fixed, run};
    use crate::context::LocalContext;
    use crate::widget::WidgetTree;
    use farsight_shared::{PropertyId, Rect, Size, Value, WidgetType};

    #[test]
    fn test_canvas_offsets() {
        let mut ctx = LocalContext::new();
        let mut tree = WidgetTree::new();
        let canvas = container(&mut tree, WidgetType::Canvas);
        let a = fixed(&mut tree, canvas, 10, 10);
        let b = fixed(&mut tree, canvas, 20, 5);
        {
            let widget = tree.get_mut(a).unwrap();
            widget.set_literal(PropertyId::Left, Value::Integer(50)).unwrap();
            widget.set_literal(PropertyId::Top, Value::Integer(5)).unwrap();
        }
        tree.get_mut(b).unwrap().set_literal(PropertyId::Top, Value::Integer(40)).unwrap();

        run(&mut tree, &mut ctx, Rect::new(10, 10, 200, 200));
        assert_eq!(tree.get(canvas).unwrap().wanted_size(), Size::new(60, 45));
        assert_eq!(bounds(&tree, a), Rect::new(60, 15, 10, 10));
        assert_eq!(bounds(&tree, b), Rect::new(10, 50, 20, 5));
    }
}
