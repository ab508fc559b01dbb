//! Flow: children left to right, wrapping into new lines. Children below
//! the bottom edge are hidden.

use farsight_shared::Rect;

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

impl WidgetTree {
    #[allow(unused_assignments)]
    pub(crate) fn layout_flow(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let children = self.children(id).to_vec();
        let (mut x, mut y) = (area.x, area.y);
        let mut line_height = 0;
        let mut line_start = true;

        let mut index = 0;
        while index < children.len() {
            let child = children[index];
            self.set_hidden_by_layout(child, false);
            if self.is_user_collapsed(&*ctx, child) {
                index += 1;
                continue;
            }

            let wanted = self.wanted_size_with_margins(&*ctx, child);
            if !line_start && x + wanted.width >= area.right() {
                x = area.x;
                y += line_height;
                line_height = 0;
                line_start = true;
                if y >= area.bottom() {
                    break;
                }
            }

            self.layout(ctx, child, Rect::new(x, y, wanted.width, wanted.height));
            x += wanted.width;
            line_height = line_height.max(wanted.height);
            line_start = false;
            index += 1;

            if x >= area.right() {
                x = area.x;
                y += line_height;
                line_height = 0;
                line_start = true;
                if y >= area.bottom() {
                    break;
                }
            }
        }

        for &child in &children[index..] {
            self.set_hidden_by_layout(child, true);
        }
    }
}
