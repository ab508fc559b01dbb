//! Dock: each child but the last takes a slice off one side of the
//! remaining area; the last child fills whatever is left.

use farsight_shared::{DockSite, PropertyId, Rect, Size};

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

impl WidgetTree {
    fn dock_site(&self, ctx: &dyn WidgetContext, id: WidgetId) -> DockSite {
        self.get(id)
            .map(|widget| widget.props(ctx).enumeration(PropertyId::DockSite))
            .unwrap_or_default()
    }

    pub(crate) fn dock_wanted_size(&self, ctx: &dyn WidgetContext, id: WidgetId) -> Size {
        let children = self.children(id);
        let Some((&last, docked)) = children.split_last() else {
            return Size::ZERO;
        };

        let mut size = if self.is_collapsed(ctx, last) {
            Size::ZERO
        } else {
            self.wanted_size_with_margins(ctx, last)
        };
        for &child in docked.iter().rev() {
            if self.is_collapsed(ctx, child) {
                continue;
            }
            let wanted = self.wanted_size_with_margins(ctx, child);
            match self.dock_site(ctx, child) {
                DockSite::Left | DockSite::Right => {
                    size.width += wanted.width;
                    size.height = size.height.max(wanted.height);
                }
                DockSite::Top | DockSite::Bottom => {
                    size.width = size.width.max(wanted.width);
                    size.height += wanted.height;
                }
            }
        }
        size
    }

    pub(crate) fn layout_dock(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let children = self.children(id).to_vec();
        let Some((&last, docked)) = children.split_last() else {
            return;
        };

        let mut remaining = area;
        for &child in docked {
            if self.is_collapsed(&*ctx, child) {
                continue;
            }
            let wanted = self.wanted_size_with_margins(&*ctx, child);
            let width = wanted.width.min(remaining.width);
            let height = wanted.height.min(remaining.height);
            let slice = match self.dock_site(&*ctx, child) {
                DockSite::Top => {
                    let slice = Rect::new(remaining.x, remaining.y, remaining.width, height);
                    remaining.y += height;
                    remaining.height -= height;
                    slice
                }
                DockSite::Bottom => {
                    remaining.height -= height;
                    Rect::new(remaining.x, remaining.bottom(), remaining.width, height)
                }
                DockSite::Left => {
                    let slice = Rect::new(remaining.x, remaining.y, width, remaining.height);
                    remaining.x += width;
                    remaining.width -= width;
                    slice
                }
                DockSite::Right => {
                    remaining.width -= width;
                    Rect::new(remaining.right(), remaining.y, width, remaining.height)
                }
            };
            self.layout(ctx, child, slice);
        }
        self.layout(ctx, last, remaining);
    }
}
