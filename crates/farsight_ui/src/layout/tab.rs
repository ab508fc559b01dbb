//! Tab: a header band with one button per child above a content area that
//! shows only the selected child.

use farsight_shared::{constants::TAB_HEADER_HEIGHT, PropertyId, Rect, Size, UiFont, Value, Visibility};
use tracing::warn;

use crate::context::WidgetContext;
use crate::painter::TextMeasure;
use crate::widget::{WidgetId, WidgetTree};

/// Horizontal space around a tab title.
const TAB_TITLE_PADDING: i32 = 8;

impl WidgetTree {
    pub(crate) fn tab_wanted_size(&mut self, ctx: &dyn WidgetContext, metrics: &dyn TextMeasure, id: WidgetId) -> Size {
        let children = self.children(id).to_vec();
        let mut size = Size::ZERO;
        let mut buttons = Vec::with_capacity(children.len());
        for &child in &children {
            size = size.max(self.wanted_size_with_margins(ctx, child));
            let title = self
                .get(child)
                .map(|widget| widget.props(ctx).string(PropertyId::TabTitle))
                .unwrap_or_default();
            let text = metrics.measure_string(&title, UiFont::Sans, None);
            buttons.push(Rect::new(0, 0, text.width + TAB_TITLE_PADDING, TAB_HEADER_HEIGHT));
        }
        if let Some(widget) = self.get_mut(id) {
            widget.state.tab_buttons = buttons;
        }
        size.height += TAB_HEADER_HEIGHT;
        size
    }

    /// Selected tab index, clamped to the existing children.
    pub(crate) fn selected_tab(&self, ctx: &dyn WidgetContext, id: WidgetId) -> usize {
        let count = self.children(id).len();
        let selected = self
            .get(id)
            .map_or(0, |widget| widget.props(ctx).integer(PropertyId::SelectedIndex));
        usize::try_from(selected).unwrap_or(0).min(count.saturating_sub(1))
    }

    pub(crate) fn layout_tab(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, area: Rect) {
        let children = self.children(id).to_vec();
        let selected = self.selected_tab(&*ctx, id);
        if !children.is_empty() {
            let current = self
                .get(id)
                .map_or(0, |widget| widget.props(&*ctx).integer(PropertyId::SelectedIndex));
            let clamped = i32::try_from(selected).unwrap_or(0);
            if current != clamped {
                if let Some(widget) = self.get_mut(id) {
                    if let Err(e) = widget.write_property(ctx, PropertyId::SelectedIndex, Value::Integer(clamped)) {
                        warn!("{id} cannot clamp selected tab: {e}");
                    }
                }
            }
        }

        let content = Rect::new(
            area.x,
            area.y + TAB_HEADER_HEIGHT,
            area.width,
            (area.height - TAB_HEADER_HEIGHT).max(0),
        );
        for (index, &child) in children.iter().enumerate() {
            let visible = self
                .get(child)
                .is_some_and(|widget| widget.props(&*ctx).visibility() == Visibility::Visible);
            self.set_hidden_by_layout(child, visible && index != selected);
            self.layout(ctx, child, content);
        }

        if let Some(widget) = self.get_mut(id) {
            let mut x = area.x;
            for button in &mut widget.state.tab_buttons {
                button.x = x;
                button.y = area.y;
                x += button.width;
            }
        }
    }
}
