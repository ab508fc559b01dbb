//! # Painting
//!
//! Walks the laid-out tree front to back. Every widget is clipped to its
//! bounds intersected with the parent clip; a widget whose clip is empty
//! paints nothing, and only visible children are visited.

use farsight_shared::{
    constants::TAB_HEADER_HEIGHT, DisplayProgressStyle, ImageScaling, Orientation, PropertyId, Rect, UiFont,
    Visibility, WidgetType,
};

use crate::context::WidgetContext;
use crate::layout::{actual_visibility, picture_placement};
use crate::painter::{Bevel, LineStyle, PaintColor, TextAlign, WidgetPainter};
use crate::widget::{Widget, WidgetId, WidgetTree};

/// Slider knob extent along the track.
pub(crate) const SLIDER_KNOB: i32 = 12;

/// Scroll bar button and knob extent along the track.
pub(crate) const SCROLL_KNOB: i32 = 24;

/// Fraction of `[minimum, maximum]` covered by `value`, `0` for empty ranges.
pub(crate) fn progress(value: f32, minimum: f32, maximum: f32) -> f32 {
    let range = maximum - minimum;
    if range > 0.0 {
        ((value - minimum) / range).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Start and length of `bounds` along `orientation`.
pub(crate) const fn axis(bounds: Rect, orientation: Orientation) -> (i32, i32) {
    match orientation {
        Orientation::Horizontal => (bounds.x, bounds.width),
        Orientation::Vertical => (bounds.y, bounds.height),
    }
}

/// A rectangle spanning `bounds` across `orientation`, at `start` with `length` along it.
pub(crate) const fn along(bounds: Rect, orientation: Orientation, start: i32, length: i32) -> Rect {
    match orientation {
        Orientation::Horizontal => Rect::new(start, bounds.y, length, bounds.height),
        Orientation::Vertical => Rect::new(bounds.x, start, bounds.width, length),
    }
}

/// Scroll bar parts: decrement button, sliding knob, increment button.
pub(crate) fn scroll_knobs(bounds: Rect, orientation: Orientation, fraction: f32) -> [Rect; 3] {
    let (start, length) = axis(bounds, orientation);
    let travel = (length - 3 * SCROLL_KNOB).max(0);
    let offset = (fraction * travel as f32 + 0.5) as i32;
    [
        along(bounds, orientation, start, SCROLL_KNOB),
        along(bounds, orientation, start + SCROLL_KNOB + offset, SCROLL_KNOB),
        along(bounds, orientation, start + length - SCROLL_KNOB, SCROLL_KNOB),
    ]
}

impl WidgetTree {
    /// Paints the whole tree.
    pub fn paint(&self, ctx: &dyn WidgetContext, painter: &mut dyn WidgetPainter) {
        let Some(root) = self.root() else {
            return;
        };
        if self
            .get(root)
            .is_some_and(|widget| actual_visibility(widget, ctx) == Visibility::Visible)
        {
            self.paint_subtree(ctx, painter, root);
        }
    }

    fn paint_subtree(&self, ctx: &dyn WidgetContext, painter: &mut dyn WidgetPainter, id: WidgetId) {
        let Some(widget) = self.get(id) else {
            return;
        };
        let clip = painter.push_clip_rect(widget.actual_bounds);
        if !clip.is_empty() {
            self.paint_widget(ctx, painter, widget);
            for &child in &widget.children {
                let visible = self
                    .get(child)
                    .is_some_and(|child| actual_visibility(child, ctx) == Visibility::Visible);
                if visible {
                    self.paint_subtree(ctx, painter, child);
                }
            }
        }
        painter.pop_clip_rect();
    }

    fn paint_widget(&self, ctx: &dyn WidgetContext, painter: &mut dyn WidgetPainter, widget: &Widget) {
        let bounds = widget.actual_bounds;
        let props = widget.props(ctx);
        let focused = self.keyboard_focus() == Some(widget.id());

        match widget.kind() {
            WidgetType::Button => {
                painter.fill_rect(bounds, PaintColor::Background);
                let bevel = if widget.state.pressed {
                    Bevel::ButtonPressed
                } else if focused {
                    Bevel::ButtonActive
                } else {
                    Bevel::ButtonDefault
                };
                painter.draw_rect(bounds, bevel);
            }
            WidgetType::Label => {
                let font: UiFont = props.enumeration(PropertyId::FontFamily);
                painter.draw_string(&props.string(PropertyId::Text), bounds, font, TextAlign::Left);
            }
            WidgetType::Panel => {
                painter.fill_rect(bounds, PaintColor::Background);
                painter.draw_rect(bounds, Bevel::Crease);
            }
            WidgetType::Separator => {
                if bounds.width > bounds.height {
                    painter.draw_hline(bounds.x, bounds.y + bounds.height / 2, bounds.width, LineStyle::Edge);
                } else {
                    painter.draw_vline(bounds.x + bounds.width / 2, bounds.y, bounds.height, LineStyle::Edge);
                }
            }
            WidgetType::CheckBox | WidgetType::RadioButton => {
                painter.fill_rect(bounds, PaintColor::Background);
                let bevel = if props.boolean(PropertyId::IsChecked) {
                    Bevel::ButtonPressed
                } else {
                    Bevel::ButtonDefault
                };
                painter.draw_rect(bounds, bevel);
            }
            WidgetType::ProgressBar => {
                let value = props.number(PropertyId::Value);
                let minimum = props.number(PropertyId::Minimum);
                let maximum = props.number(PropertyId::Maximum);
                let fraction = progress(value, minimum, maximum);

                painter.fill_rect(bounds, PaintColor::InputField);
                let filled = (fraction * (bounds.width - 2) as f32 + 0.5) as i32;
                painter.fill_rect(
                    Rect::new(bounds.x + 1, bounds.y + 1, filled, bounds.height - 2),
                    PaintColor::Highlight,
                );
                let caption = match props.enumeration(PropertyId::DisplayProgressStyle) {
                    DisplayProgressStyle::Percent => Some(format!("{}%", (100.0 * fraction + 0.5) as i32)),
                    DisplayProgressStyle::Absolute => Some(format!("{}", (value + 0.5) as i32)),
                    DisplayProgressStyle::None => None,
                };
                if let Some(caption) = caption {
                    painter.draw_string(&caption, bounds, UiFont::Sans, TextAlign::Center);
                }
                painter.draw_rect(bounds, Bevel::InputField);
            }
            WidgetType::Slider => {
                let orientation: Orientation = props.enumeration(PropertyId::Orientation);
                let fraction = progress(
                    props.number(PropertyId::Value),
                    props.number(PropertyId::Minimum),
                    props.number(PropertyId::Maximum),
                );
                let (start, length) = axis(bounds, orientation);
                match orientation {
                    Orientation::Horizontal => {
                        painter.draw_hline(bounds.x, bounds.y + bounds.height / 2, bounds.width, LineStyle::Crease);
                    }
                    Orientation::Vertical => {
                        painter.draw_vline(bounds.x + bounds.width / 2, bounds.y, bounds.height, LineStyle::Crease);
                    }
                }
                let offset = (((length - SLIDER_KNOB - 1) as f32) * fraction + 0.5) as i32;
                let knob = along(bounds, orientation, start + offset, SLIDER_KNOB);
                painter.fill_rect(knob, PaintColor::Background);
                painter.draw_rect(knob, if focused { Bevel::ButtonActive } else { Bevel::ButtonDefault });
            }
            WidgetType::ScrollBar => {
                let orientation: Orientation = props.enumeration(PropertyId::Orientation);
                let fraction = progress(
                    props.number(PropertyId::Value),
                    props.number(PropertyId::Minimum),
                    props.number(PropertyId::Maximum),
                );
                painter.fill_rect(bounds, PaintColor::Background);
                for knob in scroll_knobs(bounds, orientation, fraction) {
                    painter.fill_rect(knob, PaintColor::Background);
                    painter.draw_rect(knob, Bevel::ButtonDefault);
                }
            }
            WidgetType::Picture => {
                let image = props.resource(PropertyId::Image);
                let Some(bitmap) = ctx.resource(image).and_then(|resource| resource.as_bitmap()) else {
                    return;
                };
                let scaling: ImageScaling = props.enumeration(PropertyId::ImageScaling);
                let (target, source) = picture_placement(bounds, bitmap.size, scaling);
                painter.draw_icon(target, image, source);
            }
            WidgetType::Tab => self.paint_tab(ctx, painter, widget),
            _ => {}
        }
    }

    fn paint_tab(&self, ctx: &dyn WidgetContext, painter: &mut dyn WidgetPainter, widget: &Widget) {
        let bounds = widget.actual_bounds;
        let selected = self.selected_tab(ctx, widget.id());
        painter.fill_rect(bounds, PaintColor::Background);
        painter.fill_rect(
            Rect::new(bounds.x, bounds.y, bounds.width, TAB_HEADER_HEIGHT),
            PaintColor::InputField,
        );

        for (index, (&button, &child)) in widget.state.tab_buttons.iter().zip(&widget.children).enumerate() {
            let Some(page) = self.get(child) else {
                continue;
            };
            // Pages the user hid get no button; pages the tab hid do.
            if !page.hidden_by_layout && actual_visibility(page, ctx) != Visibility::Visible {
                continue;
            }
            painter.fill_rect(button, PaintColor::Background);
            let title = page.props(ctx).string(PropertyId::TabTitle);
            painter.draw_string(&title, button, UiFont::Sans, TextAlign::Center);
            painter.draw_rect(button, if index == selected { Bevel::Sunken } else { Bevel::Crease });
        }

        let content = Rect::new(
            bounds.x,
            bounds.y + TAB_HEADER_HEIGHT,
            bounds.width,
            (bounds.height - TAB_HEADER_HEIGHT).max(0),
        );
        painter.draw_rect(content, Bevel::Sunken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LocalContext;
    use crate::painter::{FixedMetrics, PaintCommand, RecordingPainter};
    use crate::serialize::LayoutWriter;
    use farsight_shared::{EventId, ResourceId, Size, Value};

    fn painted(tree: &mut WidgetTree, ctx: &mut LocalContext) -> Vec<PaintCommand> {
        let screen = Rect::new(0, 0, 200, 100);
        tree.update_layout(ctx, &FixedMetrics::default(), screen);
        let mut painter = RecordingPainter::new(screen);
        painter.begin_frame();
        tree.paint(ctx, &mut painter);
        assert_eq!(painter.clip_depth(), 0);
        painter.take_commands()
    }

    #[test]
    fn test_button_with_label() {
        let mut layout = LayoutWriter::new();
        layout
            .begin(WidgetType::Button)
            .property(PropertyId::OnClick, Value::Event(EventId(1)))
            .begin(WidgetType::Label)
            .property(PropertyId::Text, "Click me!");
        let mut tree = WidgetTree::new();
        let root = tree.load_layout(&layout.finish(), ResourceId(1)).unwrap();
        tree.set_root(Some(root));
        let mut ctx = LocalContext::new();

        let commands = painted(&mut tree, &mut ctx);
        let button = tree.get(root).unwrap().actual_bounds();
        assert_eq!(
            commands[..3],
            [
                PaintCommand::PushClip { bounds: button },
                PaintCommand::Fill {
                    rect: button,
                    color: PaintColor::Background
                },
                PaintCommand::Frame {
                    rect: button,
                    bevel: Bevel::ButtonDefault
                },
            ]
        );
        assert!(commands
            .iter()
            .any(|command| matches!(command, PaintCommand::Text { text, .. } if text == "Click me!")));
        assert_eq!(commands.last(), Some(&PaintCommand::PopClip));
    }

    #[test]
    fn test_hidden_children_not_painted() {
        let mut tree = WidgetTree::new();
        let stack = tree.create(WidgetType::Stack);
        let shown = tree.create(WidgetType::Panel);
        let hidden = tree.create(WidgetType::Panel);
        tree.get_mut(hidden)
            .unwrap()
            .set_literal(PropertyId::Visibility, Value::Enumeration(Visibility::Hidden as u8))
            .unwrap();
        for panel in [shown, hidden] {
            tree.get_mut(panel)
                .unwrap()
                .set_literal(PropertyId::SizeHint, Value::Size(Size::new(10, 10)))
                .unwrap();
            tree.append_child(stack, panel);
        }
        tree.set_root(Some(stack));
        let mut ctx = LocalContext::new();

        let commands = painted(&mut tree, &mut ctx);
        let frames = commands
            .iter()
            .filter(|command| matches!(command, PaintCommand::Frame { bevel: Bevel::Crease, .. }))
            .count();
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_progress_bar_caption() {
        let mut tree = WidgetTree::new();
        let bar = tree.create(WidgetType::ProgressBar);
        tree.get_mut(bar)
            .unwrap()
            .set_literal(PropertyId::Value, Value::Number(42.4))
            .unwrap();
        tree.set_root(Some(bar));
        let mut ctx = LocalContext::new();

        let commands = painted(&mut tree, &mut ctx);
        let bounds = tree.get(bar).unwrap().actual_bounds();
        assert!(commands.contains(&PaintCommand::Fill {
            rect: Rect::new(bounds.x + 1, bounds.y + 1, (0.424 * (bounds.width - 2) as f32 + 0.5) as i32, bounds.height - 2),
            color: PaintColor::Highlight,
        }));
        assert!(commands
            .iter()
            .any(|command| matches!(command, PaintCommand::Text { text, .. } if text == "42%")));
    }

    #[test]
    fn test_scroll_knobs() {
        let bounds = Rect::new(0, 0, 172, 24);
        let knobs = scroll_knobs(bounds, Orientation::Horizontal, 0.5);
        assert_eq!(knobs[0], Rect::new(0, 0, 24, 24));
        assert_eq!(knobs[1], Rect::new(74, 0, 24, 24));
        assert_eq!(knobs[2], Rect::new(148, 0, 24, 24));
        assert_eq!(progress(5.0, 10.0, 10.0), 0.0);
    }
}
