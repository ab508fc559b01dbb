//! # Pointer Input
//!
//! ## Routing
//!
//! ```text
//! PointerEvent ─► capture holder? ──yes──► that widget
//!                      │ no
//!                      ▼
//!                 hit test (last child first) ─► topmost hit-testable widget
//! ```
//!
//! A widget that takes the capture on press keeps receiving pointer events
//! until it releases it, even outside its bounds. Disabled widgets ignore
//! input. Effects reach the provider through the [`WidgetContext`]: clicks
//! fire event callbacks, value changes go through bound property writes.

use farsight_shared::{Orientation, PropertyId, Value, Visibility, WidgetType};
use tracing::{debug, warn};

use crate::context::WidgetContext;
use crate::layout::actual_visibility;
use crate::paint::{axis, progress, scroll_knobs, SCROLL_KNOB, SLIDER_KNOB};
use crate::widget::{WidgetId, WidgetTree};

/// Scroll bar step for button and track presses, as a share of the range.
const SCROLL_STEP: f32 = 0.05;

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed.
    Down {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// Button released.
    Up {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// Pointer moved.
    Motion {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
    },
    /// Wheel turned.
    Wheel {
        /// X position.
        x: i32,
        /// Y position.
        y: i32,
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
}

impl PointerEvent {
    /// Pointer position.
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        match *self {
            Self::Down { x, y } | Self::Up { x, y } | Self::Motion { x, y } | Self::Wheel { x, y, .. } => (x, y),
        }
    }
}

const fn takes_keyboard_focus(kind: WidgetType) -> bool {
    matches!(
        kind,
        WidgetType::Button | WidgetType::CheckBox | WidgetType::RadioButton | WidgetType::Slider
    )
}

impl WidgetTree {
    /// Topmost hit-testable widget at `(x, y)`.
    #[must_use]
    pub fn hit_test(&self, ctx: &dyn WidgetContext, x: i32, y: i32) -> Option<WidgetId> {
        self.root().and_then(|root| self.hit_test_widget(ctx, root, x, y))
    }

    fn hit_test_widget(&self, ctx: &dyn WidgetContext, id: WidgetId, x: i32, y: i32) -> Option<WidgetId> {
        let widget = self.get(id)?;
        if actual_visibility(widget, ctx) != Visibility::Visible
            || !widget.props(ctx).boolean(PropertyId::HitTestVisible)
            || !widget.actual_bounds.contains(x, y)
        {
            return None;
        }
        widget
            .children
            .iter()
            .rev()
            .find_map(|&child| self.hit_test_widget(ctx, child, x, y))
            .or(Some(id))
    }

    /// Widget that receives pointer input at `(x, y)`: the capture holder
    /// if there is one, else the hit-tested widget.
    #[must_use]
    pub fn mouse_widget(&self, ctx: &dyn WidgetContext, x: i32, y: i32) -> Option<WidgetId> {
        self.mouse_capture().or_else(|| self.hit_test(ctx, x, y))
    }

    /// Routes a pointer event. Returns true if a widget consumed it.
    pub fn dispatch_pointer(&mut self, ctx: &mut dyn WidgetContext, event: PointerEvent) -> bool {
        let (x, y) = event.position();
        let target = self.mouse_widget(&*ctx, x, y);
        match event {
            PointerEvent::Motion { .. } => {
                if self.mouse_capture().is_none() {
                    self.set_mouse_focus(target);
                }
            }
            _ => self.set_mouse_focus(target),
        }

        let Some(id) = target else {
            return false;
        };
        let Some(widget) = self.get(id) else {
            return false;
        };
        let kind = widget.kind();
        if !widget.props(&*ctx).boolean(PropertyId::Enabled) {
            if matches!(event, PointerEvent::Up { .. }) && self.has_mouse_captured(id) {
                self.release_mouse();
            }
            return false;
        }
        if matches!(event, PointerEvent::Up { .. }) && takes_keyboard_focus(kind) {
            self.set_keyboard_focus(Some(id));
        }

        match kind {
            WidgetType::Button | WidgetType::CheckBox | WidgetType::RadioButton => self.clickable_event(ctx, id, event),
            WidgetType::Slider => self.slider_event(ctx, id, event),
            WidgetType::ScrollBar => self.scroll_bar_event(ctx, id, event),
            WidgetType::Tab => self.tab_event(ctx, id, event),
            _ => false,
        }
    }

    fn write_logged(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, property: PropertyId, value: Value) {
        if let Some(widget) = self.get_mut(id) {
            if let Err(e) = widget.write_property(ctx, property, value) {
                warn!("{id} failed to write {property:?}: {e}");
            }
        }
    }

    fn set_pressed(&mut self, id: WidgetId, pressed: bool) {
        if let Some(widget) = self.get_mut(id) {
            widget.state.pressed = pressed;
        }
    }

    fn clickable_event(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, event: PointerEvent) -> bool {
        let Some(bounds) = self.get(id).map(|widget| widget.actual_bounds) else {
            return false;
        };
        match event {
            PointerEvent::Down { .. } => {
                if let Err(e) = self.capture_mouse(id) {
                    warn!("{id} cannot capture the mouse: {e}");
                    return false;
                }
                self.set_pressed(id, true);
                true
            }
            PointerEvent::Motion { x, y } if self.has_mouse_captured(id) => {
                self.set_pressed(id, bounds.contains(x, y));
                true
            }
            PointerEvent::Up { x, y } if self.has_mouse_captured(id) => {
                self.release_mouse();
                let clicked = self.get(id).is_some_and(|widget| widget.state.pressed) && bounds.contains(x, y);
                self.set_pressed(id, false);
                if clicked {
                    self.click(ctx, id);
                }
                true
            }
            _ => false,
        }
    }

    fn click(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId) {
        let Some(widget) = self.get(id) else {
            return;
        };
        match widget.kind() {
            WidgetType::Button => {
                let props = widget.props(&*ctx);
                let (event, name) = (props.event(PropertyId::OnClick), props.name());
                if event.is_null() {
                    debug!("{id} clicked without an onClick event");
                } else {
                    ctx.trigger_event(event, name);
                }
            }
            WidgetType::CheckBox | WidgetType::RadioButton => {
                let checked = widget.props(&*ctx).boolean(PropertyId::IsChecked);
                self.write_logged(ctx, id, PropertyId::IsChecked, Value::Boolean(!checked));
            }
            _ => {}
        }
    }

    fn slider_event(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down { x, y } => {
                if let Err(e) = self.capture_mouse(id) {
                    warn!("{id} cannot capture the mouse: {e}");
                    return false;
                }
                self.set_slider(ctx, id, x, y);
                true
            }
            PointerEvent::Motion { x, y } if self.has_mouse_captured(id) => {
                self.set_slider(ctx, id, x, y);
                true
            }
            PointerEvent::Up { .. } if self.has_mouse_captured(id) => {
                self.release_mouse();
                true
            }
            _ => false,
        }
    }

    fn set_slider(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, x: i32, y: i32) {
        let Some(widget) = self.get(id) else {
            return;
        };
        let props = widget.props(&*ctx);
        let orientation: Orientation = props.enumeration(PropertyId::Orientation);
        let (minimum, maximum) = (props.number(PropertyId::Minimum), props.number(PropertyId::Maximum));
        let (start, length) = axis(widget.actual_bounds, orientation);
        let pointer = match orientation {
            Orientation::Horizontal => x,
            Orientation::Vertical => y,
        };

        let track = length - SLIDER_KNOB - 1;
        if track <= 0 {
            return;
        }
        let position = (pointer - SLIDER_KNOB / 2 - start).clamp(0, track);
        let value = minimum + position as f32 / track as f32 * (maximum - minimum);
        self.write_logged(ctx, id, PropertyId::Value, Value::Number(value));
    }

    fn scroll_bar_event(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, event: PointerEvent) -> bool {
        let Some(widget) = self.get(id) else {
            return false;
        };
        let props = widget.props(&*ctx);
        let orientation: Orientation = props.enumeration(PropertyId::Orientation);
        let value = props.number(PropertyId::Value);
        let (minimum, maximum) = (props.number(PropertyId::Minimum), props.number(PropertyId::Maximum));
        let range = maximum - minimum;
        let bounds = widget.actual_bounds;
        let knobs = scroll_knobs(bounds, orientation, progress(value, minimum, maximum));
        let along = |x: i32, y: i32| match orientation {
            Orientation::Horizontal => x,
            Orientation::Vertical => y,
        };
        let step = |delta: f32| Value::Number((value + delta).clamp(minimum, maximum));

        match event {
            PointerEvent::Wheel { dx, dy, .. } => {
                self.write_logged(ctx, id, PropertyId::Value, step(-((dx + dy) as f32)));
                true
            }
            PointerEvent::Up { .. } => {
                if self.has_mouse_captured(id) {
                    self.release_mouse();
                }
                true
            }
            PointerEvent::Motion { x, y } if self.has_mouse_captured(id) => {
                let (track_start, _) = axis(bounds, orientation);
                let travel = axis(bounds, orientation).1 - 3 * SCROLL_KNOB;
                if travel > 0 {
                    let offset = along(x, y) - (track_start + SCROLL_KNOB) - widget.state.knob_offset;
                    let fraction = offset.clamp(0, travel) as f32 / travel as f32;
                    self.write_logged(ctx, id, PropertyId::Value, Value::Number(minimum + range * fraction));
                }
                true
            }
            PointerEvent::Down { x, y } => {
                let [decrement, knob, increment] = knobs;
                let pointer = along(x, y);
                if decrement.contains(x, y) {
                    self.write_logged(ctx, id, PropertyId::Value, step(-range * SCROLL_STEP));
                } else if increment.contains(x, y) {
                    self.write_logged(ctx, id, PropertyId::Value, step(range * SCROLL_STEP));
                } else if knob.contains(x, y) {
                    let knob_start = axis(knob, orientation).0;
                    if let Err(e) = self.capture_mouse(id) {
                        warn!("{id} cannot capture the mouse: {e}");
                        return false;
                    }
                    if let Some(widget) = self.get_mut(id) {
                        widget.state.knob_offset = pointer - knob_start;
                    }
                } else if bounds.contains(x, y) {
                    let below = pointer < axis(knob, orientation).0;
                    let delta = range * SCROLL_STEP;
                    self.write_logged(ctx, id, PropertyId::Value, step(if below { -delta } else { delta }));
                }
                true
            }
            PointerEvent::Motion { .. } => false,
        }
    }

    fn tab_event(&mut self, ctx: &mut dyn WidgetContext, id: WidgetId, event: PointerEvent) -> bool {
        let PointerEvent::Down { x, y } = event else {
            return false;
        };
        let hit = self
            .get(id)
            .and_then(|widget| widget.state.tab_buttons.iter().position(|button| button.contains(x, y)));
        match hit {
            Some(index) => {
                let index = i32::try_from(index).unwrap_or(i32::MAX);
                self.write_logged(ctx, id, PropertyId::SelectedIndex, Value::Integer(index));
                true
            }
            None => false,
        }
    }
}
