//! # Painter Capability
//!
//! Widgets draw through [`WidgetPainter`] and never touch pixels. A backend
//! (software rasterizer, GPU, terminal) implements the trait; the engine
//! only decides what goes where.
//!
//! [`RecordingPainter`] is the reference backend: it records every call as
//! a [`PaintCommand`] and measures text with a fixed cell size.

use farsight_shared::{Rect, ResourceId, Size, UiFont};

/// Semantic fill colors. The backend picks the actual palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintColor {
    /// Window and widget background.
    Background,
    /// Text entry and progress track background.
    InputField,
    /// Selection and progress fill.
    Highlight,
}

/// Frame styles for [`WidgetPainter::draw_rect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bevel {
    /// Thin outline.
    Edge,
    /// Etched groove.
    Crease,
    /// Lowered area.
    Sunken,
    /// Raised area.
    Raised,
    /// Frame of an input field.
    InputField,
    /// Idle button.
    ButtonDefault,
    /// Held button.
    ButtonPressed,
    /// Focused button.
    ButtonActive,
}

/// Styles for straight lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    /// Single line.
    Edge,
    /// Etched double line.
    Crease,
}

/// Horizontal text placement inside its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Text measurement, needed by the wanted-size pass.
pub trait TextMeasure {
    /// Size of `text` in `font`, wrapped to `max_width` if given.
    fn measure_string(&self, text: &str, font: UiFont, max_width: Option<i32>) -> Size;
}

/// Drawing surface consumed by widgets.
pub trait WidgetPainter: TextMeasure {
    /// Fills a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: PaintColor);

    /// Frames a rectangle.
    fn draw_rect(&mut self, rect: Rect, bevel: Bevel);

    /// Draws a horizontal line starting at `(x, y)`.
    fn draw_hline(&mut self, x: i32, y: i32, width: i32, style: LineStyle);

    /// Draws a vertical line starting at `(x, y)`.
    fn draw_vline(&mut self, x: i32, y: i32, height: i32, style: LineStyle);

    /// Draws a bitmap resource into `rect`, optionally only its `source` part.
    fn draw_icon(&mut self, rect: Rect, image: ResourceId, source: Option<Rect>);

    /// Draws text inside `rect`.
    fn draw_string(&mut self, text: &str, rect: Rect, font: UiFont, align: TextAlign);

    /// Narrows the clip to `rect` and returns the resulting clip.
    fn push_clip_rect(&mut self, rect: Rect) -> Rect;

    /// Restores the clip active before the last push.
    fn pop_clip_rect(&mut self);

    /// The active clip.
    fn clip_rect(&self) -> Rect;
}

/// Monospaced text metrics: every character occupies one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMetrics {
    /// Cell width in pixels.
    pub char_width: i32,
    /// Line height in pixels.
    pub line_height: i32,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
        }
    }
}

impl TextMeasure for FixedMetrics {
    fn measure_string(&self, text: &str, _font: UiFont, max_width: Option<i32>) -> Size {
        let width = text.chars().count() as i32 * self.char_width;
        match max_width {
            Some(max) if max > 0 && width > max => {
                let per_line = (max / self.char_width).max(1) * self.char_width;
                let lines = (width + per_line - 1) / per_line;
                Size::new(per_line, lines * self.line_height)
            }
            _ => Size::new(width, self.line_height),
        }
    }
}

/// One recorded painter call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// [`WidgetPainter::fill_rect`].
    Fill {
        /// Area.
        rect: Rect,
        /// Color.
        color: PaintColor,
    },
    /// [`WidgetPainter::draw_rect`].
    Frame {
        /// Area.
        rect: Rect,
        /// Style.
        bevel: Bevel,
    },
    /// [`WidgetPainter::draw_hline`].
    HLine {
        /// Start X.
        x: i32,
        /// Y.
        y: i32,
        /// Length.
        width: i32,
        /// Style.
        style: LineStyle,
    },
    /// [`WidgetPainter::draw_vline`].
    VLine {
        /// X.
        x: i32,
        /// Start Y.
        y: i32,
        /// Length.
        height: i32,
        /// Style.
        style: LineStyle,
    },
    /// [`WidgetPainter::draw_icon`].
    Icon {
        /// Target area.
        rect: Rect,
        /// Bitmap resource.
        image: ResourceId,
        /// Source area inside the bitmap.
        source: Option<Rect>,
    },
    /// [`WidgetPainter::draw_string`].
    Text {
        /// Text content.
        text: String,
        /// Target area.
        rect: Rect,
        /// Font.
        font: UiFont,
        /// Alignment.
        align: TextAlign,
    },
    /// Scissor rect (clip children).
    PushClip {
        /// Effective clip after intersection.
        bounds: Rect,
    },
    /// Pop scissor rect.
    PopClip,
}

/// Painter that records commands instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingPainter {
    screen: Rect,
    metrics: FixedMetrics,
    clip_stack: Vec<Rect>,
    commands: Vec<PaintCommand>,
}

impl RecordingPainter {
    /// Creates a painter for a screen of the given bounds.
    #[must_use]
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            metrics: FixedMetrics::default(),
            clip_stack: Vec::with_capacity(16),
            commands: Vec::with_capacity(256),
        }
    }

    /// Uses different text metrics.
    #[must_use]
    pub const fn with_metrics(mut self, metrics: FixedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Begins a new frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.clip_stack.clear();
    }

    /// Commands recorded since the frame began.
    #[must_use]
    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Takes the recorded commands.
    pub fn take_commands(&mut self) -> Vec<PaintCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Returns the total command count.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Current clip nesting depth.
    #[must_use]
    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }
}

impl TextMeasure for RecordingPainter {
    fn measure_string(&self, text: &str, font: UiFont, max_width: Option<i32>) -> Size {
        self.metrics.measure_string(text, font, max_width)
    }
}

impl WidgetPainter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: PaintColor) {
        self.commands.push(PaintCommand::Fill { rect, color });
    }

    fn draw_rect(&mut self, rect: Rect, bevel: Bevel) {
        self.commands.push(PaintCommand::Frame { rect, bevel });
    }

    fn draw_hline(&mut self, x: i32, y: i32, width: i32, style: LineStyle) {
        self.commands.push(PaintCommand::HLine { x, y, width, style });
    }

    fn draw_vline(&mut self, x: i32, y: i32, height: i32, style: LineStyle) {
        self.commands.push(PaintCommand::VLine { x, y, height, style });
    }

    fn draw_icon(&mut self, rect: Rect, image: ResourceId, source: Option<Rect>) {
        self.commands.push(PaintCommand::Icon { rect, image, source });
    }

    fn draw_string(&mut self, text: &str, rect: Rect, font: UiFont, align: TextAlign) {
        self.commands.push(PaintCommand::Text {
            text: text.to_owned(),
            rect,
            font,
            align,
        });
    }

    fn push_clip_rect(&mut self, rect: Rect) -> Rect {
        let bounds = self.clip_rect().intersect(&rect);
        self.clip_stack.push(bounds);
        self.commands.push(PaintCommand::PushClip { bounds });
        bounds
    }

    fn pop_clip_rect(&mut self) {
        self.clip_stack.pop();
        self.commands.push(PaintCommand::PopClip);
    }

    fn clip_rect(&self) -> Rect {
        self.clip_stack.last().copied().unwrap_or(self.screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_metrics() {
        let metrics = FixedMetrics::default();
        assert_eq!(metrics.measure_string("Click me!", UiFont::Sans, None), Size::new(72, 16));
        assert_eq!(metrics.measure_string("", UiFont::Sans, None), Size::new(0, 16));
        assert_eq!(metrics.measure_string("abcdefghij", UiFont::Serif, Some(40)), Size::new(40, 32));
    }

    #[test]
    fn test_clip_stack() {
        let mut painter = RecordingPainter::new(Rect::new(0, 0, 100, 100));
        painter.begin_frame();

        let clip = painter.push_clip_rect(Rect::new(50, 50, 100, 100));
        assert_eq!(clip, Rect::new(50, 50, 50, 50));
        assert_eq!(painter.push_clip_rect(Rect::new(0, 0, 10, 10)).is_empty(), true);
        assert_eq!(painter.clip_depth(), 2);

        painter.pop_clip_rect();
        assert_eq!(painter.clip_rect(), clip);
        painter.pop_clip_rect();
        assert_eq!(painter.clip_rect(), Rect::new(0, 0, 100, 100));
        assert_eq!(painter.command_count(), 4);
    }
}
