//! Protocol enumerations.
//!
//! `UiType` tags every value on the wire, `WidgetType` and `PropertyId`
//! drive the layout resource format. All enumeration-typed properties share
//! one code space, so `Visibility::Collapsed` and `HAlignment::Left` never
//! collide.

use serde::{Deserialize, Serialize};

/// Type tag of a [`Value`](crate::Value).
///
/// The discriminant equals the index of the matching `Value` variant.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiType {
    /// No value.
    Invalid = 0,
    /// Signed 32-bit integer.
    Integer = 1,
    /// 32-bit float.
    Number = 2,
    /// UTF-8 string.
    String = 3,
    /// Enumeration code.
    Enumeration = 4,
    /// Four-sided spacing.
    Margins = 5,
    /// RGBA color.
    Color = 6,
    /// Width/height.
    Size = 7,
    /// X/Y point.
    Point = 8,
    /// Resource handle.
    Resource = 9,
    /// Boolean.
    Boolean = 10,
    /// Grid row/column definitions.
    SizeList = 11,
    /// Object reference.
    Object = 12,
    /// List of object references.
    ObjectList = 13,
    /// Callback handle.
    Event = 14,
}

impl UiType {
    /// Decodes a type tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Invalid,
            1 => Self::Integer,
            2 => Self::Number,
            3 => Self::String,
            4 => Self::Enumeration,
            5 => Self::Margins,
            6 => Self::Color,
            7 => Self::Size,
            8 => Self::Point,
            9 => Self::Resource,
            10 => Self::Boolean,
            11 => Self::SizeList,
            12 => Self::Object,
            13 => Self::ObjectList,
            14 => Self::Event,
            _ => return None,
        })
    }

    /// Human-readable name, used in log lines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Enumeration => "enumeration",
            Self::Margins => "margins",
            Self::Color => "color",
            Self::Size => "size",
            Self::Point => "point",
            Self::Resource => "resource",
            Self::Boolean => "boolean",
            Self::SizeList => "sizelist",
            Self::Object => "object",
            Self::ObjectList => "objectlist",
            Self::Event => "event",
        }
    }
}

impl std::fmt::Display for UiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Widget kinds as encoded in layout resources. `0` terminates a child list.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    /// Clickable button.
    Button = 1,
    /// Static text.
    Label = 2,
    /// Drop-down selector.
    ComboBox = 3,
    /// Hierarchical list.
    TreeView = 5,
    /// Flat list.
    ListBox = 7,
    /// Bitmap display.
    Picture = 9,
    /// Text input.
    TextBox = 10,
    /// Check box.
    CheckBox = 11,
    /// Radio button.
    RadioButton = 12,
    /// Scrollable area.
    ScrollView = 13,
    /// Scroll bar.
    ScrollBar = 14,
    /// Value slider.
    Slider = 15,
    /// Progress indicator.
    ProgressBar = 16,
    /// Numeric spinner.
    SpinEdit = 17,
    /// Separator line.
    Separator = 18,
    /// Empty space.
    Spacer = 19,
    /// Framed panel.
    Panel = 20,
    /// Invisible grouping container.
    Container = 21,
    /// Tabbed container.
    Tab = 250,
    /// Absolute positioning container.
    Canvas = 251,
    /// Wrapping container.
    Flow = 252,
    /// Row/column container.
    Grid = 253,
    /// Docking container.
    Dock = 254,
    /// Sequential container.
    Stack = 255,
}

impl WidgetType {
    /// Decodes a widget type code. `0` and unknown codes yield `None`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Button,
            2 => Self::Label,
            3 => Self::ComboBox,
            5 => Self::TreeView,
            7 => Self::ListBox,
            9 => Self::Picture,
            10 => Self::TextBox,
            11 => Self::CheckBox,
            12 => Self::RadioButton,
            13 => Self::ScrollView,
            14 => Self::ScrollBar,
            15 => Self::Slider,
            16 => Self::ProgressBar,
            17 => Self::SpinEdit,
            18 => Self::Separator,
            19 => Self::Spacer,
            20 => Self::Panel,
            21 => Self::Container,
            250 => Self::Tab,
            251 => Self::Canvas,
            252 => Self::Flow,
            253 => Self::Grid,
            254 => Self::Dock,
            255 => Self::Stack,
            _ => return None,
        })
    }
}

/// Widget property identifiers as encoded in layout resources.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyId {
    /// Horizontal alignment in the parent slot.
    HorizontalAlignment = 1,
    /// Vertical alignment in the parent slot.
    VerticalAlignment = 2,
    /// Outer spacing.
    Margins = 3,
    /// Inner spacing.
    Paddings = 4,
    /// Side a dock child attaches to.
    DockSite = 6,
    /// User visibility.
    Visibility = 7,
    /// Minimum wanted size.
    SizeHint = 8,
    /// Font family.
    FontFamily = 9,
    /// Text content.
    Text = 10,
    /// Range minimum.
    Minimum = 11,
    /// Range maximum.
    Maximum = 12,
    /// Current value.
    Value = 13,
    /// Progress caption style.
    DisplayProgressStyle = 14,
    /// Check state.
    IsChecked = 15,
    /// Title shown in the tab header.
    TabTitle = 16,
    /// Selected tab.
    SelectedIndex = 17,
    /// Grid column definitions.
    Columns = 18,
    /// Grid row definitions.
    Rows = 19,
    /// Canvas X offset.
    Left = 20,
    /// Canvas Y offset.
    Top = 21,
    /// Input enabled.
    Enabled = 22,
    /// Picture scaling mode.
    ImageScaling = 23,
    /// Picture bitmap.
    Image = 24,
    /// Object the widget binds against.
    BindingContext = 25,
    /// List driving repeated children.
    ChildSource = 26,
    /// Layout resource used for repeated children.
    ChildTemplate = 27,
    /// Participates in hit testing.
    HitTestVisible = 29,
    /// Click callback.
    OnClick = 30,
    /// Horizontal or vertical.
    Orientation = 31,
    /// Widget name reported with events.
    Name = 32,
}

impl PropertyId {
    /// Every property, in code order.
    pub const ALL: [Self; 30] = [
        Self::HorizontalAlignment,
        Self::VerticalAlignment,
        Self::Margins,
        Self::Paddings,
        Self::DockSite,
        Self::Visibility,
        Self::SizeHint,
        Self::FontFamily,
        Self::Text,
        Self::Minimum,
        Self::Maximum,
        Self::Value,
        Self::DisplayProgressStyle,
        Self::IsChecked,
        Self::TabTitle,
        Self::SelectedIndex,
        Self::Columns,
        Self::Rows,
        Self::Left,
        Self::Top,
        Self::Enabled,
        Self::ImageScaling,
        Self::Image,
        Self::BindingContext,
        Self::ChildSource,
        Self::ChildTemplate,
        Self::HitTestVisible,
        Self::OnClick,
        Self::Orientation,
        Self::Name,
    ];

    /// Decodes a property id. Unknown ids yield `None`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::HorizontalAlignment,
            2 => Self::VerticalAlignment,
            3 => Self::Margins,
            4 => Self::Paddings,
            6 => Self::DockSite,
            7 => Self::Visibility,
            8 => Self::SizeHint,
            9 => Self::FontFamily,
            10 => Self::Text,
            11 => Self::Minimum,
            12 => Self::Maximum,
            13 => Self::Value,
            14 => Self::DisplayProgressStyle,
            15 => Self::IsChecked,
            16 => Self::TabTitle,
            17 => Self::SelectedIndex,
            18 => Self::Columns,
            19 => Self::Rows,
            20 => Self::Left,
            21 => Self::Top,
            22 => Self::Enabled,
            23 => Self::ImageScaling,
            24 => Self::Image,
            25 => Self::BindingContext,
            26 => Self::ChildSource,
            27 => Self::ChildTemplate,
            29 => Self::HitTestVisible,
            30 => Self::OnClick,
            31 => Self::Orientation,
            32 => Self::Name,
            _ => return None,
        })
    }

    /// The statically known value type of this property.
    #[must_use]
    pub const fn value_type(self) -> UiType {
        match self {
            Self::HorizontalAlignment
            | Self::VerticalAlignment
            | Self::DockSite
            | Self::Visibility
            | Self::FontFamily
            | Self::DisplayProgressStyle
            | Self::ImageScaling
            | Self::Orientation => UiType::Enumeration,
            Self::Margins | Self::Paddings => UiType::Margins,
            Self::SizeHint => UiType::Size,
            Self::Text | Self::TabTitle => UiType::String,
            Self::Minimum | Self::Maximum | Self::Value => UiType::Number,
            Self::IsChecked | Self::Enabled | Self::HitTestVisible => UiType::Boolean,
            Self::SelectedIndex | Self::Left | Self::Top | Self::Name => UiType::Integer,
            Self::Columns | Self::Rows => UiType::SizeList,
            Self::Image | Self::ChildTemplate => UiType::Resource,
            Self::BindingContext => UiType::Object,
            Self::ChildSource => UiType::ObjectList,
            Self::OnClick => UiType::Event,
        }
    }
}

/// An enumeration whose variants live in the shared code space.
pub trait EnumCode: Sized + Copy {
    /// Decodes a code. Codes outside this enumeration yield `None`.
    fn from_code(code: u8) -> Option<Self>;
    /// Encodes the variant.
    fn code(self) -> u8;
}

macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident, default = $default:ident, { $($(#[$vmeta:meta])* $variant:ident = $code:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl EnumCode for $name {
            fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn code(self) -> u8 {
                self as u8
            }
        }
    };
}

code_enum!(
    /// Horizontal placement inside the available slot.
    HAlignment, default = Stretch, {
        /// Fill the slot.
        Stretch = 7,
        /// Anchor at the left edge.
        Left = 1,
        /// Center.
        Center = 2,
        /// Anchor at the right edge.
        Right = 3,
    }
);

code_enum!(
    /// Vertical placement inside the available slot.
    VAlignment, default = Stretch, {
        /// Fill the slot.
        Stretch = 7,
        /// Anchor at the top edge.
        Top = 4,
        /// Center.
        Middle = 5,
        /// Anchor at the bottom edge.
        Bottom = 6,
    }
);

code_enum!(
    /// Side of the remaining area a dock child consumes.
    DockSite, default = Top, {
        /// Top slice.
        Top = 4,
        /// Bottom slice.
        Bottom = 6,
        /// Left slice.
        Left = 1,
        /// Right slice.
        Right = 3,
    }
);

code_enum!(
    /// User-controlled visibility.
    Visibility, default = Visible, {
        /// Painted and laid out.
        Visible = 13,
        /// Laid out but not painted.
        Hidden = 14,
        /// Neither laid out nor painted.
        Collapsed = 15,
    }
);

code_enum!(
    /// Main axis of stacks, sliders and scroll bars.
    Orientation, default = Vertical, {
        /// Top to bottom.
        Vertical = 16,
        /// Left to right.
        Horizontal = 17,
    }
);

code_enum!(
    /// Font family requested from the painter.
    UiFont, default = Sans, {
        /// Sans-serif.
        Sans = 18,
        /// Serif.
        Serif = 19,
        /// Fixed width.
        Monospace = 20,
    }
);

code_enum!(
    /// Caption drawn on a progress bar.
    DisplayProgressStyle, default = None, {
        /// No caption.
        None = 0,
        /// Percentage of the range.
        Percent = 21,
        /// Raw value.
        Absolute = 22,
    }
);

code_enum!(
    /// How a picture fits its bounds.
    ImageScaling, default = Stretch, {
        /// Natural size, clipped.
        None = 0,
        /// Natural size, centered.
        Center = 2,
        /// Distorted to fill.
        Stretch = 7,
        /// Scaled to fit one axis, may overflow the other.
        Zoom = 23,
        /// Scaled down to fit entirely.
        Contain = 24,
        /// Scaled to cover entirely.
        Cover = 25,
    }
);

code_enum!(
    /// How booleans are rendered as strings.
    BooleanFormat, default = TrueFalse, {
        /// "true"/"false".
        TrueFalse = 11,
        /// "yes"/"no".
        YesNo = 10,
        /// "on"/"off".
        OnOff = 12,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_type_round_trip() {
        for code in 0..=14u8 {
            let ty = UiType::from_u8(code).unwrap();
            assert_eq!(ty as u8, code);
        }
        assert!(UiType::from_u8(15).is_none());
    }

    #[test]
    fn test_widget_type_sentinel() {
        assert!(WidgetType::from_u8(0).is_none());
        assert_eq!(WidgetType::from_u8(255), Some(WidgetType::Stack));
        assert_eq!(WidgetType::from_u8(1), Some(WidgetType::Button));
        assert!(WidgetType::from_u8(4).is_none());
    }

    #[test]
    fn test_property_types() {
        assert_eq!(PropertyId::Columns.value_type(), UiType::SizeList);
        assert_eq!(PropertyId::OnClick.value_type(), UiType::Event);
        assert_eq!(PropertyId::BindingContext.value_type(), UiType::Object);
        assert!(PropertyId::from_u8(28).is_none());
    }

    #[test]
    fn test_shared_code_space() {
        assert_eq!(HAlignment::from_code(1), Some(HAlignment::Left));
        assert_eq!(HAlignment::from_code(4), None);
        assert_eq!(Visibility::Collapsed.code(), 15);
        assert_eq!(DockSite::default(), DockSite::Top);
        assert_eq!(ImageScaling::from_code(7), Some(ImageScaling::Stretch));
    }
}
