//! The closed `Value` union.

use crate::enums::UiType;
use crate::geometry::{Color, Margins, Point, Size};
use crate::ids::{EventId, ObjectId, ResourceId};
use crate::object::ObjectRef;

/// One entry of a grid row/column definition list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeDef {
    /// Sized to the largest child.
    Auto,
    /// Shares the remaining space with the other expanders.
    Expand,
    /// Fixed pixel extent.
    Pixels(i32),
    /// Fraction of the available extent, in `0.0..=1.0`.
    Percent(f32),
}

impl SizeDef {
    /// Two-bit tag used in the packed sizelist bitmap.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Expand => 1,
            Self::Pixels(_) => 2,
            Self::Percent(_) => 3,
        }
    }
}

/// A dynamically typed property value.
///
/// Each discriminant is pinned to its [`UiType`] code, so the compiler
/// rejects any reordering that would break the wire tag mapping.
#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Invalid = UiType::Invalid as u8,
    /// Signed integer.
    Integer(i32) = UiType::Integer as u8,
    /// Float.
    Number(f32) = UiType::Number as u8,
    /// String.
    String(String) = UiType::String as u8,
    /// Enumeration code.
    Enumeration(u8) = UiType::Enumeration as u8,
    /// Four-sided spacing.
    Margins(Margins) = UiType::Margins as u8,
    /// RGBA color.
    Color(Color) = UiType::Color as u8,
    /// Width/height.
    Size(Size) = UiType::Size as u8,
    /// X/Y point.
    Point(Point) = UiType::Point as u8,
    /// Resource handle.
    Resource(ResourceId) = UiType::Resource as u8,
    /// Boolean.
    Boolean(bool) = UiType::Boolean as u8,
    /// Grid definitions.
    SizeList(Vec<SizeDef>) = UiType::SizeList as u8,
    /// Object reference.
    Object(ObjectRef) = UiType::Object as u8,
    /// Object references.
    ObjectList(Vec<ObjectRef>) = UiType::ObjectList as u8,
    /// Callback handle.
    Event(EventId) = UiType::Event as u8,
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn ty(&self) -> UiType {
        match self {
            Self::Invalid => UiType::Invalid,
            Self::Integer(_) => UiType::Integer,
            Self::Number(_) => UiType::Number,
            Self::String(_) => UiType::String,
            Self::Enumeration(_) => UiType::Enumeration,
            Self::Margins(_) => UiType::Margins,
            Self::Color(_) => UiType::Color,
            Self::Size(_) => UiType::Size,
            Self::Point(_) => UiType::Point,
            Self::Resource(_) => UiType::Resource,
            Self::Boolean(_) => UiType::Boolean,
            Self::SizeList(_) => UiType::SizeList,
            Self::Object(_) => UiType::Object,
            Self::ObjectList(_) => UiType::ObjectList,
            Self::Event(_) => UiType::Event,
        }
    }

    /// The default value of a type, as freshly declared properties hold.
    #[must_use]
    pub fn default_for(ty: UiType) -> Self {
        match ty {
            UiType::Invalid => Self::Invalid,
            UiType::Integer => Self::Integer(0),
            UiType::Number => Self::Number(0.0),
            UiType::String => Self::String(String::new()),
            UiType::Enumeration => Self::Enumeration(0),
            UiType::Margins => Self::Margins(Margins::default()),
            UiType::Color => Self::Color(Color::default()),
            UiType::Size => Self::Size(Size::default()),
            UiType::Point => Self::Point(Point::default()),
            UiType::Resource => Self::Resource(ResourceId::NULL),
            UiType::Boolean => Self::Boolean(false),
            UiType::SizeList => Self::SizeList(Vec::new()),
            UiType::Object => Self::Object(ObjectRef::NULL),
            UiType::ObjectList => Self::ObjectList(Vec::new()),
            UiType::Event => Self::Event(EventId::NULL),
        }
    }

    /// Returns true unless this is [`Value::Invalid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Shorthand for an object reference value.
    #[must_use]
    pub const fn object(id: ObjectId) -> Self {
        Self::Object(ObjectRef::new(id))
    }

    /// Shorthand for an object list value.
    #[must_use]
    pub fn object_list(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self::ObjectList(ids.into_iter().map(ObjectRef::new).collect())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_variant() {
        for code in 0..=14u8 {
            let ty = UiType::from_u8(code).unwrap();
            assert_eq!(Value::default_for(ty).ty(), ty);
        }
    }

    #[test]
    fn test_size_def_tags() {
        assert_eq!(SizeDef::Auto.tag(), 0);
        assert_eq!(SizeDef::Expand.tag(), 1);
        assert_eq!(SizeDef::Pixels(3).tag(), 2);
        assert_eq!(SizeDef::Percent(0.5).tag(), 3);
    }
}
