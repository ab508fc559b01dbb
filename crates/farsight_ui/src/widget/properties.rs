//! Property slots, the per-kind property table and bound reads/writes.

use farsight_shared::{
    convert_to, ConversionOptions, DisplayProgressStyle, DockSite, EnumCode, EventId, FarsightError, FarsightResult,
    HAlignment, ImageScaling, Margins, ObjectRef, ObjectRegistry, Orientation, PropertyId, PropertyName, ResourceId,
    Size, SizeDef, UiFont, VAlignment, Value, Visibility, WidgetName, WidgetType,
};
use tracing::warn;

use super::Widget;
use crate::context::WidgetContext;

/// One property of one widget: a literal plus an optional binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Value used when the binding is absent or does not resolve.
    pub value: Value,
    /// Property of the binding source this slot follows.
    pub binding: Option<PropertyName>,
}

impl Slot {
    /// An unbound slot.
    #[must_use]
    pub const fn literal(value: Value) -> Self {
        Self { value, binding: None }
    }
}

const fn is_common(property: PropertyId) -> bool {
    use PropertyId as P;
    matches!(
        property,
        P::HorizontalAlignment
            | P::VerticalAlignment
            | P::Margins
            | P::Paddings
            | P::DockSite
            | P::Visibility
            | P::SizeHint
            | P::Left
            | P::Top
            | P::Enabled
            | P::BindingContext
            | P::ChildSource
            | P::ChildTemplate
            | P::HitTestVisible
            | P::TabTitle
            | P::Name
    )
}

/// Returns true if widgets of `kind` have `property`.
#[must_use]
pub const fn supports(kind: WidgetType, property: PropertyId) -> bool {
    use PropertyId as P;
    use WidgetType as W;
    is_common(property)
        || matches!(
            (kind, property),
            (W::Label, P::Text | P::FontFamily)
                | (W::ProgressBar, P::Minimum | P::Maximum | P::Value | P::DisplayProgressStyle)
                | (W::Slider | W::ScrollBar, P::Minimum | P::Maximum | P::Value | P::Orientation)
                | (W::Stack, P::Orientation)
                | (W::CheckBox | W::RadioButton, P::IsChecked)
                | (W::Tab, P::SelectedIndex)
                | (W::Grid, P::Columns | P::Rows)
                | (W::Picture, P::Image | P::ImageScaling)
                | (W::Button, P::OnClick)
        )
}

fn code<E: EnumCode>(value: E) -> Value {
    Value::Enumeration(value.code())
}

/// The value a fresh widget of `kind` holds for `property`.
#[must_use]
pub fn default_value(kind: WidgetType, property: PropertyId) -> Value {
    use PropertyId as P;
    use WidgetType as W;
    match (kind, property) {
        (W::Label, P::HorizontalAlignment) => code(HAlignment::Center),
        (W::CheckBox | W::RadioButton, P::HorizontalAlignment) => code(HAlignment::Left),
        (_, P::HorizontalAlignment) => code(HAlignment::default()),
        (W::Label | W::CheckBox | W::RadioButton, P::VerticalAlignment) => code(VAlignment::Middle),
        (_, P::VerticalAlignment) => code(VAlignment::default()),
        (W::Label, P::Margins) => Value::Margins(Margins::uniform(8)),
        (_, P::Margins) => Value::Margins(Margins::uniform(4)),
        (W::Label | W::Spacer | W::Picture, P::HitTestVisible) => Value::Boolean(false),
        (_, P::HitTestVisible | P::Enabled) => Value::Boolean(true),
        (_, P::TabTitle) => Value::from("Tab Page"),
        (_, P::Maximum) => Value::Number(100.0),
        (W::Slider, P::Value) => Value::Number(25.0),
        (W::ProgressBar, P::DisplayProgressStyle) => code(DisplayProgressStyle::Percent),
        (_, P::DisplayProgressStyle) => code(DisplayProgressStyle::default()),
        (W::Slider | W::ScrollBar, P::Orientation) => code(Orientation::Horizontal),
        (_, P::Orientation) => code(Orientation::default()),
        (_, P::DockSite) => code(DockSite::default()),
        (_, P::Visibility) => code(Visibility::default()),
        (_, P::FontFamily) => code(UiFont::default()),
        (_, P::ImageScaling) => code(ImageScaling::default()),
        _ => Value::default_for(property.value_type()),
    }
}

/// Reads a widget's properties, following bindings.
///
/// A bound slot yields the bound object's property converted to the slot
/// type. If the source does not resolve, the object lacks the property or
/// the conversion fails, the slot's literal is used.
pub struct PropertyReader<'a> {
    widget: &'a Widget,
    objects: &'a ObjectRegistry,
    options: ConversionOptions,
}

impl<'a> PropertyReader<'a> {
    /// Creates a reader over `widget`.
    #[must_use]
    pub const fn new(widget: &'a Widget, objects: &'a ObjectRegistry, options: ConversionOptions) -> Self {
        Self {
            widget,
            objects,
            options,
        }
    }

    /// The effective value of a property.
    #[must_use]
    pub fn value(&self, property: PropertyId) -> Value {
        let Some(slot) = self.widget.slot(property) else {
            return default_value(self.widget.kind(), property);
        };
        if let Some(name) = slot.binding {
            let bound = self
                .widget
                .binding_source
                .resolve(self.objects)
                .and_then(|object| object.get(name));
            if let Some(bound) = bound {
                match convert_to(&bound.value, property.value_type(), &self.options) {
                    Ok(value) => return value,
                    Err(e) => warn!("{} {:?} bound to {name}: {e}", self.widget.id(), property),
                }
            }
        }
        slot.value.clone()
    }

    /// Integer property, `0` on a type mismatch.
    #[must_use]
    pub fn integer(&self, property: PropertyId) -> i32 {
        match self.value(property) {
            Value::Integer(v) => v,
            _ => 0,
        }
    }

    /// Number property.
    #[must_use]
    pub fn number(&self, property: PropertyId) -> f32 {
        match self.value(property) {
            Value::Number(v) => v,
            _ => 0.0,
        }
    }

    /// Boolean property.
    #[must_use]
    pub fn boolean(&self, property: PropertyId) -> bool {
        matches!(self.value(property), Value::Boolean(true))
    }

    /// String property.
    #[must_use]
    pub fn string(&self, property: PropertyId) -> String {
        match self.value(property) {
            Value::String(v) => v,
            _ => String::new(),
        }
    }

    /// Margins property.
    #[must_use]
    pub fn margins(&self, property: PropertyId) -> Margins {
        match self.value(property) {
            Value::Margins(v) => v,
            _ => Margins::default(),
        }
    }

    /// Size property.
    #[must_use]
    pub fn size(&self, property: PropertyId) -> Size {
        match self.value(property) {
            Value::Size(v) => v,
            _ => Size::ZERO,
        }
    }

    /// Resource property.
    #[must_use]
    pub fn resource(&self, property: PropertyId) -> ResourceId {
        match self.value(property) {
            Value::Resource(v) => v,
            _ => ResourceId::NULL,
        }
    }

    /// Event property.
    #[must_use]
    pub fn event(&self, property: PropertyId) -> EventId {
        match self.value(property) {
            Value::Event(v) => v,
            _ => EventId::NULL,
        }
    }

    /// Object reference property.
    #[must_use]
    pub fn object(&self, property: PropertyId) -> ObjectRef {
        match self.value(property) {
            Value::Object(v) => v,
            _ => ObjectRef::NULL,
        }
    }

    /// Object list property.
    #[must_use]
    pub fn object_list(&self, property: PropertyId) -> Vec<ObjectRef> {
        match self.value(property) {
            Value::ObjectList(v) => v,
            _ => Vec::new(),
        }
    }

    /// Size list property.
    #[must_use]
    pub fn size_list(&self, property: PropertyId) -> Vec<SizeDef> {
        match self.value(property) {
            Value::SizeList(v) => v,
            _ => Vec::new(),
        }
    }

    /// Enumeration property decoded as `E`. Codes outside `E` yield its default.
    #[must_use]
    pub fn enumeration<E: EnumCode + Default>(&self, property: PropertyId) -> E {
        match self.value(property) {
            Value::Enumeration(code) => E::from_code(code).unwrap_or_default(),
            _ => E::default(),
        }
    }

    /// User visibility, ignoring layout.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.enumeration(PropertyId::Visibility)
    }

    /// The name reported with event callbacks.
    #[must_use]
    pub fn name(&self) -> WidgetName {
        WidgetName(u32::try_from(self.integer(PropertyId::Name)).unwrap_or(0))
    }
}

impl Widget {
    /// Writes a property through its binding.
    ///
    /// A bound slot whose source resolves and declares the property writes
    /// the object instead, converted to the object's declared type. The
    /// provider is notified only if the stored value actually changed.
    /// Anything else updates the literal silently.
    ///
    /// # Errors
    ///
    /// `UnknownReference` if this kind lacks the property,
    /// `UnsupportedConversion` if the value cannot take the target type.
    pub fn write_property(
        &mut self,
        ctx: &mut dyn WidgetContext,
        property: PropertyId,
        value: Value,
    ) -> FarsightResult<()> {
        let binding = self
            .slot(property)
            .ok_or(FarsightError::UnknownReference {
                kind: "widget property",
                id: u32::from(property as u8),
            })?
            .binding;

        if let Some(name) = binding {
            let source = self.binding_source.id;
            let options = ctx.conversion_options();
            let bound = if source.is_null() {
                None
            } else {
                ctx.objects_mut().get_mut(source).and_then(|object| object.get_mut(name))
            };
            if let Some(bound) = bound {
                let converted = convert_to(&value, bound.ty, &options)?;
                if bound.value == converted {
                    return Ok(());
                }
                bound.value = converted.clone();
                ctx.trigger_property_changed(source, name, converted);
                return Ok(());
            }
        }

        let converted = convert_to(&value, property.value_type(), &ctx.conversion_options())?;
        self.set_literal(property, converted)
    }
}
