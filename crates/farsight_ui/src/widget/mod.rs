//! Widgets and the arena that owns them.
//!
//! Every widget kind shares one struct. Kind-specific behavior (wanted
//! size, child placement, painting, input) is dispatched by matching on
//! [`Widget::kind`], and kind-specific properties come from a static
//! `(kind, property)` table.

mod properties;
mod tree;

pub use properties::{default_value, supports, PropertyReader, Slot};
pub use tree::WidgetTree;

use farsight_shared::{
    FarsightError, FarsightResult, ObjectRef, PropertyId, PropertyName, Rect, ResourceId, Size, Value, WidgetType,
};
use indexmap::IndexMap;

use crate::context::WidgetContext;

/// Unique identifier for a widget inside one [`WidgetTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

impl WidgetId {
    /// Creates a new widget ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Per-kind state that is not a property.
#[derive(Debug, Clone, Default)]
pub(crate) struct KindState {
    /// Clickable kinds: pointer went down here and is still inside.
    pub pressed: bool,
    /// Scroll bars: pointer offset into the dragged knob.
    pub knob_offset: i32,
    /// Tabs: header button rectangles, one per child.
    pub tab_buttons: Vec<Rect>,
    /// Grids: column widths from the wanted-size pass.
    pub column_widths: Vec<i32>,
    /// Grids: row heights from the wanted-size pass.
    pub row_heights: Vec<i32>,
}

/// A node of the widget tree.
#[derive(Debug, Clone)]
pub struct Widget {
    id: WidgetId,
    kind: WidgetType,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    slots: IndexMap<PropertyId, Slot>,
    pub(crate) binding_source: ObjectRef,
    pub(crate) template_id: ResourceId,
    pub(crate) wanted_size: Size,
    pub(crate) actual_bounds: Rect,
    pub(crate) hidden_by_layout: bool,
    pub(crate) state: KindState,
}

impl Widget {
    pub(crate) fn new(id: WidgetId, kind: WidgetType) -> Self {
        let slots = PropertyId::ALL
            .iter()
            .filter(|&&property| supports(kind, property))
            .map(|&property| (property, Slot::literal(default_value(kind, property))))
            .collect();
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            slots,
            binding_source: ObjectRef::NULL,
            template_id: ResourceId::NULL,
            wanted_size: Size::ZERO,
            actual_bounds: Rect::ZERO,
            hidden_by_layout: false,
            state: KindState::default(),
        }
    }

    /// Widget id.
    #[must_use]
    pub const fn id(&self) -> WidgetId {
        self.id
    }

    /// Widget kind.
    #[must_use]
    pub const fn kind(&self) -> WidgetType {
        self.kind
    }

    /// Parent widget, `None` for a detached widget or the root.
    #[must_use]
    pub const fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// The object bindings currently resolve against.
    #[must_use]
    pub const fn binding_source(&self) -> ObjectRef {
        self.binding_source
    }

    /// Layout resource this subtree was built from, null for inner widgets.
    #[must_use]
    pub const fn template_id(&self) -> ResourceId {
        self.template_id
    }

    /// Size computed by the last wanted-size pass, without margins.
    #[must_use]
    pub const fn wanted_size(&self) -> Size {
        self.wanted_size
    }

    /// On-screen rectangle from the last layout pass.
    #[must_use]
    pub const fn actual_bounds(&self) -> Rect {
        self.actual_bounds
    }

    /// Set when the parent container had no room for this widget.
    #[must_use]
    pub const fn is_hidden_by_layout(&self) -> bool {
        self.hidden_by_layout
    }

    /// True while a clickable widget is held down with the pointer inside.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.state.pressed
    }

    /// Tab header buttons from the last wanted-size and layout passes.
    #[must_use]
    pub fn tab_buttons(&self) -> &[Rect] {
        &self.state.tab_buttons
    }

    /// The property slot, if this kind has the property.
    #[must_use]
    pub fn slot(&self, property: PropertyId) -> Option<&Slot> {
        self.slots.get(&property)
    }

    /// All property slots in table order.
    pub fn slots(&self) -> impl Iterator<Item = (PropertyId, &Slot)> {
        self.slots.iter().map(|(&property, slot)| (property, slot))
    }

    fn slot_mut(&mut self, property: PropertyId) -> FarsightResult<&mut Slot> {
        let kind = self.kind;
        self.slots.get_mut(&property).ok_or(FarsightError::UnknownReference {
            kind: property_kind_label(kind),
            id: u32::from(property as u8),
        })
    }

    /// Replaces a slot's literal value. Does not touch a binding.
    ///
    /// # Errors
    ///
    /// `UnknownReference` if this kind has no such property, `TypeMismatch`
    /// if the value type differs from the property's type.
    pub fn set_literal(&mut self, property: PropertyId, value: Value) -> FarsightResult<()> {
        let expected = property.value_type();
        if value.ty() != expected {
            return Err(FarsightError::TypeMismatch {
                expected,
                found: value.ty(),
            });
        }
        self.slot_mut(property)?.value = value;
        Ok(())
    }

    /// Binds a slot to a property of the binding source.
    ///
    /// # Errors
    ///
    /// `UnknownReference` if this kind has no such property.
    pub fn set_binding(&mut self, property: PropertyId, name: PropertyName) -> FarsightResult<()> {
        self.slot_mut(property)?.binding = Some(name);
        Ok(())
    }

    /// Reads properties through bindings.
    #[must_use]
    pub fn props<'a>(&'a self, ctx: &'a dyn WidgetContext) -> PropertyReader<'a> {
        PropertyReader::new(self, ctx.objects(), ctx.conversion_options())
    }
}

const fn property_kind_label(kind: WidgetType) -> &'static str {
    match kind {
        WidgetType::Stack
        | WidgetType::Dock
        | WidgetType::Grid
        | WidgetType::Canvas
        | WidgetType::Flow
        | WidgetType::Tab => "container property",
        _ => "widget property",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_shared::{EnumCode, HAlignment, Margins};

    #[test]
    fn test_slots_follow_kind_table() {
        let label = Widget::new(WidgetId(1), WidgetType::Label);
        assert!(label.slot(PropertyId::Text).is_some());
        assert!(label.slot(PropertyId::OnClick).is_none());
        assert!(label.slot(PropertyId::Margins).is_some());

        let button = Widget::new(WidgetId(2), WidgetType::Button);
        assert!(button.slot(PropertyId::OnClick).is_some());
        assert!(button.slot(PropertyId::Text).is_none());
    }

    #[test]
    fn test_label_defaults() {
        let label = Widget::new(WidgetId(1), WidgetType::Label);
        assert_eq!(label.slot(PropertyId::Margins).unwrap().value, Value::Margins(Margins::uniform(8)));
        assert_eq!(
            label.slot(PropertyId::HorizontalAlignment).unwrap().value,
            Value::Enumeration(HAlignment::Center.code())
        );
        assert_eq!(label.slot(PropertyId::HitTestVisible).unwrap().value, Value::Boolean(false));
    }

    #[test]
    fn test_set_literal_checks_type_and_kind() {
        let mut label = Widget::new(WidgetId(1), WidgetType::Label);
        label.set_literal(PropertyId::Text, Value::from("hi")).unwrap();
        assert!(matches!(
            label.set_literal(PropertyId::Text, Value::Integer(3)),
            Err(FarsightError::TypeMismatch { .. })
        ));
        assert!(matches!(
            label.set_literal(PropertyId::Columns, Value::SizeList(Vec::new())),
            Err(FarsightError::UnknownReference { .. })
        ));
    }
}
