//! # Layout Resource Format
//!
//! A compiled layout is one widget encoded recursively:
//!
//! ```text
//! widget   := type:u8 property* 0x00 widget* 0x00
//! property := id:u8 value            (literal, typed by the property id)
//!           | (id | 0x80) name:varint (binding to a source property)
//! ```
//!
//! A type byte of `0` closes a child list and never starts a tree.
//! [`LayoutWriter`] produces this format; [`WidgetTree::load_layout`] reads it.

use farsight_shared::{
    convert_to, ConversionOptions, FarsightError, FarsightResult, PropertyId, PropertyName, ResourceId, Value,
    WidgetType, WireReader, WireWriter,
};
use tracing::{debug, warn};

use crate::context::WidgetContext;
use crate::widget::{WidgetId, WidgetTree};

const BINDING_FLAG: u8 = 0x80;

impl WidgetTree {
    /// Builds a detached widget tree from a layout resource.
    ///
    /// # Errors
    ///
    /// `UnknownReference` if the resource does not exist, `InvalidLayout` if
    /// it is not a layout, plus everything [`WidgetTree::load_layout`] reports.
    pub fn instantiate(&mut self, ctx: &dyn WidgetContext, resource: ResourceId) -> FarsightResult<WidgetId> {
        let bytes = ctx
            .resource(resource)
            .ok_or(FarsightError::UnknownReference {
                kind: "resource",
                id: resource.raw(),
            })?
            .as_layout()
            .ok_or_else(|| FarsightError::InvalidLayout(format!("{resource} is not a layout")))?;
        self.load_layout(bytes, resource)
    }

    /// Deserializes `layout` into new, detached widgets.
    ///
    /// The returned root remembers `template` so repeaters can tell which
    /// resource a child was built from. Properties a widget kind does not
    /// have are skipped with a warning. On error nothing is left behind.
    ///
    /// # Errors
    ///
    /// Decode errors for truncated input, `InvalidTag` for unknown widget or
    /// property codes, `InvalidLayout` for an empty tree.
    pub fn load_layout(&mut self, layout: &[u8], template: ResourceId) -> FarsightResult<WidgetId> {
        let mut reader = WireReader::new(layout);
        let kind = reader.read_byte()?;
        if kind == 0 {
            return Err(FarsightError::InvalidLayout("layout has no root widget".into()));
        }
        let root = self.read_widget(&mut reader, kind)?;
        if !reader.is_empty() {
            debug!("{} trailing bytes after layout {template}", reader.remaining());
        }
        if let Some(widget) = self.get_mut(root) {
            widget.template_id = template;
        }
        Ok(root)
    }

    fn read_widget(&mut self, reader: &mut WireReader<'_>, tag: u8) -> FarsightResult<WidgetId> {
        let kind = WidgetType::from_u8(tag).ok_or(FarsightError::InvalidTag { kind: "widget", tag })?;
        let id = self.create(kind);
        if let Err(e) = self.read_widget_body(reader, id) {
            self.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    fn read_widget_body(&mut self, reader: &mut WireReader<'_>, id: WidgetId) -> FarsightResult<()> {
        loop {
            let tag = reader.read_byte()?;
            if tag == 0 {
                break;
            }
            let code = tag & !BINDING_FLAG;
            let property = PropertyId::from_u8(code).ok_or(FarsightError::InvalidTag { kind: "property", tag: code })?;
            let Some(widget) = self.get_mut(id) else {
                break;
            };
            let applied = if tag & BINDING_FLAG == 0 {
                let value = reader.read_value(property.value_type())?;
                widget.set_literal(property, value)
            } else {
                let name = PropertyName(reader.read_uint()?);
                widget.set_binding(property, name)
            };
            if let Err(e) = applied {
                warn!("Layout property {property:?} on {:?} ignored: {e}", widget.kind());
            }
        }

        loop {
            let tag = reader.read_byte()?;
            if tag == 0 {
                return Ok(());
            }
            let child = self.read_widget(reader, tag)?;
            self.append_child(id, child);
        }
    }
}

/// Writes layouts in the compiled binary format.
///
/// ```rust,ignore
/// let mut layout = LayoutWriter::new();
/// layout.begin(WidgetType::Button).property(PropertyId::OnClick, Value::Event(EventId(7)));
/// layout.begin(WidgetType::Label).property(PropertyId::Text, "Click me!").end();
/// let bytes = layout.finish();
/// ```
#[derive(Debug, Default)]
pub struct LayoutWriter {
    out: WireWriter,
    depth: usize,
    properties_open: bool,
}

impl LayoutWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn close_properties(&mut self) {
        if self.properties_open {
            self.out.write_byte(0);
            self.properties_open = false;
        }
    }

    /// Opens a widget. Widgets opened before [`LayoutWriter::end`] become its children.
    pub fn begin(&mut self, kind: WidgetType) -> &mut Self {
        self.close_properties();
        self.out.write_byte(kind as u8);
        self.properties_open = true;
        self.depth += 1;
        self
    }

    /// Sets a literal on the open widget, converting to the property's type.
    ///
    /// Values that cannot be converted are dropped with a warning.
    pub fn property(&mut self, property: PropertyId, value: impl Into<Value>) -> &mut Self {
        if !self.properties_open {
            warn!("Property {property:?} written outside a widget header");
            return self;
        }
        match convert_to(&value.into(), property.value_type(), &ConversionOptions::default()) {
            Ok(value) => {
                self.out.write_byte(property as u8);
                self.out.write_value(&value, false);
            }
            Err(e) => warn!("Property {property:?} dropped: {e}"),
        }
        self
    }

    /// Binds a property of the open widget to `name` on its binding source.
    pub fn binding(&mut self, property: PropertyId, name: PropertyName) -> &mut Self {
        if !self.properties_open {
            warn!("Binding {property:?} written outside a widget header");
            return self;
        }
        self.out.write_byte(property as u8 | BINDING_FLAG);
        self.out.write_varint(name.raw());
        self
    }

    /// Closes the innermost open widget.
    pub fn end(&mut self) -> &mut Self {
        if self.depth == 0 {
            return self;
        }
        self.close_properties();
        self.out.write_byte(0);
        self.depth -= 1;
        self
    }

    /// Closes every open widget and returns the bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        while self.depth > 0 {
            self.end();
        }
        self.out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LocalContext;
    use crate::resource::Resource;
    use farsight_shared::{EventId, Margins, SizeDef};

    fn button_layout() -> Vec<u8> {
        let mut layout = LayoutWriter::new();
        layout
            .begin(WidgetType::Button)
            .property(PropertyId::OnClick, Value::Event(EventId(7)))
            .property(PropertyId::Name, 3)
            .begin(WidgetType::Label)
            .property(PropertyId::Text, "Click me!")
            .end();
        layout.finish()
    }

    #[test]
    fn test_writer_bytes() {
        let mut layout = LayoutWriter::new();
        layout.begin(WidgetType::Label).property(PropertyId::Text, "ok");
        assert_eq!(layout.finish(), vec![2, 10, 2, b'o', b'k', 0, 0]);

        let mut layout = LayoutWriter::new();
        layout.begin(WidgetType::Stack).binding(PropertyId::Visibility, PropertyName(300));
        assert_eq!(layout.finish(), vec![255, 7 | 0x80, 0x82, 0x2c, 0, 0]);
    }

    #[test]
    fn test_load_nested_tree() {
        let mut tree = WidgetTree::new();
        let root = tree.load_layout(&button_layout(), ResourceId(9)).unwrap();
        let ctx = LocalContext::new();

        let button = tree.get(root).unwrap();
        assert_eq!(button.kind(), WidgetType::Button);
        assert_eq!(button.template_id(), ResourceId(9));
        assert_eq!(button.props(&ctx).event(PropertyId::OnClick), EventId(7));
        assert_eq!(button.props(&ctx).integer(PropertyId::Name), 3);

        let label = tree.get(tree.children(root)[0]).unwrap();
        assert_eq!(label.kind(), WidgetType::Label);
        assert_eq!(label.props(&ctx).string(PropertyId::Text), "Click me!");
        assert_eq!(label.template_id(), ResourceId::NULL);
    }

    #[test]
    fn test_binding_recorded() {
        let mut layout = LayoutWriter::new();
        layout
            .begin(WidgetType::Grid)
            .property(PropertyId::Columns, Value::SizeList(vec![SizeDef::Expand, SizeDef::Pixels(20)]))
            .binding(PropertyId::Margins, PropertyName(4));
        let mut tree = WidgetTree::new();
        let root = tree.load_layout(&layout.finish(), ResourceId(1)).unwrap();
        let grid = tree.get(root).unwrap();
        assert_eq!(grid.slot(PropertyId::Margins).unwrap().binding, Some(PropertyName(4)));
        assert_eq!(grid.slot(PropertyId::Margins).unwrap().value, Value::Margins(Margins::uniform(4)));
    }

    #[test]
    fn test_foreign_property_skipped() {
        // Text on a button: known id, wrong kind. The value is still consumed.
        let bytes = vec![1, 10, 2, b'h', b'i', 0, 2, 0, 0, 0];
        let mut tree = WidgetTree::new();
        let root = tree.load_layout(&bytes, ResourceId(1)).unwrap();
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn test_invalid_layouts() {
        let mut tree = WidgetTree::new();
        assert!(matches!(
            tree.load_layout(&[0], ResourceId(1)),
            Err(FarsightError::InvalidLayout(_))
        ));
        assert!(matches!(
            tree.load_layout(&[4, 0, 0], ResourceId(1)),
            Err(FarsightError::InvalidTag { kind: "widget", .. })
        ));
        assert!(matches!(
            tree.load_layout(&[255, 5, 0], ResourceId(1)),
            Err(FarsightError::InvalidTag { kind: "property", .. })
        ));

        let bytes = button_layout();
        assert!(matches!(
            tree.load_layout(&bytes[..bytes.len() - 2], ResourceId(1)),
            Err(FarsightError::StreamExhausted { .. })
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_instantiate_from_context() {
        let mut ctx = LocalContext::new();
        ctx.insert_resource(ResourceId(2), Resource::Layout(button_layout()));
        ctx.insert_resource(ResourceId(3), Resource::Drawing(Vec::new()));

        let mut tree = WidgetTree::new();
        assert!(tree.instantiate(&ctx, ResourceId(2)).is_ok());
        assert!(matches!(
            tree.instantiate(&ctx, ResourceId(3)),
            Err(FarsightError::InvalidLayout(_))
        ));
        assert!(matches!(
            tree.instantiate(&ctx, ResourceId(4)),
            Err(FarsightError::UnknownReference { kind: "resource", .. })
        ));
    }
}
