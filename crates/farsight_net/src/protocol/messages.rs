//! # Message Definitions
//!
//! Both message sets, with their varint payload layouts.

use farsight_shared::{
    DisplayMessageType, EventId, FarsightResult, Object, ObjectId, PropertyName, ProviderMessageType, ResourceId,
    ResourceKind, Value, WidgetName, WireReader, WireWriter,
};
use farsight_shared::FarsightError;

/// Messages sent from the provider to the display.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderMessage {
    /// Upload or replace a resource.
    UploadResource {
        /// Resource id.
        id: ResourceId,
        /// Resource kind.
        kind: ResourceKind,
        /// Raw payload (the rest of the frame).
        data: Vec<u8>,
    },
    /// Insert or fully replace an object.
    AddOrUpdateObject(Object),
    /// Remove an object.
    RemoveObject(ObjectId),
    /// Show a layout resource.
    SetView(ResourceId),
    /// Select the root binding object.
    SetRoot(ObjectId),
    /// Set one property of an object.
    SetProperty {
        /// Target object.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// New value, carrying its own type tag on the wire.
        value: Value,
    },
    /// Empty an object-list property.
    Clear {
        /// Target object.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
    },
    /// Insert references into an object-list property.
    InsertRange {
        /// Target object.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// Insertion index.
        index: u32,
        /// Inserted object ids.
        items: Vec<ObjectId>,
    },
    /// Remove references from an object-list property.
    RemoveRange {
        /// Target object.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// First removed index.
        index: u32,
        /// Number of removed items.
        count: u32,
    },
    /// Move references inside an object-list property.
    MoveRange {
        /// Target object.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// First moved index.
        from: u32,
        /// Destination index in the resulting list.
        to: u32,
        /// Number of moved items.
        count: u32,
    },
    /// A tag this build does not know. Skipped by the receiver.
    Unknown(u8),
}

/// Messages sent from the display to the provider.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayMessage {
    /// A widget fired an event.
    EventCallback {
        /// Event id configured on the widget.
        event: EventId,
        /// The widget's `name` property.
        widget: WidgetName,
    },
    /// A bound property was changed on the display side.
    PropertyChanged {
        /// Object the property belongs to.
        object: ObjectId,
        /// Property name.
        name: PropertyName,
        /// The new value.
        value: Value,
    },
    /// A tag this build does not know. Skipped by the receiver.
    Unknown(u8),
}

fn read_object_id(reader: &mut WireReader<'_>) -> FarsightResult<ObjectId> {
    reader.read_uint().map(ObjectId)
}

fn read_name(reader: &mut WireReader<'_>) -> FarsightResult<PropertyName> {
    reader.read_uint().map(PropertyName)
}

fn read_typed_value(reader: &mut WireReader<'_>) -> FarsightResult<Value> {
    let ty = reader.read_type()?;
    reader.read_value(ty)
}

impl ProviderMessage {
    /// Returns the wire tag, or `None` for [`ProviderMessage::Unknown`].
    #[must_use]
    pub const fn message_type(&self) -> Option<ProviderMessageType> {
        Some(match self {
            Self::UploadResource { .. } => ProviderMessageType::UploadResource,
            Self::AddOrUpdateObject(_) => ProviderMessageType::AddOrUpdateObject,
            Self::RemoveObject(_) => ProviderMessageType::RemoveObject,
            Self::SetView(_) => ProviderMessageType::SetView,
            Self::SetRoot(_) => ProviderMessageType::SetRoot,
            Self::SetProperty { .. } => ProviderMessageType::SetProperty,
            Self::Clear { .. } => ProviderMessageType::Clear,
            Self::InsertRange { .. } => ProviderMessageType::InsertRange,
            Self::RemoveRange { .. } => ProviderMessageType::RemoveRange,
            Self::MoveRange { .. } => ProviderMessageType::MoveRange,
            Self::Unknown(_) => return None,
        })
    }

    /// Encodes the message into a frame body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(32);
        match self {
            Self::Unknown(tag) => {
                w.write_byte(*tag);
                return w.into_inner();
            }
            other => {
                if let Some(ty) = other.message_type() {
                    w.write_byte(ty as u8);
                }
            }
        }

        match self {
            Self::UploadResource { id, kind, data } => {
                w.write_varint(id.0);
                w.write_byte(*kind as u8);
                w.write_bytes(data);
            }
            Self::AddOrUpdateObject(object) => w.write_object(object),
            Self::RemoveObject(id) | Self::SetRoot(id) => w.write_varint(id.0),
            Self::SetView(id) => w.write_varint(id.0),
            Self::SetProperty { object, name, value } => {
                w.write_varint(object.0);
                w.write_varint(name.0);
                w.write_value(value, true);
            }
            Self::Clear { object, name } => {
                w.write_varint(object.0);
                w.write_varint(name.0);
            }
            Self::InsertRange {
                object,
                name,
                index,
                items,
            } => {
                w.write_varint(object.0);
                w.write_varint(name.0);
                w.write_varint(*index);
                w.write_varint(items.len() as u32);
                for item in items {
                    w.write_varint(item.0);
                }
            }
            Self::RemoveRange {
                object,
                name,
                index,
                count,
            } => {
                w.write_varint(object.0);
                w.write_varint(name.0);
                w.write_varint(*index);
                w.write_varint(*count);
            }
            Self::MoveRange {
                object,
                name,
                from,
                to,
                count,
            } => {
                w.write_varint(object.0);
                w.write_varint(name.0);
                w.write_varint(*from);
                w.write_varint(*to);
                w.write_varint(*count);
            }
            Self::Unknown(_) => {}
        }
        w.into_inner()
    }

    /// Decodes a frame body.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the payload is truncated or malformed.
    /// An unknown tag is not an error: it yields [`ProviderMessage::Unknown`].
    pub fn decode(frame: &[u8]) -> FarsightResult<Self> {
        let mut r = WireReader::new(frame);
        let tag = r.read_byte()?;
        let Some(ty) = ProviderMessageType::from_u8(tag) else {
            return Ok(Self::Unknown(tag));
        };

        let message = match ty {
            ProviderMessageType::UploadResource => {
                let id = ResourceId(r.read_uint()?);
                let kind_tag = r.read_byte()?;
                let kind = ResourceKind::from_u8(kind_tag).ok_or(FarsightError::InvalidTag {
                    kind: "resource kind",
                    tag: kind_tag,
                })?;
                Self::UploadResource {
                    id,
                    kind,
                    data: r.read_rest().to_vec(),
                }
            }
            ProviderMessageType::AddOrUpdateObject => Self::AddOrUpdateObject(r.read_object()?),
            ProviderMessageType::RemoveObject => Self::RemoveObject(read_object_id(&mut r)?),
            ProviderMessageType::SetView => Self::SetView(ResourceId(r.read_uint()?)),
            ProviderMessageType::SetRoot => Self::SetRoot(read_object_id(&mut r)?),
            ProviderMessageType::SetProperty => Self::SetProperty {
                object: read_object_id(&mut r)?,
                name: read_name(&mut r)?,
                value: read_typed_value(&mut r)?,
            },
            ProviderMessageType::Clear => Self::Clear {
                object: read_object_id(&mut r)?,
                name: read_name(&mut r)?,
            },
            ProviderMessageType::InsertRange => {
                let object = read_object_id(&mut r)?;
                let name = read_name(&mut r)?;
                let index = r.read_uint()?;
                let count = r.read_uint()? as usize;
                // every id takes at least one byte
                if count > r.remaining() {
                    return Err(FarsightError::StreamExhausted { needed: count });
                }
                let items = (0..count).map(|_| read_object_id(&mut r)).collect::<FarsightResult<Vec<_>>>()?;
                Self::InsertRange {
                    object,
                    name,
                    index,
                    items,
                }
            }
            ProviderMessageType::RemoveRange => Self::RemoveRange {
                object: read_object_id(&mut r)?,
                name: read_name(&mut r)?,
                index: r.read_uint()?,
                count: r.read_uint()?,
            },
            ProviderMessageType::MoveRange => Self::MoveRange {
                object: read_object_id(&mut r)?,
                name: read_name(&mut r)?,
                from: r.read_uint()?,
                to: r.read_uint()?,
                count: r.read_uint()?,
            },
        };
        Ok(message)
    }
}

impl DisplayMessage {
    /// Encodes the message into a frame body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(16);
        match self {
            Self::EventCallback { event, widget } => {
                w.write_byte(DisplayMessageType::EventCallback as u8);
                w.write_varint(event.0);
                w.write_varint(widget.0);
            }
            Self::PropertyChanged { object, name, value } => {
                w.write_byte(DisplayMessageType::PropertyChanged as u8);
                w.write_varint(object.0);
                w.write_varint(name.0);
                w.write_value(value, true);
            }
            Self::Unknown(tag) => w.write_byte(*tag),
        }
        w.into_inner()
    }

    /// Decodes a frame body.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the payload is truncated or malformed.
    pub fn decode(frame: &[u8]) -> FarsightResult<Self> {
        let mut r = WireReader::new(frame);
        let tag = r.read_byte()?;
        Ok(match DisplayMessageType::from_u8(tag) {
            Some(DisplayMessageType::EventCallback) => Self::EventCallback {
                event: EventId(r.read_uint()?),
                widget: WidgetName(r.read_uint()?),
            },
            Some(DisplayMessageType::PropertyChanged) => Self::PropertyChanged {
                object: read_object_id(&mut r)?,
                name: read_name(&mut r)?,
                value: read_typed_value(&mut r)?,
            },
            None => Self::Unknown(tag),
        })
    }
}
