//! # FARSIGHT Shared
//!
//! Common types used by both the provider and the display.
//!
//! ## Contents
//!
//! - Opaque 32-bit identifiers (`ObjectId`, `PropertyName`, ...)
//! - The closed `Value` union and its varint codec
//! - `Object` and the session-owned `ObjectRegistry`
//! - Fixed-layout handshake and discovery structs
//!
//! ## CRITICAL RULE
//!
//! The `UiType` discriminant must equal the `Value` variant index.
//! The wire format only ever carries the tag byte.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod convert;
pub mod enums;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod object;
pub mod protocol;
pub mod value;

pub use codec::{WireReader, WireWriter};
pub use constants::{DEFAULT_PORT, MAX_FRAME_SIZE, MULTICAST_GROUP, PROTOCOL_VERSION};
pub use convert::{convert_to, ConversionOptions};
pub use enums::{
    BooleanFormat, DisplayProgressStyle, DockSite, EnumCode, HAlignment, ImageScaling, Orientation,
    PropertyId, UiFont, UiType, VAlignment, Visibility, WidgetType,
};
pub use error::{FarsightError, FarsightResult};
pub use geometry::{Color, Margins, Point, Rect, Size};
pub use ids::{EventId, ObjectId, PropertyName, ResourceId, WidgetName};
pub use object::{Object, ObjectRef, ObjectRegistry, Property};
pub use protocol::{DisplayMessageType, ProviderMessageType, ResourceKind};
pub use value::{SizeDef, Value};
