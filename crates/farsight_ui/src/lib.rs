//! # FARSIGHT UI
//!
//! The widget engine of a display: layout resources are deserialized into a
//! widget tree, widget properties are bound against the provider's objects,
//! and a two-phase layout positions everything before painting.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI PIPELINE                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Layout resource → WidgetTree → Bindings → Layout → Paint    │
//! │        ↓              ↓            ↓          ↓        ↓     │
//! │   deserialize     arena of    repeaters   wanted    painter  │
//! │                   widgets     rebinding   + bounds  trait    │
//! │                                                              │
//! │  Pointer events → hit test / capture → property writes       │
//! │                                      → event callbacks       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never owns objects or resources. Everything it needs from the
//! session goes through [`WidgetContext`].

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod binding;
pub mod context;
pub mod error;
pub mod input;
pub mod layout;
pub mod paint;
pub mod painter;
pub mod resource;
pub mod serialize;
pub mod widget;

pub use context::{LocalContext, Notification, WidgetContext};
pub use error::{ResourceError, ResourceResult};
pub use input::PointerEvent;
pub use layout::actual_visibility;
pub use painter::{
    Bevel, FixedMetrics, LineStyle, PaintColor, PaintCommand, RecordingPainter, TextAlign, TextMeasure, WidgetPainter,
};
pub use resource::{Bitmap, Resource};
pub use serialize::LayoutWriter;
pub use widget::{PropertyReader, Slot, Widget, WidgetId, WidgetTree};
