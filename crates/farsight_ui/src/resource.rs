//! Session-owned resources as the widget engine sees them.
//!
//! Layouts stay as compiled bytes and are deserialized every time a widget
//! tree is built from them. Bitmaps are decoded once, on upload.

use farsight_shared::{ResourceKind, Size};
use image::RgbaImage;

use crate::error::{ResourceError, ResourceResult};

/// A decoded bitmap.
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Pixel size.
    pub size: Size,
    /// RGBA pixels, row-major.
    pub pixels: RgbaImage,
}

/// A resource after upload.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Compiled widget tree.
    Layout(Vec<u8>),
    /// Decoded image.
    Bitmap(Bitmap),
    /// Vector drawing. Stored, never rendered.
    Drawing(Vec<u8>),
}

impl Resource {
    /// Decodes an uploaded payload.
    ///
    /// # Errors
    ///
    /// Fails if a bitmap payload is not a decodable image.
    pub fn decode(kind: ResourceKind, data: &[u8]) -> ResourceResult<Self> {
        Ok(match kind {
            ResourceKind::Layout => Self::Layout(data.to_vec()),
            ResourceKind::Drawing => Self::Drawing(data.to_vec()),
            ResourceKind::Bitmap => {
                let pixels = image::load_from_memory(data)?.to_rgba8();
                let (width, height) = pixels.dimensions();
                let size = match (i32::try_from(width), i32::try_from(height)) {
                    (Ok(w), Ok(h)) => Size::new(w, h),
                    _ => return Err(ResourceError::TooLarge { width, height }),
                };
                Self::Bitmap(Bitmap { size, pixels })
            }
        })
    }

    /// The wire kind of this resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Layout(_) => ResourceKind::Layout,
            Self::Bitmap(_) => ResourceKind::Bitmap,
            Self::Drawing(_) => ResourceKind::Drawing,
        }
    }

    /// Returns the layout bytes if this is a layout.
    #[must_use]
    pub fn as_layout(&self) -> Option<&[u8]> {
        match self {
            Self::Layout(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the bitmap if this is one.
    #[must_use]
    pub const fn as_bitmap(&self) -> Option<&Bitmap> {
        match self {
            Self::Bitmap(bitmap) => Some(bitmap),
            _ => None,
        }
    }
}
