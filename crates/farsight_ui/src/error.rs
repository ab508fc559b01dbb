//! Resource decoding errors.
//!
//! Widget operations report [`FarsightError`](farsight_shared::FarsightError)
//! directly. Only resource decoding has failure modes of its own.

use thiserror::Error;

/// Errors raised while decoding an uploaded resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The bitmap payload is not an image format we can decode.
    #[error("bitmap decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The decoded bitmap does not fit the 32-bit signed geometry.
    #[error("bitmap too large: {width}x{height}")]
    TooLarge {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
}

/// Result type for resource decoding.
pub type ResourceResult<T> = Result<T, ResourceError>;
