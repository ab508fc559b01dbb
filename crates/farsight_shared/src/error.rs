//! # Error Types
//!
//! Decode errors desynchronize the byte stream and are fatal to the
//! connection. Everything else is an application error: the caller logs it
//! and treats the offending operation as a no-op.

use crate::enums::UiType;
use thiserror::Error;

/// Errors raised by the codec and the object model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FarsightError {
    /// A read ran past the end of the buffer.
    #[error("stream exhausted: needed {needed} more bytes")]
    StreamExhausted {
        /// Bytes missing.
        needed: usize,
    },

    /// A varint did not terminate within the width of a `u32`.
    #[error("varint overflows 32 bits")]
    VarintOverflow,

    /// A string payload was not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// An unknown type, widget or property tag.
    #[error("invalid {kind} tag: {tag}")]
    InvalidTag {
        /// What was being decoded.
        kind: &'static str,
        /// The offending byte.
        tag: u8,
    },

    /// The object already declares this property.
    #[error("object {object} already has property {property}")]
    DuplicateProperty {
        /// Object id.
        object: u32,
        /// Property name.
        property: u32,
    },

    /// No conversion rule between the two types.
    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion {
        /// Source type.
        from: UiType,
        /// Target type.
        to: UiType,
    },

    /// An object, property or resource id did not resolve.
    #[error("unknown {kind} {id}")]
    UnknownReference {
        /// What kind of id.
        kind: &'static str,
        /// The raw id.
        id: u32,
    },

    /// A value's type differs from the declared type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared type.
        expected: UiType,
        /// Supplied type.
        found: UiType,
    },

    /// Another widget already holds the mouse capture.
    #[error("mouse is already captured by another widget")]
    AlreadyCaptured,

    /// A layout resource is structurally invalid.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

impl FarsightError {
    /// Returns true if the byte stream can no longer be trusted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StreamExhausted { .. }
                | Self::VarintOverflow
                | Self::InvalidUtf8
                | Self::InvalidTag { .. }
        )
    }
}

/// Result type for codec and object model operations.
pub type FarsightResult<T> = Result<T, FarsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(FarsightError::StreamExhausted { needed: 1 }.is_fatal());
        assert!(FarsightError::VarintOverflow.is_fatal());
        assert!(!FarsightError::AlreadyCaptured.is_fatal());
        assert!(!FarsightError::TypeMismatch {
            expected: UiType::Integer,
            found: UiType::String
        }
        .is_fatal());
    }
}
