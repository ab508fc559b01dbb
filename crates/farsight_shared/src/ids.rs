//! Opaque 32-bit handles.
//!
//! Every handle uses `0` as its null sentinel. The handles are distinct
//! types so an `EventId` can never be passed where an `ObjectId` is expected.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Invalid/null handle.
            pub const NULL: Self = Self(0);

            /// Creates a handle from its raw value.
            #[inline]
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw value.
            #[inline]
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Returns true if this is the null handle.
            #[inline]
            #[must_use]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Identifies an object in the session registry.
    ObjectId
);
define_id!(
    /// Names a property on an object.
    PropertyName
);
define_id!(
    /// Identifies an uploaded resource.
    ResourceId
);
define_id!(
    /// Identifies a provider-side callback.
    EventId
);
define_id!(
    /// Names a widget so the provider can tell event sources apart.
    WidgetName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sentinel() {
        assert!(ObjectId::NULL.is_null());
        assert!(ObjectId::default().is_null());
        assert!(!ObjectId::new(7).is_null());
        assert_eq!(ResourceId::from(9).raw(), 9);
    }
}
