use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::CoreError;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            pub fn parse_str(s: &str) -> Result<Self, CoreError> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| CoreError::InvalidData(format!("invalid {}: {e}", stringify!($name))))
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// The nil UUID stands in for "no identifier supplied".
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.0.to_string()[..8])
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// External identifier of a catalog, category, product or variant item.
uuid_id!(ItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_empty() {
        assert!(ItemId::nil().is_nil());
        assert!(!ItemId::new().is_nil());
    }

    #[test]
    fn default_is_the_empty_id() {
        assert!(ItemId::default().is_nil());
        assert_eq!(ItemId::default(), ItemId::nil());
    }

    #[test]
    fn parse_display_roundtrip() {
        let id = ItemId::new();
        let parsed = ItemId::parse_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ItemId::parse_str("not-a-guid").unwrap_err();
        assert!(matches!(err, CoreError::InvalidData(_)));
    }

    #[test]
    fn debug_is_short() {
        let id = ItemId::from_bytes([0xab; 16]);
        assert_eq!(format!("{id:?}"), "ItemId(abababab)");
    }
}
