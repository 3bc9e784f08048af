pub mod catalog;
pub mod error;
pub mod field_value;
pub mod ids;
pub mod property;

pub use catalog::{CatalogInfo, CatalogItem, ExternalIdInfo, ItemKind, OverrideTarget, Variant};
pub use error::CoreError;
pub use field_value::FieldValue;
pub use ids::*;
pub use property::{CatalogDefinition, PropertyCell, PropertyDescriptor, PropertyKind, PropertyRecord};
