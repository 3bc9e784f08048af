use serde::{Deserialize, Serialize};

use crate::{CoreError, FieldValue, ItemId, PropertyCell, PropertyRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Catalog,
    Category,
    Product,
    ProductFamily,
    Variant,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Category => "category",
            Self::Product => "product",
            Self::ProductFamily => "product_family",
            Self::Variant => "variant",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "catalog" => Ok(Self::Catalog),
            "category" => Ok(Self::Category),
            "product" => Ok(Self::Product),
            "product_family" => Ok(Self::ProductFamily),
            "variant" => Ok(Self::Variant),
            _ => Err(CoreError::UnknownItemKind(s.to_string())),
        }
    }

    /// Only categories, products, families and variants carry overridable properties.
    pub fn is_revertible(&self) -> bool {
        !matches!(self, Self::Catalog)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog coordinates an external identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdInfo {
    pub item_kind: ItemKind,
    pub catalog_name: String,
    pub category_name: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
}

impl ExternalIdInfo {
    pub fn catalog(catalog_name: impl Into<String>) -> Self {
        Self {
            item_kind: ItemKind::Catalog,
            catalog_name: catalog_name.into(),
            category_name: None,
            product_id: None,
            variant_id: None,
        }
    }

    pub fn category(catalog_name: impl Into<String>, category_name: impl Into<String>) -> Self {
        Self {
            item_kind: ItemKind::Category,
            catalog_name: catalog_name.into(),
            category_name: Some(category_name.into()),
            product_id: None,
            variant_id: None,
        }
    }

    pub fn product(
        kind: ItemKind,
        catalog_name: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self {
            item_kind: kind,
            catalog_name: catalog_name.into(),
            category_name: None,
            product_id: Some(product_id.into()),
            variant_id: None,
        }
    }

    pub fn variant(
        catalog_name: impl Into<String>,
        product_id: impl Into<String>,
        variant_id: impl Into<String>,
    ) -> Self {
        Self {
            item_kind: ItemKind::Variant,
            catalog_name: catalog_name.into(),
            category_name: None,
            product_id: Some(product_id.into()),
            variant_id: Some(variant_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    pub is_virtual: bool,
    pub base_catalogs: Vec<String>,
}

impl CatalogInfo {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_virtual: false,
            base_catalogs: Vec::new(),
        }
    }

    pub fn virtual_over(name: impl Into<String>, base_catalogs: &[&str]) -> Self {
        Self {
            name: name.into(),
            is_virtual: true,
            base_catalogs: base_catalogs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Capability shared by every record whose overrides can be reverted.
pub trait OverrideTarget {
    fn is_property_mutable(&self, name: &str) -> bool;

    /// Returns true if a local override was removed.
    fn clear_override(&mut self, name: &str) -> bool;
}

/// A variant record owned by a product family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub item_id: ItemId,
    pub variant_id: String,
    pub properties: PropertyRecord,
}

impl Variant {
    pub fn new(item_id: ItemId, variant_id: impl Into<String>) -> Self {
        Self {
            item_id,
            variant_id: variant_id.into(),
            properties: PropertyRecord::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, cell: PropertyCell) -> Self {
        self.properties.insert(name, cell);
        self
    }

    pub fn effective(&self, name: &str) -> Option<&FieldValue> {
        self.properties.effective(name)
    }
}

impl OverrideTarget for Variant {
    fn is_property_mutable(&self, name: &str) -> bool {
        self.properties.is_property_mutable(name)
    }

    fn clear_override(&mut self, name: &str) -> bool {
        self.properties.clear_override(name)
    }
}

/// A category, product or product family loaded from a catalog.
///
/// `variants` is only populated for product families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub catalog_name: String,
    /// Category name or product id, depending on `kind`.
    pub key: String,
    pub definition_name: String,
    pub language: String,
    pub properties: PropertyRecord,
    pub variants: Vec<Variant>,
    /// Store revision observed when the item was loaded. Saving a stale
    /// revision is rejected by the store.
    pub revision: u64,
}

impl CatalogItem {
    pub fn new(
        item_id: ItemId,
        kind: ItemKind,
        catalog_name: impl Into<String>,
        key: impl Into<String>,
        definition_name: impl Into<String>,
    ) -> Self {
        Self {
            item_id,
            kind,
            catalog_name: catalog_name.into(),
            key: key.into(),
            definition_name: definition_name.into(),
            language: String::new(),
            properties: PropertyRecord::new(),
            variants: Vec::new(),
            revision: 0,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, cell: PropertyCell) -> Self {
        self.properties.insert(name, cell);
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn is_product_family(&self) -> bool {
        self.kind == ItemKind::ProductFamily
    }

    pub fn effective(&self, name: &str) -> Option<&FieldValue> {
        self.properties.effective(name)
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }

    pub fn variant_mut(&mut self, variant_id: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.variant_id == variant_id)
    }
}

impl OverrideTarget for CatalogItem {
    fn is_property_mutable(&self, name: &str) -> bool {
        self.properties.is_property_mutable(name)
    }

    fn clear_override(&mut self, name: &str) -> bool {
        self.properties.clear_override(name)
    }
}
