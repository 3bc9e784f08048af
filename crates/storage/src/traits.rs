use vcatalog_core::{CatalogDefinition, CatalogInfo, CatalogItem, ExternalIdInfo, ItemId};

use crate::error::StorageError;

/// Resolves external identifiers and loads/saves catalog items.
///
/// Implementations own concurrency control: a load followed by a save of the
/// same item must be serialized or conflict-detected by the directory.
pub trait CatalogDirectory {
    fn resolve_external_id(&self, item_id: ItemId) -> Result<Option<ExternalIdInfo>, StorageError>;

    fn get_catalog(&self, catalog_name: &str) -> Result<Option<CatalogInfo>, StorageError>;

    fn get_category(
        &self,
        catalog_name: &str,
        category_name: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError>;

    /// Loads a product. Product families come back with their variants populated.
    fn get_product(
        &self,
        catalog_name: &str,
        product_id: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError>;

    /// Persists the item and, for a product family, every variant it owns.
    fn save_item(&self, item: &CatalogItem) -> Result<(), StorageError>;
}

pub trait SchemaResolver {
    /// `None` when no definition with that name exists.
    fn get_catalog_definition(
        &self,
        definition_name: &str,
    ) -> Result<Option<CatalogDefinition>, StorageError>;
}

/// Drops any cached materialization of an item. Fire-and-forget.
pub trait CacheInvalidator {
    fn remove_item(&self, item_id: ItemId);
}

/// Cache invalidator for hosts that keep no item cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheInvalidator for NoopCache {
    fn remove_item(&self, _item_id: ItemId) {}
}

macro_rules! forward_collaborators {
    ($($ty:ty),*) => {$(
        impl<T: CatalogDirectory + ?Sized> CatalogDirectory for $ty {
            fn resolve_external_id(&self, item_id: ItemId) -> Result<Option<ExternalIdInfo>, StorageError> {
                (**self).resolve_external_id(item_id)
            }

            fn get_catalog(&self, catalog_name: &str) -> Result<Option<CatalogInfo>, StorageError> {
                (**self).get_catalog(catalog_name)
            }

            fn get_category(
                &self,
                catalog_name: &str,
                category_name: &str,
                language: &str,
            ) -> Result<Option<CatalogItem>, StorageError> {
                (**self).get_category(catalog_name, category_name, language)
            }

            fn get_product(
                &self,
                catalog_name: &str,
                product_id: &str,
                language: &str,
            ) -> Result<Option<CatalogItem>, StorageError> {
                (**self).get_product(catalog_name, product_id, language)
            }

            fn save_item(&self, item: &CatalogItem) -> Result<(), StorageError> {
                (**self).save_item(item)
            }
        }

        impl<T: SchemaResolver + ?Sized> SchemaResolver for $ty {
            fn get_catalog_definition(
                &self,
                definition_name: &str,
            ) -> Result<Option<CatalogDefinition>, StorageError> {
                (**self).get_catalog_definition(definition_name)
            }
        }

        impl<T: CacheInvalidator + ?Sized> CacheInvalidator for $ty {
            fn remove_item(&self, item_id: ItemId) {
                (**self).remove_item(item_id)
            }
        }
    )*};
}

// Collaborators are often shared: one store can serve as both directory and schema resolver.
forward_collaborators!(&T, Box<T>, std::sync::Arc<T>);
