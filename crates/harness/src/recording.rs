use std::cell::RefCell;

use vcatalog_core::{CatalogDefinition, CatalogInfo, CatalogItem, ExternalIdInfo, ItemId};
use vcatalog_storage::{CacheInvalidator, CatalogDirectory, SchemaResolver, StorageError};

/// Directory wrapper that remembers every item handed to `save_item`.
pub struct RecordingDirectory<D> {
    inner: D,
    saved: RefCell<Vec<CatalogItem>>,
}

impl<D> RecordingDirectory<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            saved: RefCell::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn saved(&self) -> Vec<CatalogItem> {
        self.saved.borrow().clone()
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: CatalogDirectory> CatalogDirectory for RecordingDirectory<D> {
    fn resolve_external_id(&self, item_id: ItemId) -> Result<Option<ExternalIdInfo>, StorageError> {
        self.inner.resolve_external_id(item_id)
    }

    fn get_catalog(&self, catalog_name: &str) -> Result<Option<CatalogInfo>, StorageError> {
        self.inner.get_catalog(catalog_name)
    }

    fn get_category(
        &self,
        catalog_name: &str,
        category_name: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError> {
        self.inner.get_category(catalog_name, category_name, language)
    }

    fn get_product(
        &self,
        catalog_name: &str,
        product_id: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError> {
        self.inner.get_product(catalog_name, product_id, language)
    }

    fn save_item(&self, item: &CatalogItem) -> Result<(), StorageError> {
        self.saved.borrow_mut().push(item.clone());
        self.inner.save_item(item)
    }
}

/// Schema wrapper that records which definitions were looked up.
pub struct RecordingSchema<S> {
    inner: S,
    lookups: RefCell<Vec<String>>,
}

impl<S> RecordingSchema<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.borrow().len()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl<S: SchemaResolver> SchemaResolver for RecordingSchema<S> {
    fn get_catalog_definition(
        &self,
        definition_name: &str,
    ) -> Result<Option<CatalogDefinition>, StorageError> {
        self.lookups.borrow_mut().push(definition_name.to_string());
        self.inner.get_catalog_definition(definition_name)
    }
}

#[derive(Default)]
pub struct RecordingCache {
    removed: RefCell<Vec<ItemId>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn removed(&self) -> Vec<ItemId> {
        self.removed.borrow().clone()
    }
}

impl CacheInvalidator for RecordingCache {
    fn remove_item(&self, item_id: ItemId) {
        self.removed.borrow_mut().push(item_id);
    }
}
