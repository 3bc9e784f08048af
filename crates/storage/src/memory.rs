use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use vcatalog_core::{CatalogDefinition, CatalogInfo, CatalogItem, ExternalIdInfo, ItemId, ItemKind};

use crate::error::StorageError;
use crate::traits::{CatalogDirectory, SchemaResolver};

#[derive(Default)]
struct MemoryState {
    catalogs: HashMap<String, CatalogInfo>,
    external_ids: HashMap<ItemId, ExternalIdInfo>,
    // (catalog, is_category, key) -> item
    items: HashMap<(String, bool, String), CatalogItem>,
    definitions: HashMap<String, CatalogDefinition>,
}

/// In-process catalog directory and schema store.
///
/// Items are cloned on load and replaced wholesale on save. Languages are
/// recorded on the returned item but not used for lookup.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<RwLock<MemoryState>>,
}

fn item_key(catalog_name: &str, kind: ItemKind, key: &str) -> (String, bool, String) {
    (
        catalog_name.to_string(),
        kind == ItemKind::Category,
        key.to_string(),
    )
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_catalog(&self, catalog: CatalogInfo) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;
        state.catalogs.insert(catalog.name.clone(), catalog);
        Ok(())
    }

    pub fn insert_definition(&self, definition: CatalogDefinition) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;
        state.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_external_id(&self, item_id: ItemId, info: ExternalIdInfo) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;
        state.external_ids.insert(item_id, info);
        Ok(())
    }

    /// Stores the item and registers external ids for it and its variants.
    pub fn insert_item(&self, item: CatalogItem) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;

        let info = match item.kind {
            ItemKind::Category => ExternalIdInfo::category(&item.catalog_name, &item.key),
            ItemKind::Product | ItemKind::ProductFamily => {
                ExternalIdInfo::product(item.kind, &item.catalog_name, &item.key)
            }
            other => {
                return Err(StorageError::ConstraintViolation(format!(
                    "cannot store a {other} as a catalog item"
                )));
            }
        };
        state.external_ids.insert(item.item_id, info);
        for variant in &item.variants {
            state.external_ids.insert(
                variant.item_id,
                ExternalIdInfo::variant(&item.catalog_name, &item.key, &variant.variant_id),
            );
        }
        state
            .items
            .insert(item_key(&item.catalog_name, item.kind, &item.key), item);
        Ok(())
    }

    fn load(
        &self,
        catalog_name: &str,
        kind: ItemKind,
        key: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;
        Ok(state
            .items
            .get(&item_key(catalog_name, kind, key))
            .cloned()
            .map(|item| item.with_language(language)))
    }
}

impl CatalogDirectory for MemoryCatalogStore {
    fn resolve_external_id(&self, item_id: ItemId) -> Result<Option<ExternalIdInfo>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;
        Ok(state.external_ids.get(&item_id).cloned())
    }

    fn get_catalog(&self, catalog_name: &str) -> Result<Option<CatalogInfo>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;
        Ok(state.catalogs.get(catalog_name).cloned())
    }

    fn get_category(
        &self,
        catalog_name: &str,
        category_name: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError> {
        self.load(catalog_name, ItemKind::Category, category_name, language)
    }

    fn get_product(
        &self,
        catalog_name: &str,
        product_id: &str,
        language: &str,
    ) -> Result<Option<CatalogItem>, StorageError> {
        self.load(catalog_name, ItemKind::Product, product_id, language)
    }

    fn save_item(&self, item: &CatalogItem) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::LockPoisoned("write"))?;
        let key = item_key(&item.catalog_name, item.kind, &item.key);
        match state.items.get_mut(&key) {
            Some(stored) if stored.item_id == item.item_id => {
                if stored.revision != item.revision {
                    return Err(StorageError::Conflict {
                        item_id: item.item_id,
                        expected: item.revision,
                        found: stored.revision,
                    });
                }
                stored.properties = item.properties.clone();
                stored.variants = item.variants.clone();
                stored.revision += 1;
                Ok(())
            }
            _ => Err(StorageError::NotFound(format!("catalog item {}", item.item_id))),
        }
    }
}

impl SchemaResolver for MemoryCatalogStore {
    fn get_catalog_definition(
        &self,
        definition_name: &str,
    ) -> Result<Option<CatalogDefinition>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;
        Ok(state.definitions.get(definition_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcatalog_core::{FieldValue, PropertyCell, Variant};

    #[test]
    fn category_and_product_keys_do_not_collide() -> Result<(), StorageError> {
        let store = MemoryCatalogStore::new();
        let category = CatalogItem::new(ItemId::new(), ItemKind::Category, "V", "Shoes", "Category");
        let product = CatalogItem::new(ItemId::new(), ItemKind::Product, "V", "Shoes", "Shoe");
        store.insert_item(category.clone())?;
        store.insert_item(product.clone())?;

        assert_eq!(store.get_category("V", "Shoes", "")?.map(|i| i.item_id), Some(category.item_id));
        assert_eq!(store.get_product("V", "Shoes", "")?.map(|i| i.item_id), Some(product.item_id));
        Ok(())
    }

    #[test]
    fn loads_are_copies_until_saved() -> Result<(), StorageError> {
        let store = MemoryCatalogStore::new();
        let family = CatalogItem::new(ItemId::new(), ItemKind::ProductFamily, "V", "P", "Shirt")
            .with_variant(
                Variant::new(ItemId::new(), "P-S")
                    .with_property("Size", PropertyCell::overridden("S", "XS")),
            );
        store.insert_item(family)?;

        let mut loaded = store.get_product("V", "P", "en-US")?.unwrap();
        assert_eq!(loaded.language, "en-US");
        loaded.variants[0].properties.clear_override("Size");
        let untouched = store.get_product("V", "P", "en-US")?.unwrap();
        assert_eq!(untouched.variants[0].effective("Size"), Some(&FieldValue::from("XS")));

        store.save_item(&loaded)?;
        let saved = store.get_product("V", "P", "en-US")?.unwrap();
        assert_eq!(saved.variants[0].effective("Size"), Some(&FieldValue::from("S")));
        Ok(())
    }

    #[test]
    fn variants_resolve_to_parent_coordinates() -> Result<(), StorageError> {
        let store = MemoryCatalogStore::new();
        let variant_id = ItemId::new();
        let family = CatalogItem::new(ItemId::new(), ItemKind::ProductFamily, "V", "P", "Shirt")
            .with_variant(Variant::new(variant_id, "P-M"));
        store.insert_item(family)?;
        let info = store.resolve_external_id(variant_id)?.unwrap();
        assert_eq!(info.product_id.as_deref(), Some("P"));
        assert_eq!(info.variant_id.as_deref(), Some("P-M"));
        Ok(())
    }

    #[test]
    fn stale_save_is_rejected() -> Result<(), StorageError> {
        let store = MemoryCatalogStore::new();
        let item = CatalogItem::new(ItemId::new(), ItemKind::Product, "V", "P", "Shirt")
            .with_property("Color", PropertyCell::overridden("Blue", "Black"))
            .with_property("Size", PropertyCell::overridden("M", "L"));
        store.insert_item(item)?;

        let mut first = store.get_product("V", "P", "en-US")?.unwrap();
        let mut second = store.get_product("V", "P", "en-US")?.unwrap();
        second.properties.clear_override("Color");
        store.save_item(&second)?;

        first.properties.clear_override("Size");
        assert!(matches!(
            store.save_item(&first),
            Err(StorageError::Conflict { expected: 0, found: 1, .. })
        ));

        let stored = store.get_product("V", "P", "en-US")?.unwrap();
        assert_eq!(stored.effective("Color"), Some(&FieldValue::from("Blue")));
        assert!(stored.properties.is_overridden("Size"));
        assert_eq!(stored.revision, 1);
        Ok(())
    }

    #[test]
    fn saving_unknown_item_fails() {
        let store = MemoryCatalogStore::new();
        let item = CatalogItem::new(ItemId::new(), ItemKind::Product, "V", "Ghost", "Shirt");
        assert!(matches!(store.save_item(&item), Err(StorageError::NotFound(_))));
    }
}
