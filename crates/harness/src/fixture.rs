use tempfile::TempDir;

use vcatalog_core::{
    CatalogDefinition, CatalogInfo, CatalogItem, ItemId, ItemKind, PropertyCell, Variant,
};
use vcatalog_engine::{RevertConfig, Reverter};
use vcatalog_storage::{CatalogDirectory, SqliteCatalogStore, StorageError};

use crate::recording::{RecordingCache, RecordingDirectory, RecordingSchema};

pub const BASE_CATALOG: &str = "Adventure Works";
pub const VIRTUAL_CATALOG: &str = "Adventure Works Online";
pub const LANGUAGE: &str = "en-US";

pub type TestReverter<'a> = Reverter<
    RecordingDirectory<&'a SqliteCatalogStore>,
    RecordingSchema<&'a SqliteCatalogStore>,
    RecordingCache,
>;

/// A SQLite catalog store seeded with one base and one virtual catalog.
pub struct TestCatalog {
    pub store: SqliteCatalogStore,
    _dir: Option<TempDir>,
}

impl TestCatalog {
    pub fn new() -> Result<Self, StorageError> {
        Self::seed(SqliteCatalogStore::open_in_memory()?, None)
    }

    /// Same as `new` but backed by a database file in a temporary directory.
    pub fn on_disk() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.db");
        let path = path.to_str().ok_or("non-utf8 temp path")?;
        let store = SqliteCatalogStore::open(path)?;
        Ok(Self::seed(store, Some(dir))?)
    }

    fn seed(mut store: SqliteCatalogStore, dir: Option<TempDir>) -> Result<Self, StorageError> {
        store.insert_catalog(&CatalogInfo::base(BASE_CATALOG))?;
        store.insert_catalog(&CatalogInfo::virtual_over(VIRTUAL_CATALOG, &[BASE_CATALOG]))?;
        Ok(Self { store, _dir: dir })
    }

    pub fn define(&mut self, definition: CatalogDefinition) -> Result<(), StorageError> {
        self.store.insert_definition(&definition)
    }

    pub fn add_item(&mut self, item: CatalogItem) -> Result<ItemId, StorageError> {
        let item_id = item.item_id;
        self.store.insert_item(&item)?;
        Ok(item_id)
    }

    pub fn add_category(
        &mut self,
        name: &str,
        definition: &str,
        properties: Vec<(&str, PropertyCell)>,
    ) -> Result<ItemId, StorageError> {
        let item = with_cells(
            CatalogItem::new(ItemId::new(), ItemKind::Category, VIRTUAL_CATALOG, name, definition),
            properties,
        );
        self.add_item(item)
    }

    pub fn add_product(
        &mut self,
        product_id: &str,
        definition: &str,
        properties: Vec<(&str, PropertyCell)>,
    ) -> Result<ItemId, StorageError> {
        let item = with_cells(
            CatalogItem::new(ItemId::new(), ItemKind::Product, VIRTUAL_CATALOG, product_id, definition),
            properties,
        );
        self.add_item(item)
    }

    /// Adds a product family; returns the family id and the variant ids in order.
    pub fn add_family(
        &mut self,
        product_id: &str,
        definition: &str,
        properties: Vec<(&str, PropertyCell)>,
        variants: Vec<(&str, Vec<(&str, PropertyCell)>)>,
    ) -> Result<(ItemId, Vec<ItemId>), StorageError> {
        let mut item = with_cells(
            CatalogItem::new(
                ItemId::new(),
                ItemKind::ProductFamily,
                VIRTUAL_CATALOG,
                product_id,
                definition,
            ),
            properties,
        );
        let mut variant_ids = Vec::new();
        for (variant_id, cells) in variants {
            let mut variant = Variant::new(ItemId::new(), variant_id);
            for (name, cell) in cells {
                variant.properties.insert(name, cell);
            }
            variant_ids.push(variant.item_id);
            item.variants.push(variant);
        }
        let family_id = self.add_item(item)?;
        Ok((family_id, variant_ids))
    }

    pub fn product(&self, product_id: &str) -> Result<Option<CatalogItem>, StorageError> {
        self.store.get_product(VIRTUAL_CATALOG, product_id, LANGUAGE)
    }

    pub fn category(&self, name: &str) -> Result<Option<CatalogItem>, StorageError> {
        self.store.get_category(VIRTUAL_CATALOG, name, LANGUAGE)
    }

    pub fn reverter(&self) -> TestReverter<'_> {
        self.reverter_with(RevertConfig::default())
    }

    pub fn reverter_with(&self, config: RevertConfig) -> TestReverter<'_> {
        Reverter::with_config(
            RecordingDirectory::new(&self.store),
            RecordingSchema::new(&self.store),
            RecordingCache::new(),
            config,
        )
    }
}

fn with_cells(mut item: CatalogItem, cells: Vec<(&str, PropertyCell)>) -> CatalogItem {
    for (name, cell) in cells {
        item.properties.insert(name, cell);
    }
    item
}
