use thiserror::Error;
use vcatalog_core::{CoreError, ItemId, ItemKind};
use vcatalog_storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(String),
}

/// Expected reasons a revert request is refused. None of these mutate anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevertFailure {
    #[error("a value must be provided for the item id")]
    InvalidArgument,

    #[error(
        "item {item_id} does not represent a category, product, or variant (kind = {})",
        kind_label(.kind)
    )]
    UnsupportedItemKind {
        item_id: ItemId,
        kind: Option<ItemKind>,
    },

    #[error("catalog item {item_id} does not belong to a virtual catalog (catalog = \"{catalog_name}\")")]
    NotVirtualCatalog {
        item_id: ItemId,
        catalog_name: String,
    },

    #[error(
        "catalog item could not be found (kind = {kind}, catalog = \"{catalog_name}\", category = {category:?}, product = {product:?}, variant = {variant:?}, language = \"{language}\")"
    )]
    ItemNotFound {
        kind: ItemKind,
        catalog_name: String,
        category: Option<String>,
        product: Option<String>,
        variant: Option<String>,
        language: String,
    },
}

fn kind_label(kind: &Option<ItemKind>) -> &'static str {
    kind.as_ref().map_or("unresolved", ItemKind::as_str)
}
