use thiserror::Error;

use vcatalog_core::ItemId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("item {item_id} changed since it was loaded (loaded revision {expected}, stored revision {found})")]
    Conflict {
        item_id: ItemId,
        expected: u64,
        found: u64,
    },

    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("core error: {0}")]
    Core(#[from] vcatalog_core::CoreError),
}
