use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS catalogs (
    catalog_name TEXT PRIMARY KEY,
    is_virtual INTEGER NOT NULL,
    base_catalogs BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS external_ids (
    item_id BLOB PRIMARY KEY CHECK (length(item_id) = 16),
    item_kind TEXT NOT NULL,
    catalog_name TEXT NOT NULL,
    category_name TEXT,
    product_id TEXT,
    variant_id TEXT
);

CREATE TABLE IF NOT EXISTS items (
    item_id BLOB PRIMARY KEY CHECK (length(item_id) = 16),
    item_kind TEXT NOT NULL,
    catalog_name TEXT NOT NULL REFERENCES catalogs (catalog_name),
    item_key TEXT NOT NULL,
    definition_name TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 0
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_items_key ON items (catalog_name, item_kind, item_key);

CREATE TABLE IF NOT EXISTS variants (
    item_id BLOB PRIMARY KEY CHECK (length(item_id) = 16),
    parent_id BLOB NOT NULL REFERENCES items (item_id),
    variant_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    UNIQUE (parent_id, variant_id)
);

CREATE TABLE IF NOT EXISTS properties (
    owner_id BLOB NOT NULL CHECK (length(owner_id) = 16),
    language TEXT NOT NULL DEFAULT '',
    property_name TEXT NOT NULL,
    inherited BLOB,
    local BLOB,
    read_only INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner_id, language, property_name)
);

CREATE TABLE IF NOT EXISTS definitions (
    definition_name TEXT NOT NULL,
    property_name TEXT NOT NULL,
    property_kind TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (definition_name, property_name)
);
";
