//! SQL DDL for the dictionary database.
//!
//! Defines the `entries` table (one JSON record per word) and `schema_meta`.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization. Tables added
//! after v1 live in [`super::migrations`].

use rusqlite::Connection;

/// Version-1 schema: the entry records and the metadata table.
const SCHEMA_SQL: &str = r#"
-- One row per dictionary word; `record` is the serialized entry
CREATE TABLE IF NOT EXISTS entries (
    word TEXT PRIMARY KEY,
    record TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize the v1 schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
