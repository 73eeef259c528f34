//! Versioned schema for the hash tree database.
//!
//! `MIGRATIONS[n]` upgrades the schema from version `n` to `n + 1`. Applied
//! versions are recorded in `schema_migrations`.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Migration v1: the hash tree table.
///
/// One row per tree node. The empty string marks a level the node does not
/// have: NULLs never collide under a UNIQUE constraint, empty strings do.
const V1_CVR_HASHES: &str = r#"
    CREATE TABLE cvr_hashes (
        cvr_id_level_1_prefix TEXT NOT NULL
            CHECK (length(cvr_id_level_1_prefix) IN (0, 1)),
        cvr_id_level_2_prefix TEXT NOT NULL
            CHECK (length(cvr_id_level_2_prefix) IN (0, 2)),
        cvr_id TEXT NOT NULL
            CHECK (length(cvr_id) IN (0, 36)),
        cvr_hash TEXT NOT NULL
            CHECK (length(cvr_hash) = 64)
    );

    CREATE UNIQUE INDEX idx_cvr_hashes_node
        ON cvr_hashes (cvr_id_level_1_prefix, cvr_id_level_2_prefix, cvr_id);
"#;

const MIGRATIONS: &[&str] = &[V1_CVR_HASHES];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )?;

    let applied = schema_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {} is newer than this build supports ({})",
            applied, CURRENT_VERSION
        )));
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(applied as usize) {
        let version = index as u32 + 1;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
        tracing::debug!(version, "applied schema migration");
    }
    tx.commit()?;

    Ok(())
}

/// Highest applied schema version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}
