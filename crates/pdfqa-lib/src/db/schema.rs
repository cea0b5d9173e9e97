use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

/// Define all schema migrations.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // v1: chunk store and build metadata
        M::up(
            "CREATE TABLE chunks (
                id             INTEGER PRIMARY KEY,
                source_name    TEXT NOT NULL,
                page_number    INTEGER,
                chunk_index    INTEGER NOT NULL,
                start_offset   INTEGER NOT NULL,
                text           TEXT NOT NULL,
                header         TEXT NOT NULL DEFAULT '',
                title          TEXT NOT NULL DEFAULT '',
                author         TEXT NOT NULL DEFAULT '',
                subject        TEXT NOT NULL DEFAULT '',
                creation_date  TEXT NOT NULL DEFAULT '',
                mod_date       TEXT NOT NULL DEFAULT '',
                embedding      BLOB NOT NULL
            );

            CREATE INDEX idx_chunks_source
                ON chunks(source_name, page_number, chunk_index);

            CREATE TABLE index_meta (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            );",
        ),
    ])
}

/// Apply all pending migrations to the database.
pub fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    migrations()
        .to_latest(conn)
        .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {e}"))?;
    Ok(())
}
