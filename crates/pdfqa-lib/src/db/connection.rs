use std::path::Path;

use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::schema::apply_migrations;

/// Open (or create) an index database and bring its schema up to date.
pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open index database {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    apply_migrations(&mut conn)?;
    debug!(path = %path.display(), "Opened index database");
    Ok(conn)
}

/// Open an existing index database without creating or migrating it.
pub fn open_db_read_only(path: &Path) -> anyhow::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open index database {}", path.display()))
}
