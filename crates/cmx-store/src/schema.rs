//! Database schema and migrations.
//!
//! The schema is created or upgraded once, when a [`Store`](crate::Store) is
//! opened. Request handling never touches DDL.
//!
//! The applied version lives in SQLite's `user_version` header field.
//! `MIGRATIONS[n]` takes a database from version `n` to `n + 1`.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

const MIGRATIONS: &[&str] = &[
    // 1: latest known position, one row per client MAC
    r#"
    CREATE TABLE clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_mac TEXT NOT NULL UNIQUE,
        seen_epoch INTEGER NOT NULL DEFAULT 0,
        seen_string TEXT NOT NULL DEFAULT '',
        lat REAL NOT NULL,
        lng REAL NOT NULL,
        unc REAL NOT NULL,
        manufacturer TEXT,
        os TEXT,
        ssid TEXT,
        floors TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX idx_clients_seen_epoch ON clients(seen_epoch);
    "#,
];

/// Schema version this build writes.
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// Each pending migration runs in its own transaction together with the
/// version bump. A database from a newer build is refused untouched.
pub fn initialize(conn: &Connection) -> Result<()> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    for (from, sql) in MIGRATIONS.iter().enumerate().skip(found.max(0) as usize) {
        let to = from as i32 + 1;
        info!("Migrating schema to version {}", to);

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", to)?;
        tx.commit()?;
    }

    Ok(())
}

fn user_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
