//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{ClientRecord, ClientUpdate, Reconciled};
use crate::queries::{CLIENT_COLUMNS, ClientQuery};
use crate::schema;

/// Width of the "currently present" window used by [`Store::recent_clients`].
pub const RECENT_WINDOW_SECS: i64 = 300;

/// Insert a new client or overwrite an existing one, but only when the
/// incoming epoch is strictly newer. The row count tells the caller which
/// branch was taken: 1 for insert/update, 0 when the WHERE guard refused.
const UPSERT_CLIENT: &str = "INSERT INTO clients (device_mac, seen_epoch, seen_string, lat, lng, unc,
         manufacturer, os, ssid, floors)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT(device_mac) DO UPDATE SET
        seen_epoch = excluded.seen_epoch,
        seen_string = excluded.seen_string,
        lat = excluded.lat,
        lng = excluded.lng,
        unc = excluded.unc,
        manufacturer = excluded.manufacturer,
        os = excluded.os,
        ssid = excluded.ssid,
        floors = excluded.floors
     WHERE excluded.seen_epoch > clients.seen_epoch";

/// SQLite-based store for the latest known client positions.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<ClientRecord> {
    Ok(ClientRecord {
        id: row.get(0)?,
        device_mac: row.get(1)?,
        seen_at_epoch: row.get(2)?,
        seen_at_display: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        uncertainty: row.get(6)?,
        manufacturer: row.get(7)?,
        operating_system: row.get(8)?,
        network_name: row.get(9)?,
        floor_labels: row.get(10)?,
    })
}

// Reconcile
impl Store {
    /// Apply `update` if it is newer than what is stored for its client.
    ///
    /// A client that has never been seen has an implicit epoch of 0, so any
    /// positive epoch creates the record. An update whose epoch is equal to
    /// or older than the stored one is [`Reconciled::Ignored`] and leaves the
    /// row untouched. Position, timestamps and metadata are replaced together
    /// in a single statement, so the comparison and the write cannot be
    /// separated by another writer.
    pub fn reconcile(&self, update: &ClientUpdate) -> Result<Reconciled> {
        if update.epoch <= 0 {
            debug!(
                "Ignoring {} at epoch {}: not after baseline",
                update.device_mac, update.epoch
            );
            return Ok(Reconciled::Ignored);
        }

        let changed = self.conn.execute(
            UPSERT_CLIENT,
            rusqlite::params![
                update.device_mac,
                update.epoch,
                update.display,
                update.latitude,
                update.longitude,
                update.uncertainty,
                update.manufacturer,
                update.operating_system,
                update.network_name,
                update.floor_labels,
            ],
        )?;

        if changed == 0 {
            debug!(
                "Ignoring {} at epoch {}: stored state is as new or newer",
                update.device_mac, update.epoch
            );
            Ok(Reconciled::Ignored)
        } else {
            debug!("Applied {} at epoch {}", update.device_mac, update.epoch);
            Ok(Reconciled::Applied)
        }
    }
}

// Client queries
impl Store {
    /// Get a client by MAC address.
    pub fn get_client(&self, device_mac: &str) -> Result<Option<ClientRecord>> {
        let sql = format!("SELECT {} FROM clients WHERE device_mac = ?", CLIENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let client = stmt.query_row([device_mac], client_from_row).optional()?;

        Ok(client)
    }

    /// Query clients with filters.
    pub fn query_clients(&self, query: &ClientQuery) -> Result<Vec<ClientRecord>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let clients = stmt
            .query_map(params_ref.as_slice(), client_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    /// Clients seen within the last [`RECENT_WINDOW_SECS`] seconds.
    pub fn recent_clients(&self) -> Result<Vec<ClientRecord>> {
        self.recent_clients_at(OffsetDateTime::now_utc())
    }

    /// Clients seen within [`RECENT_WINDOW_SECS`] seconds before `now`.
    ///
    /// The window is open at its start: a client last seen exactly
    /// `RECENT_WINDOW_SECS` seconds before `now` is not included.
    pub fn recent_clients_at(&self, now: OffsetDateTime) -> Result<Vec<ClientRecord>> {
        let query = ClientQuery::new().seen_after(now - Duration::seconds(RECENT_WINDOW_SECS));
        self.query_clients(&query)
    }

    /// Count stored clients.
    pub fn count_clients(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;

        Ok(count as u64)
    }
}
