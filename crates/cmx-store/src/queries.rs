//! Query builder for stored clients.
//!
//! # Example
//!
//! ```
//! use cmx_store::{ClientQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let five_minutes_ago = OffsetDateTime::now_utc() - Duration::minutes(5);
//!
//! let query = ClientQuery::new().seen_after(five_minutes_ago);
//! let clients = store.query_clients(&query)?;
//! assert!(clients.is_empty());
//! # Ok::<(), cmx_store::Error>(())
//! ```

use time::OffsetDateTime;

/// Columns selected for a [`ClientRecord`](crate::ClientRecord), in row order.
pub(crate) const CLIENT_COLUMNS: &str = "id, device_mac, seen_epoch, seen_string, lat, lng, unc, \
     manufacturer, os, ssid, floors";

/// Query over stored clients.
///
/// Results are ordered by last sighting, newest first.
#[derive(Debug, Default, Clone)]
pub struct ClientQuery {
    /// Only clients whose last sighting is strictly after this time.
    pub seen_after: Option<OffsetDateTime>,
}

impl ClientQuery {
    /// Create a new query matching all clients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only clients seen strictly after `time`.
    pub fn seen_after(mut self, time: OffsetDateTime) -> Self {
        self.seen_after = Some(time);
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(after) = self.seen_after {
            conditions.push("seen_epoch > ?");
            params.push(Box::new(after.unix_timestamp()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();

        format!(
            "SELECT {} FROM clients {} ORDER BY seen_epoch DESC, id DESC",
            CLIENT_COLUMNS, where_clause
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_where_empty() {
        let (where_clause, params) = ClientQuery::new().build_where();
        assert!(where_clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_where_seen_after() {
        let after = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let (where_clause, params) = ClientQuery::new().seen_after(after).build_where();
        assert_eq!(where_clause, "WHERE seen_epoch > ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_build_sql_newest_first() {
        let sql = ClientQuery::new().build_sql();
        assert!(sql.contains("FROM clients"));
        assert!(sql.contains("ORDER BY seen_epoch DESC"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_build_sql_selects_all_columns() {
        let sql = ClientQuery::new().build_sql();
        for column in [
            "device_mac",
            "seen_epoch",
            "seen_string",
            "lat",
            "lng",
            "unc",
            "manufacturer",
            "os",
            "ssid",
            "floors",
        ] {
            assert!(sql.contains(column), "missing column {column}");
        }
    }
}
