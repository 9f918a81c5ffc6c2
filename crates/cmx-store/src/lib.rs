//! Latest-position persistence for Meraki CMX client observations.
//!
//! This crate keeps exactly one record per client MAC address: the most
//! recent position the location push API reported for it. Older or replayed
//! observations never overwrite newer ones.
//!
//! # Features
//!
//! - One row per client, created on the first accepted observation
//! - Compare-and-set update keyed on the observation epoch
//! - Recent-client queries over a sliding time window
//! - Explicit, versioned schema creation at open time
//!
//! # Example
//!
//! ```
//! use cmx_store::{ClientUpdate, Reconciled, Store};
//!
//! let store = Store::open_in_memory()?;
//!
//! let update = ClientUpdate {
//!     device_mac: "aa:bb:cc:dd:ee:ff".into(),
//!     epoch: 1000,
//!     display: "1970-01-01T00:16:40Z".into(),
//!     latitude: 1.0,
//!     longitude: 2.0,
//!     uncertainty: 3.0,
//!     manufacturer: None,
//!     operating_system: None,
//!     network_name: None,
//!     floor_labels: String::new(),
//! };
//!
//! assert_eq!(store.reconcile(&update)?, Reconciled::Applied);
//! assert_eq!(store.reconcile(&update)?, Reconciled::Ignored);
//!
//! let client = store.get_client("aa:bb:cc:dd:ee:ff")?.unwrap();
//! assert_eq!(client.seen_at_epoch, 1000);
//! # Ok::<(), cmx_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{ClientRecord, ClientUpdate, Reconciled};
pub use queries::ClientQuery;
pub use store::{RECENT_WINDOW_SECS, Store};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/cmx/clients.db`
/// - macOS: `~/Library/Application Support/cmx/clients.db`
/// - Windows: `C:\Users\<user>\AppData\Local\cmx\clients.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("cmx")
        .join("clients.db")
}
