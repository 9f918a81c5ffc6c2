//! Application state shared across handlers.
//!
//! The [`Store`] sits behind an async mutex: rusqlite connections are not
//! `Sync`, and holding the lock for a whole batch makes the handler the
//! single writer. Each reconcile is also a conditional upsert, so a record
//! can never move back to an older epoch even if the store is shared
//! differently later.

use std::sync::Arc;

use cmx_store::Store;
use tokio::sync::Mutex;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The client store.
    pub store: Mutex<Store>,
    /// Configuration, fixed at startup.
    pub config: Config,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmx_store::{ClientUpdate, Reconciled};

    fn create_test_update(epoch: i64) -> ClientUpdate {
        ClientUpdate {
            device_mac: "aa:bb:cc:dd:ee:ff".to_string(),
            epoch,
            display: epoch.to_string(),
            latitude: epoch as f64,
            longitude: 0.0,
            uncertainty: 1.0,
            manufacturer: None,
            operating_system: None,
            network_name: None,
            floor_labels: String::new(),
        }
    }

    #[tokio::test]
    async fn test_app_state_new() {
        let store = Store::open_in_memory().unwrap();
        let state = AppState::new(store, Config::default());

        assert_eq!(state.config.server.port, 4567);
        let store = state.store.lock().await;
        assert_eq!(store.count_clients().unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconciles_keep_newest() {
        let store = Store::open_in_memory().unwrap();
        let state = AppState::new(store, Config::default());

        // Interleave old and new epochs across tasks.
        let epochs: Vec<i64> = (1..=200).map(|i| (i * 7919) % 1000 + 1).collect();
        let max = *epochs.iter().max().unwrap();

        let handles: Vec<_> = epochs
            .into_iter()
            .map(|epoch| {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let store = state.store.lock().await;
                    store.reconcile(&create_test_update(epoch)).unwrap()
                })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() == Reconciled::Applied {
                applied += 1;
            }
        }
        assert!(applied >= 1);

        let store = state.store.lock().await;
        let client = store.get_client("aa:bb:cc:dd:ee:ff").unwrap().unwrap();
        assert_eq!(client.seen_at_epoch, max);
        assert_eq!(client.latitude, max as f64);
        assert_eq!(store.count_clients().unwrap(), 1);
    }
}
