//! Applying an accepted batch to the store.

use serde::Serialize;
use tracing::{debug, info};

use cmx_store::{ClientUpdate, Reconciled, Store};
use cmx_types::{DevicesSeen, Sighting};

/// What happened to the observations of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Observations in the batch.
    pub observations: usize,
    /// Observations that updated or created a client.
    pub applied: usize,
    /// Usable observations that were not newer than the stored state.
    pub ignored: usize,
    /// Observations that were malformed or had no location or epoch.
    pub skipped: usize,
}

/// Reconcile every usable observation of `data`, in list order.
///
/// Stops at the first store failure; observations applied before it stay
/// applied.
pub fn process_batch(store: &Store, data: &DevicesSeen) -> cmx_store::Result<IngestSummary> {
    let floors = data.floors();
    let mut summary = IngestSummary {
        observations: data.observations.len(),
        ..Default::default()
    };

    for sighting in &data.observations {
        let observation = match sighting {
            Sighting::Observed(observation) => observation,
            Sighting::Malformed(reason) => {
                debug!("Skipping malformed observation: {}", reason);
                summary.skipped += 1;
                continue;
            }
        };

        let Some(update) = ClientUpdate::from_observation(observation, &floors) else {
            debug!("Skipping {}: no location or epoch", observation.client_mac);
            summary.skipped += 1;
            continue;
        };

        info!("AP {} on {:?}: {}", data.ap_mac, floors, observation);

        match store.reconcile(&update)? {
            Reconciled::Applied => summary.applied += 1,
            Reconciled::Ignored => summary.ignored += 1,
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmx_types::{Location, Observation};

    fn observation(mac: &str, epoch: Option<i64>, lat: Option<f64>) -> Observation {
        Observation {
            client_mac: mac.to_string(),
            seen_time: Some(format!("t{}", epoch.unwrap_or_default())),
            seen_epoch: epoch,
            location: lat.map(|lat| Location {
                lat,
                lng: 2.0,
                unc: 3.0,
            }),
            ..Default::default()
        }
    }

    fn batch(observations: Vec<Observation>) -> DevicesSeen {
        DevicesSeen {
            ap_mac: "00:18:0a:13:dd:b0".to_string(),
            ap_floors: Some(vec!["HQ>1st".to_string()]),
            observations: observations.into_iter().map(Sighting::from).collect(),
        }
    }

    #[test]
    fn test_empty_batch() {
        let store = Store::open_in_memory().unwrap();
        let summary = process_batch(&store, &batch(vec![])).unwrap();
        assert_eq!(summary, IngestSummary::default());
    }

    #[test]
    fn test_unusable_observations_never_touch_store() {
        let store = Store::open_in_memory().unwrap();
        let data = batch(vec![
            observation("no-location", Some(1000), None),
            observation("zero-epoch", Some(0), Some(1.0)),
            observation("no-epoch", None, Some(1.0)),
        ]);

        let summary = process_batch(&store, &data).unwrap();
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.applied, 0);
        assert_eq!(store.count_clients().unwrap(), 0);
    }

    #[test]
    fn test_malformed_observation_skipped_alone() {
        let store = Store::open_in_memory().unwrap();
        let mut data = batch(vec![observation("good", Some(1000), Some(1.0))]);
        data.observations
            .push(Sighting::Malformed("invalid type: null, expected f64".to_string()));
        data.observations
            .push(observation("later", Some(2000), Some(2.0)).into());

        let summary = process_batch(&store, &data).unwrap();
        assert_eq!(summary.observations, 3);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.get_client("good").unwrap().unwrap().seen_at_epoch, 1000);
        assert_eq!(store.get_client("later").unwrap().unwrap().latitude, 2.0);
    }

    #[test]
    fn test_unusable_observation_does_not_mutate_existing() {
        let store = Store::open_in_memory().unwrap();
        process_batch(&store, &batch(vec![observation("aa", Some(1000), Some(1.0))])).unwrap();

        let mut unlocated = observation("aa", Some(5000), None);
        unlocated.manufacturer = Some("Changed".to_string());
        process_batch(&store, &batch(vec![unlocated])).unwrap();

        let client = store.get_client("aa").unwrap().unwrap();
        assert_eq!(client.seen_at_epoch, 1000);
        assert_eq!(client.manufacturer, None);
    }

    #[test]
    fn test_batch_order_decides_winner() {
        let store = Store::open_in_memory().unwrap();
        let data = batch(vec![
            observation("aa", Some(1000), Some(1.0)),
            observation("aa", Some(3000), Some(3.0)),
            observation("aa", Some(2000), Some(2.0)),
            observation("aa", Some(3000), Some(4.0)),
        ]);

        let summary = process_batch(&store, &data).unwrap();
        assert_eq!(summary.observations, 4);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.ignored, 2);

        let client = store.get_client("aa").unwrap().unwrap();
        assert_eq!(client.seen_at_epoch, 3000);
        assert_eq!(client.latitude, 3.0);
    }

    #[test]
    fn test_floors_recorded() {
        let store = Store::open_in_memory().unwrap();
        process_batch(&store, &batch(vec![observation("aa", Some(1000), Some(1.0))])).unwrap();
        assert_eq!(store.get_client("aa").unwrap().unwrap().floor_labels, "HQ>1st");

        let mut no_floors = batch(vec![observation("bb", Some(1000), Some(1.0))]);
        no_floors.ap_floors = None;
        process_batch(&store, &no_floors).unwrap();
        assert_eq!(store.get_client("bb").unwrap().unwrap().floor_labels, "");
    }

    #[test]
    fn test_replayed_batch_is_ignored() {
        let store = Store::open_in_memory().unwrap();
        let data = batch(vec![
            observation("aa", Some(1000), Some(1.0)),
            observation("bb", Some(1000), Some(1.0)),
        ]);

        let first = process_batch(&store, &data).unwrap();
        let second = process_batch(&store, &data).unwrap();
        assert_eq!(first.applied, 2);
        assert_eq!(second.applied, 0);
        assert_eq!(second.ignored, 2);
    }
}
