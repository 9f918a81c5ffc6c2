//! Data models for stored clients.

use serde::{Deserialize, Serialize};

use cmx_types::Observation;

/// The last known position of one client device.
///
/// Serialized with the short field names the map frontend reads
/// (`mac`, `seenEpoch`, `lat`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Database row ID.
    pub id: i64,
    /// Client MAC address.
    #[serde(rename = "mac")]
    pub device_mac: String,
    /// Epoch of the most recent accepted observation.
    #[serde(rename = "seenEpoch")]
    pub seen_at_epoch: i64,
    /// Sighting time as the access point reported it.
    #[serde(rename = "seenString")]
    pub seen_at_display: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Uncertainty radius in metres.
    #[serde(rename = "unc")]
    pub uncertainty: f64,
    pub manufacturer: Option<String>,
    #[serde(rename = "os")]
    pub operating_system: Option<String>,
    #[serde(rename = "ssid")]
    pub network_name: Option<String>,
    /// Floor labels of the reporting access point.
    #[serde(rename = "floors")]
    pub floor_labels: String,
}

/// A candidate state for one client, derived from a single observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpdate {
    pub device_mac: String,
    pub epoch: i64,
    pub display: String,
    pub latitude: f64,
    pub longitude: f64,
    pub uncertainty: f64,
    pub manufacturer: Option<String>,
    pub operating_system: Option<String>,
    pub network_name: Option<String>,
    pub floor_labels: String,
}

impl ClientUpdate {
    /// Create a ClientUpdate from an Observation.
    ///
    /// Returns `None` when the observation is not usable (no location, or a
    /// missing or zero epoch).
    pub fn from_observation(observation: &Observation, floors: &str) -> Option<Self> {
        if !observation.is_usable() {
            return None;
        }
        let location = observation.location.as_ref()?;
        let epoch = observation.seen_epoch?;

        Some(Self {
            device_mac: observation.client_mac.clone(),
            epoch,
            display: observation.seen_time.clone().unwrap_or_default(),
            latitude: location.lat,
            longitude: location.lng,
            uncertainty: location.unc,
            manufacturer: observation.manufacturer.clone(),
            operating_system: observation.os.clone(),
            network_name: observation.ssid.clone(),
            floor_labels: floors.to_string(),
        })
    }
}

/// Outcome of [`Store::reconcile`](crate::Store::reconcile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The update was newer than the stored state and has been written.
    Applied,
    /// The stored state is as new or newer; nothing was written.
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmx_types::Location;

    fn observation() -> Observation {
        Observation {
            client_mac: "aa:bb:cc:dd:ee:ff".into(),
            seen_time: Some("2014-09-15T22:23:52Z".into()),
            seen_epoch: Some(1410819832),
            ipv4: Some("/192.168.0.15".into()),
            ipv6: None,
            rssi: Some(41),
            ssid: Some("Cisco WiFi".into()),
            manufacturer: Some("Meraki".into()),
            os: Some("Linux".into()),
            location: Some(Location {
                lat: 37.77,
                lng: -122.38,
                unc: 15.1,
            }),
        }
    }

    #[test]
    fn test_from_observation_maps_fields() {
        let update = ClientUpdate::from_observation(&observation(), "5th floor").unwrap();
        assert_eq!(update.device_mac, "aa:bb:cc:dd:ee:ff");
        assert_eq!(update.epoch, 1410819832);
        assert_eq!(update.display, "2014-09-15T22:23:52Z");
        assert_eq!(update.latitude, 37.77);
        assert_eq!(update.longitude, -122.38);
        assert_eq!(update.uncertainty, 15.1);
        assert_eq!(update.manufacturer.as_deref(), Some("Meraki"));
        assert_eq!(update.operating_system.as_deref(), Some("Linux"));
        assert_eq!(update.network_name.as_deref(), Some("Cisco WiFi"));
        assert_eq!(update.floor_labels, "5th floor");
    }

    #[test]
    fn test_from_observation_missing_seen_time() {
        let mut obs = observation();
        obs.seen_time = None;
        let update = ClientUpdate::from_observation(&obs, "").unwrap();
        assert_eq!(update.display, "");
    }

    #[test]
    fn test_from_observation_unusable() {
        let mut no_location = observation();
        no_location.location = None;
        assert!(ClientUpdate::from_observation(&no_location, "").is_none());

        let mut zero_epoch = observation();
        zero_epoch.seen_epoch = Some(0);
        assert!(ClientUpdate::from_observation(&zero_epoch, "").is_none());

        let mut no_epoch = observation();
        no_epoch.seen_epoch = None;
        assert!(ClientUpdate::from_observation(&no_epoch, "").is_none());
    }

    #[test]
    fn test_client_record_json_names() {
        let record = ClientRecord {
            id: 1,
            device_mac: "aa:bb:cc:dd:ee:ff".into(),
            seen_at_epoch: 1000,
            seen_at_display: "then".into(),
            latitude: 1.0,
            longitude: 2.0,
            uncertainty: 3.0,
            manufacturer: None,
            operating_system: Some("iOS".into()),
            network_name: None,
            floor_labels: String::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(json["seenEpoch"], 1000);
        assert_eq!(json["seenString"], "then");
        assert_eq!(json["lat"], 1.0);
        assert_eq!(json["lng"], 2.0);
        assert_eq!(json["unc"], 3.0);
        assert_eq!(json["os"], "iOS");
        assert!(json["ssid"].is_null());
        assert_eq!(json["floors"], "");
    }
}
