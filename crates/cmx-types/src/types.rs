//! Core types for CMX location push payloads.

use core::fmt;

use serde::Deserialize;

use crate::error::{ParseError, ParseResult};

/// Protocol version accepted by default.
pub const SUPPORTED_VERSION: &str = "2.0";

/// The only event type the receiver understands.
pub const DEVICES_SEEN: &str = "DevicesSeen";

/// Outer envelope of a push request.
///
/// Every member is kept as raw JSON so that the receiver can decide, field
/// by field and in a fixed order, why a batch is refused. A member with the
/// wrong JSON type is a mismatch, not a parse failure. The `data` member is
/// decoded only once the envelope has been authenticated; see
/// [`Envelope::into_devices_seen`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    /// Shared secret configured in the vendor dashboard.
    pub secret: Option<serde_json::Value>,
    /// Protocol version, e.g. `"2.0"`.
    pub version: Option<serde_json::Value>,
    /// Event type, e.g. `"DevicesSeen"`.
    #[serde(rename = "type")]
    pub event_type: Option<serde_json::Value>,
    /// Event body.
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Decode an envelope from a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidJson`] if the body is not a JSON object.
    pub fn from_slice(body: &[u8]) -> ParseResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Decode the `data` member as a `DevicesSeen` event.
    ///
    /// Observations are decoded one by one; see [`Sighting`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] if `data` is absent or `null`,
    /// and [`ParseError::InvalidJson`] if it does not have the expected shape.
    pub fn into_devices_seen(self) -> ParseResult<DevicesSeen> {
        let data = self.data.ok_or(ParseError::MissingField("data"))?;
        Ok(serde_json::from_value(data)?)
    }
}

/// The string form of an envelope member, if it is a JSON string.
///
/// ```
/// use cmx_types::member_str;
/// use serde_json::json;
///
/// assert_eq!(member_str(Some(&json!("2.0"))), Some("2.0"));
/// assert_eq!(member_str(Some(&json!(2.0))), None);
/// assert_eq!(member_str(None), None);
/// ```
pub fn member_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value.and_then(serde_json::Value::as_str)
}

/// How an envelope member reads in a log line.
///
/// Strings are shown bare, other JSON values as JSON text, and a missing
/// member as the empty string.
pub fn member_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Body of a `DevicesSeen` event: everything one access point reported.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesSeen {
    /// MAC address of the reporting access point.
    #[serde(default)]
    pub ap_mac: String,
    /// Floor plan names the access point is placed on.
    #[serde(default)]
    pub ap_floors: Option<Vec<String>>,
    /// Client sightings, in the order the access point reported them.
    #[serde(default)]
    pub observations: Vec<Sighting>,
}

/// One entry of the `observations` list.
///
/// Entries are decoded independently, so one entry with an unexpected shape
/// (a `null` coordinate, a missing `clientMac`) does not cost the rest of
/// the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Sighting {
    /// The entry decoded as an [`Observation`].
    Observed(Observation),
    /// The entry could not be decoded; carries the decoder's reason.
    Malformed(String),
}

impl Sighting {
    /// The decoded observation, if any.
    pub fn observation(&self) -> Option<&Observation> {
        match self {
            Sighting::Observed(observation) => Some(observation),
            Sighting::Malformed(_) => None,
        }
    }
}

impl From<Observation> for Sighting {
    fn from(observation: Observation) -> Self {
        Sighting::Observed(observation)
    }
}

impl<'de> Deserialize<'de> for Sighting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value::<Observation>(value) {
            Ok(observation) => Sighting::Observed(observation),
            Err(e) => Sighting::Malformed(e.to_string()),
        })
    }
}

impl DevicesSeen {
    /// Floor labels of the access point, concatenated.
    ///
    /// Empty when the access point is not placed on any floor plan.
    ///
    /// ```
    /// use cmx_types::DevicesSeen;
    ///
    /// let data = DevicesSeen {
    ///     ap_floors: Some(vec!["HQ 1st".into(), "HQ 2nd".into()]),
    ///     ..Default::default()
    /// };
    /// assert_eq!(data.floors(), "HQ 1stHQ 2nd");
    /// assert_eq!(DevicesSeen::default().floors(), "");
    /// ```
    #[must_use]
    pub fn floors(&self) -> String {
        self.ap_floors
            .as_deref()
            .map(|floors| floors.concat())
            .unwrap_or_default()
    }
}

/// One client sighting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// MAC address of the client device.
    pub client_mac: String,
    /// Sighting time as reported, e.g. `"2014-05-15T15:48:14Z"`.
    #[serde(default)]
    pub seen_time: Option<String>,
    /// Sighting time in seconds since the Unix epoch.
    #[serde(default)]
    pub seen_epoch: Option<i64>,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    /// Received signal strength.
    #[serde(default)]
    pub rssi: Option<i32>,
    /// Network the client is associated with.
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    /// Position estimate. Absent when the client could not be located.
    #[serde(default)]
    pub location: Option<Location>,
}

impl Observation {
    /// Whether this sighting can update a client record.
    ///
    /// A sighting is usable only when it carries a location and a non-zero
    /// epoch.
    ///
    /// ```
    /// use cmx_types::{Location, Observation};
    ///
    /// let mut obs = Observation {
    ///     client_mac: "aa:bb:cc:dd:ee:ff".into(),
    ///     seen_epoch: Some(1000),
    ///     ..Default::default()
    /// };
    /// assert!(!obs.is_usable());
    ///
    /// obs.location = Some(Location { lat: 1.0, lng: 2.0, unc: 3.0 });
    /// assert!(obs.is_usable());
    ///
    /// obs.seen_epoch = Some(0);
    /// assert!(!obs.is_usable());
    /// ```
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.location.is_some() && self.seen_epoch.is_some_and(|epoch| epoch != 0)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string)
        }

        write!(
            f,
            "client={} seen={} epoch={} ipv4={} ipv6={} rssi={} ssid={} manufacturer={} os={} location={}",
            self.client_mac,
            opt(&self.seen_time),
            opt(&self.seen_epoch),
            opt(&self.ipv4),
            opt(&self.ipv6),
            opt(&self.rssi),
            opt(&self.ssid),
            opt(&self.manufacturer),
            opt(&self.os),
            opt(&self.location),
        )
    }
}

/// Position estimate of a client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Uncertainty radius in metres.
    pub unc: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} ±{}m", self.lat, self.lng, self.unc)
    }
}
