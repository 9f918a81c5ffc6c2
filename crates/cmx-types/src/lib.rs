//! Wire types for the Meraki CMX location push API.
//!
//! The vendor cloud periodically POSTs a JSON document per access point
//! listing the clients it has seen. This crate models that document so the
//! receiver and the store can share one definition.
//!
//! # Example
//!
//! ```
//! use cmx_types::{DEVICES_SEEN, Envelope, member_str};
//!
//! let body = br#"{
//!     "secret": "s1",
//!     "version": "2.0",
//!     "type": "DevicesSeen",
//!     "data": {"apMac": "00:18:0a:13:dd:b0", "observations": []}
//! }"#;
//!
//! let envelope = Envelope::from_slice(body)?;
//! assert_eq!(member_str(envelope.event_type.as_ref()), Some(DEVICES_SEEN));
//! let data = envelope.into_devices_seen()?;
//! assert!(data.observations.is_empty());
//! # Ok::<(), cmx_types::ParseError>(())
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    DEVICES_SEEN, DevicesSeen, Envelope, Location, Observation, SUPPORTED_VERSION, Sighting,
    member_str, member_text,
};
