//! Batch-level validation of location pushes.
//!
//! A push is accepted only if every check passes; checks run in a fixed
//! order and the first failure decides the [`Rejection`]:
//!
//! 1. the `Content-Type` header declares JSON
//! 2. the body is a JSON object
//! 3. `secret` matches the configured shared secret
//! 4. `version` matches the configured protocol version
//! 5. `type` is `DevicesSeen`
//! 6. `data` has the `DevicesSeen` shape

use axum::http::{HeaderMap, header::CONTENT_TYPE};
use subtle::ConstantTimeEq;

use cmx_types::{DEVICES_SEEN, DevicesSeen, Envelope, member_str, member_text};

use crate::config::ReceiverConfig;

/// Why a push was refused. Each variant carries the offending value.
///
/// Envelope members that are not JSON strings are carried as JSON text,
/// and a missing member as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The `Content-Type` header is missing or does not name JSON.
    #[error("content type {0:?} is not JSON")]
    BadContentType(String),

    /// The body is not a JSON object, or `data` is missing or has the wrong
    /// shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The `secret` member does not match the configured secret.
    #[error("bad secret {0:?}")]
    BadSecret(String),

    /// The `version` member is not the configured protocol version.
    #[error("unsupported version {0:?}")]
    UnsupportedVersion(String),

    /// The `type` member is not `DevicesSeen`.
    #[error("unsupported event type {0:?}")]
    UnsupportedEventType(String),
}

/// Check a raw push and return its event body.
pub fn validate_batch(
    headers: &HeaderMap,
    body: &[u8],
    config: &ReceiverConfig,
) -> Result<DevicesSeen, Rejection> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    if !is_json_content_type(&content_type) {
        return Err(Rejection::BadContentType(content_type));
    }

    let envelope =
        Envelope::from_slice(body).map_err(|e| Rejection::MalformedPayload(e.to_string()))?;

    let secret = envelope.secret.as_ref();
    let secret_matches = member_str(secret)
        .is_some_and(|secret| bool::from(secret.as_bytes().ct_eq(config.secret.as_bytes())));
    if !secret_matches {
        return Err(Rejection::BadSecret(member_text(secret)));
    }

    let version = envelope.version.as_ref();
    if member_str(version) != Some(config.version.as_str()) {
        return Err(Rejection::UnsupportedVersion(member_text(version)));
    }

    let event_type = envelope.event_type.as_ref();
    if member_str(event_type) != Some(DEVICES_SEEN) {
        return Err(Rejection::UnsupportedEventType(member_text(event_type)));
    }

    envelope
        .into_devices_seen()
        .map_err(|e| Rejection::MalformedPayload(e.to_string()))
}

/// Whether a `Content-Type` value names JSON.
///
/// Accepts `application/json` and any `+json` structured syntax suffix,
/// with or without parameters.
///
/// ```
/// use cmx_receiver::validator::is_json_content_type;
///
/// assert!(is_json_content_type("application/json"));
/// assert!(is_json_content_type("Application/JSON; charset=utf-8"));
/// assert!(is_json_content_type("application/vnd.api+json"));
/// assert!(!is_json_content_type("application/x-www-form-urlencoded"));
/// assert!(!is_json_content_type(""));
/// ```
pub fn is_json_content_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
