//! Error types for payload parsing in cmx-types.

use thiserror::Error;

/// Errors that can occur when decoding a CMX push payload.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The body is not valid JSON or is not a JSON object.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The envelope has no `data` member.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Result type alias using cmx-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
