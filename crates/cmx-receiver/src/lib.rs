//! Receiver for Meraki CMX location pushes.
//!
//! This crate provides a service that:
//! - Answers the dashboard's validator handshake
//! - Accepts `DevicesSeen` batches pushed by the access points
//! - Keeps the most recent position of every client in a local database
//! - Serves those positions to a map frontend
//!
//! # Endpoints
//!
//! - `GET /` - Map frontend
//! - `GET /api/health` - Service health check
//! - `GET /events` - Validator token
//! - `POST /events` - Location push
//! - `GET /clients/{mac}` - Last known position of one client, or `{}`
//! - `GET /clients` - Clients seen in the last five minutes
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/cmx/receiver.toml`:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 4567
//!
//! [storage]
//! path = "~/.local/share/cmx/clients.db"
//!
//! [receiver]
//! secret = "shared-secret-from-the-dashboard"
//! validator = "0123456789abcdef0123456789abcdef01234567"
//! version = "2.0"
//! ```
//!
//! Pushes that fail any check are dropped with a warning and still answered
//! with `200 OK`; see [`validator`] for the order of checks.

pub mod api;
pub mod config;
pub mod ingest;
pub mod state;
pub mod validator;

pub use config::{Config, ConfigError, ReceiverConfig, ServerConfig, StorageConfig};
pub use ingest::IngestSummary;
pub use state::AppState;
pub use validator::Rejection;
