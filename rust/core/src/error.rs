//! Error types shared by the NetWatch crates.

use std::net::SocketAddr;

use thiserror::Error;
use uuid::Uuid;

/// Result type for NetWatch core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the monitoring core.
///
/// Protocol unavailability is deliberately not represented here: the SNMP
/// client reports it as an empty result so that pollers degrade instead of
/// aborting. Only failures the caller must act on become errors.
#[derive(Error, Debug)]
pub enum Error {
    /// A session could not be established towards an agent.
    #[error("session setup failed for {address}: {source}")]
    SessionSetup {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Endpoint credential does not match the configured protocol version.
    #[error("invalid credential for {version}: {reason}")]
    CredentialMismatch { version: String, reason: String },

    /// A discovery run already reached COMPLETE, FAILED or CANCELLED.
    #[error("discovery run {0} is in a terminal state and cannot be updated")]
    TerminalRun(Uuid),

    /// Lookup target does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration is structurally valid but semantically unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
