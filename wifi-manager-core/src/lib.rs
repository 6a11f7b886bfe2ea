//! Core library for the station-mode Wi-Fi connectivity manager.
//! This crate defines the driver capability traits, the data model shared
//! with presentation layers, the connectivity state machine that owns the
//! radio lifecycle, and the event bridge that turns asynchronous radio
//! notifications into state the manager can wait on.
//!
//! Concrete radio drivers live behind [`traits::RadioDriver`] and
//! [`traits::SystemServices`]; a simulated radio is provided under
//! [`backends::mock`] when the `backend_mock` feature is enabled.

pub mod backends;
pub mod config;
pub mod event_bridge;
pub mod manager;
pub mod traits;
pub mod types;

pub use config::ManagerConfig;
pub use manager::{ManagerState, OwnedResources, ResourceOwnership, WifiManager};

use std::time::Duration;
use thiserror::Error;
use types::DriverCode;

/// Resources the manager may create at `init` and must only tear down
/// when it created them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    EventLoop,
    StationNetif,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::EventLoop => f.write_str("default event loop"),
            Resource::StationNetif => f.write_str("station network interface"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Persistent storage could not be recovered: {code}")]
    StorageRecoveryFailed { code: DriverCode },

    #[error("Failed to create {resource}: {code}")]
    ResourceCreationFailed { resource: Resource, code: DriverCode },

    #[error("Driver call `{op}` failed: {code}")]
    DriverCallFailed { op: &'static str, code: DriverCode },

    #[error("Scan did not complete within {timeout:?}")]
    ScanTimedOut { timeout: Duration },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("`{op}` is not allowed while the manager is {state}")]
    InvalidState { op: &'static str, state: ManagerState },

    #[error("`{op}` rejected: another operation is in progress ({state})")]
    Busy { op: &'static str, state: ManagerState },

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand used by the manager when mapping a driver diagnostic.
    pub(crate) fn driver(op: &'static str, code: DriverCode) -> Self {
        Error::DriverCallFailed { op, code }
    }

    /// The driver diagnostic carried by this error, if any.
    pub fn driver_code(&self) -> Option<DriverCode> {
        match self {
            Error::StorageRecoveryFailed { code }
            | Error::ResourceCreationFailed { code, .. }
            | Error::DriverCallFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
