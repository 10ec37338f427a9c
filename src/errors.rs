//! Error Types
//!
//! Registration-time and accessor-time error types for the registry.

use config::ConfigError;
use thiserror::Error;

/// Configuration errors raised while registering databases
///
/// These are fatal: when registration fails, no accessor is installed.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no databases configured")]
    NoDatabases,

    #[error("database '{0}' is configured more than once")]
    DuplicateName(String),

    #[error("invalid spec for database '{name}': {reason}")]
    InvalidSpec { name: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Connectivity errors raised when an accessor cannot produce a live handle
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no database registered under '{0}'")]
    UnknownDatabase(String),

    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("post-connect hook failed: {0}")]
    PostConnect(String),
}
