//! Named database accessors for axum applications
//!
//! Reads a configuration block describing one or more databases, opens each
//! connection once at registration, and exposes a zero-argument accessor per
//! configured name. Accessors re-validate liveness at most once per check
//! interval and transparently reconnect when the probe fails.

pub mod config;
pub mod connector;
pub mod errors;
pub mod extract;
pub mod registry;
pub mod slot;

pub use crate::config::{ConnectionSpec, Password, RegistryConfig, SingleDatabase};
pub use crate::connector::{Connector, PgConnector};
pub use crate::errors::{ConnectError, RegistryError};
pub use crate::extract::Db;
pub use crate::registry::{DbRegistry, Registrar};
pub use crate::slot::OnConnect;
