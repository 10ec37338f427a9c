//! Database Connectors
//!
//! Abstract trait defining the contract for opening and probing
//! driver-native connection handles.

pub mod postgres;

pub use postgres::PgConnector;

use async_trait::async_trait;

use crate::config::ConnectionSpec;
use crate::errors::ConnectError;

/// Contract between the registry and a database-access layer
#[cfg_attr(test, mockall::automock(type Handle = u64;))]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Driver-native connection handle produced by this connector
    type Handle: Clone + Send + Sync + 'static;

    /// Open a new handle from the spec's dsn, credentials, and options
    async fn connect(&self, spec: &ConnectionSpec) -> Result<Self::Handle, ConnectError>;

    /// Probe a handle for liveness with a lightweight round trip
    async fn ping(&self, handle: &Self::Handle) -> Result<(), ConnectError>;
}
