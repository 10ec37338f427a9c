//! PostgreSQL Connector Implementation
//!
//! Implements the Connector trait using SQLx for PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::ConnectionSpec;
use crate::connector::Connector;
use crate::errors::ConnectError;

/// PostgreSQL implementation of Connector backed by a SQLx pool
#[derive(Debug, Clone)]
pub struct PgConnector {
    max_connections: u32,
    min_connections: u32,
}

impl PgConnector {
    /// Create a connector with the given pool bounds
    #[must_use]
    pub fn new(max_connections: u32, min_connections: u32) -> Self {
        Self {
            max_connections,
            min_connections,
        }
    }
}

impl Default for PgConnector {
    fn default() -> Self {
        Self::new(5, 1)
    }
}

/// Build driver options from a spec: dsn first, then credential and
/// driver-option overrides
fn build_options(spec: &ConnectionSpec) -> Result<PgConnectOptions, ConnectError> {
    let mut options: PgConnectOptions = spec
        .dsn
        .parse()
        .map_err(|e: sqlx::Error| ConnectError::InvalidDsn(e.to_string()))?;

    if let Some(username) = &spec.username {
        options = options.username(username);
    }
    if let Some(password) = &spec.password {
        options = options.password(password.expose());
    }
    if !spec.options.is_empty() {
        options = options.options(spec.options.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    Ok(options)
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgPool;

    async fn connect(&self, spec: &ConnectionSpec) -> Result<PgPool, ConnectError> {
        let options = build_options(spec)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_with(options)
            .await?;

        Ok(pool)
    }

    async fn ping(&self, handle: &PgPool) -> Result<(), ConnectError> {
        sqlx::query("SELECT 1").execute(handle).await?;
        Ok(())
    }
}
