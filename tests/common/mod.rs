//! Common test utilities for e2e tests
//!
//! Provides test infrastructure for spinning up a PostgreSQL container and
//! building connection specs pointing at it.

use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use db_registry::ConnectionSpec;

/// A PostgreSQL container plus the spec parameters pointing at it
pub struct TestDatabase {
    pub container: ContainerAsync<Postgres>,
    pub dsn: String,
}

impl TestDatabase {
    /// Start a fresh PostgreSQL container
    pub async fn start() -> Self {
        init_tracing();

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        let dsn = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        Self { container, dsn }
    }

    /// Spec for this database with the given check interval
    pub fn spec(&self, check_interval_secs: u64) -> ConnectionSpec {
        ConnectionSpec::new(self.dsn.clone()).with_check_interval_secs(check_interval_secs)
    }
}

/// Install a subscriber so probe and reconnect logs show up under RUST_LOG
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
