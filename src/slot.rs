//! Connection Slots
//!
//! Per-name mutable state: the current handle, when it was last checked,
//! and how often it should be re-checked.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ConnectionSpec;
use crate::connector::Connector;
use crate::errors::ConnectError;

/// Hook invoked with every newly opened handle before it is exposed
pub type OnConnect<H> =
    Arc<dyn Fn(H) -> Pin<Box<dyn Future<Output = Result<(), ConnectError>> + Send>> + Send + Sync>;

struct SlotState<H> {
    handle: Option<H>,
    last_checked: Instant,
}

/// One exposed database: current handle, freshness state, reconnect policy
///
/// Handle replacement happens under the slot lock, so callers never observe
/// a half-updated slot.
pub struct ConnectionSlot<C: Connector> {
    name: String,
    spec: ConnectionSpec,
    check_interval: Duration,
    connector: Arc<C>,
    on_connect: Option<OnConnect<C::Handle>>,
    state: Mutex<SlotState<C::Handle>>,
}

impl<C: Connector> ConnectionSlot<C> {
    pub(crate) fn new(
        name: String,
        spec: ConnectionSpec,
        connector: Arc<C>,
        on_connect: Option<OnConnect<C::Handle>>,
    ) -> Self {
        let check_interval = Duration::from_secs(spec.check_interval_secs);
        Self {
            name,
            spec,
            check_interval,
            connector,
            on_connect,
            state: Mutex::new(SlotState {
                handle: None,
                last_checked: Instant::now(),
            }),
        }
    }

    /// Exposed name of this slot
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open the initial handle at registration time
    pub(crate) async fn connect_initial(&self) -> Result<(), ConnectError> {
        let mut state = self.state.lock().await;
        state.last_checked = Instant::now();
        let handle = self.open().await?;
        state.handle = Some(handle);
        Ok(())
    }

    /// Return a live handle
    ///
    /// Within the check interval the cached handle is returned without
    /// probing. Once the interval has elapsed, the timestamp resets and the
    /// handle is probed; a failed probe triggers a single reconnect that
    /// replaces the handle. An empty slot (initial connect failed, or a
    /// previous reconnect failed) connects on the spot.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` when a needed reconnect fails; the slot is
    /// left empty and the next call tries again.
    pub async fn acquire(&self) -> Result<C::Handle, ConnectError> {
        let mut state = self.state.lock().await;

        if let Some(handle) = state.handle.clone() {
            if state.last_checked.elapsed() <= self.check_interval {
                return Ok(handle);
            }

            state.last_checked = Instant::now();
            if self.connector.ping(&handle).await.is_ok() {
                return Ok(handle);
            }

            tracing::warn!(database = %self.name, "liveness probe failed, reopening connection");
            state.handle = None;
        } else {
            state.last_checked = Instant::now();
        }

        let handle = self.open().await?;
        state.handle = Some(handle.clone());
        tracing::info!(database = %self.name, "database connection opened");
        Ok(handle)
    }

    async fn open(&self) -> Result<C::Handle, ConnectError> {
        let handle = self.connector.connect(&self.spec).await?;
        if let Some(hook) = &self.on_connect {
            hook(handle.clone()).await?;
        }
        Ok(handle)
    }
}
