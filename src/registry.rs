//! Connection Registrar
//!
//! Validates configured specs, opens initial handles, and exposes the
//! resulting named accessors.

use std::collections::BTreeMap;
use std::sync::Arc;

use validator::Validate;

use crate::config::{ConnectionSpec, RegistryConfig, DEFAULT_ACCESSOR_NAME};
use crate::connector::Connector;
use crate::errors::{ConnectError, RegistryError};
use crate::slot::{ConnectionSlot, OnConnect};

struct RegistrarEntry<C: Connector> {
    name: String,
    spec: ConnectionSpec,
    on_connect: Option<OnConnect<C::Handle>>,
}

/// Builder that turns connection specs into a registry of named accessors
pub struct Registrar<C: Connector> {
    connector: Arc<C>,
    default_name: String,
    entries: Vec<RegistrarEntry<C>>,
}

impl<C: Connector> Registrar<C> {
    /// Create a registrar that opens handles with the given connector
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            default_name: DEFAULT_ACCESSOR_NAME.to_string(),
            entries: Vec::new(),
        }
    }

    /// Add every database from the configuration
    ///
    /// The single-database entry, when present, becomes the registry's
    /// default accessor.
    #[must_use]
    pub fn with_config(mut self, config: &RegistryConfig) -> Self {
        if let Some(single) = &config.database {
            self.default_name = single.name.clone();
        }
        for (name, spec) in config.entries() {
            self = self.database(name, spec);
        }
        self
    }

    /// Add one database under the given exposed name
    #[must_use]
    pub fn database(mut self, name: impl Into<String>, spec: ConnectionSpec) -> Self {
        self.entries.push(RegistrarEntry {
            name: name.into(),
            spec,
            on_connect: None,
        });
        self
    }

    /// Add one database with a hook run against every newly opened handle
    #[must_use]
    pub fn database_with(
        mut self,
        name: impl Into<String>,
        spec: ConnectionSpec,
        on_connect: OnConnect<C::Handle>,
    ) -> Self {
        self.entries.push(RegistrarEntry {
            name: name.into(),
            spec,
            on_connect: Some(on_connect),
        });
        self
    }

    /// Validate every spec, open initial handles, and install the accessors
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` when no database is configured, a name is
    /// duplicated, or any spec fails validation; no accessor is installed in
    /// that case. A database that validates but cannot be reached is still
    /// installed: the connect error is logged here and resurfaces on first
    /// use of its accessor.
    pub async fn register(self) -> Result<DbRegistry<C>, RegistryError> {
        if self.entries.is_empty() {
            return Err(RegistryError::NoDatabases);
        }

        for entry in &self.entries {
            entry.spec.validate().map_err(|e| RegistryError::InvalidSpec {
                name: entry.name.clone(),
                reason: describe_validation_errors(&e),
            })?;
        }

        let mut slots = BTreeMap::new();
        for entry in self.entries {
            let name = entry.name.clone();
            let slot = ConnectionSlot::new(
                entry.name,
                entry.spec,
                Arc::clone(&self.connector),
                entry.on_connect,
            );
            if slots.insert(name.clone(), slot).is_some() {
                return Err(RegistryError::DuplicateName(name));
            }
        }

        for slot in slots.values() {
            match slot.connect_initial().await {
                Ok(()) => tracing::info!(database = %slot.name(), "database registered"),
                Err(e) => tracing::warn!(
                    database = %slot.name(),
                    error = %e,
                    "initial connect failed, will retry on first use"
                ),
            }
        }

        Ok(DbRegistry {
            inner: Arc::new(RegistryInner {
                slots,
                default_name: self.default_name,
            }),
        })
    }
}

fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                format!(
                    "{}: {}",
                    field,
                    e.message.as_ref().map_or("invalid", |m| m.as_ref())
                )
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

struct RegistryInner<C: Connector> {
    slots: BTreeMap<String, ConnectionSlot<C>>,
    default_name: String,
}

/// Registry of named database accessors, shared across the application
///
/// Cloning is cheap; all clones point at the same slots.
pub struct DbRegistry<C: Connector> {
    inner: Arc<RegistryInner<C>>,
}

impl<C: Connector> Clone for DbRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> DbRegistry<C> {
    /// Live handle for the default database
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` when no database is registered under the
    /// default name or the slot cannot produce a live handle.
    pub async fn db(&self) -> Result<C::Handle, ConnectError> {
        self.named(&self.inner.default_name).await
    }

    /// Live handle for the database exposed under `name`
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::UnknownDatabase` for an unregistered name, or
    /// the slot's error when it cannot produce a live handle.
    pub async fn named(&self, name: &str) -> Result<C::Handle, ConnectError> {
        let slot = self
            .inner
            .slots
            .get(name)
            .ok_or_else(|| ConnectError::UnknownDatabase(name.to_string()))?;
        slot.acquire().await
    }

    /// Name of the default accessor
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.inner.default_name
    }

    /// Exposed names, in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.slots.keys().map(String::as_str)
    }

    /// Whether a database is exposed under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.slots.contains_key(name)
    }
}
