//! Registry Configuration
//!
//! Connection specs and layered configuration loading.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use config::{Config, Environment, File};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::RegistryError;

/// Name a single-database configuration is exposed under when none is given
pub const DEFAULT_ACCESSOR_NAME: &str = "db";

/// Default liveness-check interval in seconds
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

lazy_static! {
    /// Regex for validating that a dsn carries a connection scheme
    static ref DSN_SCHEME_REGEX: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("valid regex");
}

/// Validates a dsn format (must start with a scheme such as `postgres://`)
fn validate_dsn(dsn: &str) -> Result<(), validator::ValidationError> {
    if DSN_SCHEME_REGEX.is_match(dsn) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("dsn");
        error.message = Some("dsn must start with a connection scheme like postgres://".into());
        Err(error)
    }
}

fn default_accessor_name() -> String {
    DEFAULT_ACCESSOR_NAME.to_string()
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

/// Database password, zeroed from memory on drop and redacted from Debug output
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Wrap a password value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped password, for handing to a driver
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Connection parameters for one logical database
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConnectionSpec {
    /// Driver DSN, e.g. `postgres://host:5432/app`
    #[validate(length(min = 1, message = "dsn must not be empty"))]
    #[validate(custom(function = "validate_dsn"))]
    pub dsn: String,

    /// Username override; takes precedence over any user embedded in the dsn
    pub username: Option<String>,

    /// Password override, redacted from logs
    pub password: Option<Password>,

    /// Driver-specific options, passed verbatim to the driver
    #[serde(default)]
    pub options: HashMap<String, String>,

    /// Seconds between liveness checks of the cached handle
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

impl ConnectionSpec {
    /// Create a spec for the given dsn with defaults for everything else
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            username: None,
            password: None,
            options: HashMap::new(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
        }
    }

    /// Set the username override
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password override
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password));
        self
    }

    /// Add one driver-specific option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the liveness-check interval; zero probes on every accessor call
    #[must_use]
    pub fn with_check_interval_secs(mut self, secs: u64) -> Self {
        self.check_interval_secs = secs;
        self
    }
}

/// Single-database configuration shorthand
#[derive(Debug, Clone, Deserialize)]
pub struct SingleDatabase {
    /// Accessor name the database is exposed under
    #[serde(default = "default_accessor_name")]
    pub name: String,

    /// Connection parameters
    #[serde(flatten)]
    pub spec: ConnectionSpec,
}

/// Registry configuration: a single database, a named mapping, or both
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// Single-database shorthand, exposed under `database.name`
    pub database: Option<SingleDatabase>,

    /// Named databases, each exposed under its key
    #[serde(default)]
    pub databases: BTreeMap<String, ConnectionSpec>,
}

impl RegistryConfig {
    /// Load configuration from files and environment
    ///
    /// Reads `config/default`, merges an optional `config/{RUN_MODE}` overlay,
    /// then overrides from `DB__`-prefixed environment variables
    /// (e.g. `DB__DATABASE__DSN`).
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Config` when a source cannot be read or the
    /// merged configuration does not deserialize.
    pub fn load() -> Result<Self, RegistryError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "default".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(true))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("DB").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// All configured entries as (exposed name, spec) pairs
    #[must_use]
    pub fn entries(&self) -> Vec<(String, ConnectionSpec)> {
        let mut entries = Vec::new();
        if let Some(single) = &self.database {
            entries.push((single.name.clone(), single.spec.clone()));
        }
        for (name, spec) in &self.databases {
            entries.push((name.clone(), spec.clone()));
        }
        entries
    }
}
