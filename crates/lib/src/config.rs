//! # Connection Resolution
//!
//! Resolves the Postgres connection parameters from layered configuration:
//! explicit per-call overrides win over persisted settings, and the password
//! is stored as a secret *name* that a [`SecretStore`] resolves to a value
//! at connection time. Resolution fails fast with
//! [`VdbError::NotConfigured`] naming the missing field; configuration
//! errors are not transient, so nothing retries.

use crate::errors::VdbError;
use serde::Deserialize;
use std::collections::HashMap;

/// Default Postgres port when neither an override nor persisted settings
/// supply one.
pub const DEFAULT_PORT: u16 = 5432;

/// Read-only lookup of secret values by name.
pub trait SecretStore: Send + Sync {
    /// Resolves a secret name to its value, or `None` when unknown.
    fn resolve(&self, name: &str) -> Option<String>;
}

/// A map-backed [`SecretStore`] for simple deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for InMemorySecretStore {
    fn resolve(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }
}

/// Persisted connection settings, as stored by the host configuration.
///
/// All fields are optional at rest; completeness is only enforced at
/// resolution time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    /// Name of the secret holding the password, not the password itself.
    pub password_secret: Option<String>,
    pub default_database: Option<String>,
}

/// Explicit per-call settings taking precedence over persisted ones.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    /// A literal password, taking precedence over the secret lookup.
    pub password: Option<String>,
    pub default_database: Option<String>,
}

/// Fully resolved connection parameters.
///
/// Invariant: every field is non-empty once resolution succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionData {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub default_database: String,
}

fn pick(override_value: &Option<String>, stored: &Option<String>) -> Option<String> {
    override_value
        .clone()
        .or_else(|| stored.clone())
        .filter(|v| !v.is_empty())
}

/// Resolves connection parameters from overrides, persisted settings and
/// the secret store.
///
/// Fields are checked in a fixed order (host, username, password,
/// default database) so the error names the first missing one.
pub fn resolve_connection(
    overrides: &ConnectionOverrides,
    settings: &ConnectionSettings,
    secrets: &dyn SecretStore,
) -> Result<ConnectionData, VdbError> {
    let host = pick(&overrides.host, &settings.host).ok_or(VdbError::NotConfigured("host"))?;
    let username =
        pick(&overrides.username, &settings.username).ok_or(VdbError::NotConfigured("username"))?;

    let mut password = settings
        .password_secret
        .as_deref()
        .and_then(|name| secrets.resolve(name))
        .unwrap_or_default();
    if let Some(literal) = &overrides.password {
        if !literal.is_empty() {
            password = literal.clone();
        }
    }
    if password.is_empty() {
        return Err(VdbError::NotConfigured("password"));
    }

    let port = overrides.port.or(settings.port).unwrap_or(DEFAULT_PORT);
    let default_database = pick(&overrides.default_database, &settings.default_database)
        .ok_or(VdbError::NotConfigured("default_database"))?;

    Ok(ConnectionData {
        host,
        port,
        username,
        password,
        default_database,
    })
}
