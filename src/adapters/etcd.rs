// SPDX-License-Identifier: MIT OR Apache-2.0

//! etcd backend adapter.
//!
//! This module provides a [`KvBackend`] over an etcd v3 cluster. etcd keys
//! are flat; directories are emulated with the rules in
//! [`keyspace`](crate::adapters::keyspace).
//!
//! Leaf/directory checks and the following write are separate requests, so a
//! concurrent writer can slip in between them. Writers to the same root are
//! expected to coordinate outside this crate.

use crate::adapters::keyspace::{self, Scan};
use crate::adapters::runtime::block_on;
use crate::domain::{ConfigError, Result};
use crate::ports::{BackendError, BackendResult, KvBackend, Listing, Subtree};
use etcd_client::{Client, ConnectOptions, DeleteOptions, GetOptions};
use std::time::Duration;

/// Default endpoint used when neither flags nor environment name one.
pub const DEFAULT_ENDPOINT: &str = "localhost:2379";

/// Environment variable holding a comma separated endpoint list.
pub const ENV_ENDPOINTS: &str = "ETCD_ENDPOINTS";
/// Environment variable holding the etcd host.
pub const ENV_HOST: &str = "ETCD_HOST";
/// Environment variable holding the etcd port.
pub const ENV_PORT: &str = "ETCD_PORT";
/// Environment variable holding the user name.
pub const ENV_USERNAME: &str = "ETCD_USERNAME";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "ETCD_PASSWORD";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ETCD_TIMEOUT_SECS";

/// Connection parameters for an etcd cluster.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::EtcdSettings;
/// use std::time::Duration;
///
/// let settings = EtcdSettings::new(["10.0.0.1:2379", "10.0.0.2:2379"])
///     .with_credentials("config-reader", "secret")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(settings.endpoints.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtcdSettings {
    /// Cluster endpoints (`host:port`)
    pub endpoints: Vec<String>,
    /// Optional user name
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// Optional per-request timeout
    pub timeout: Option<Duration>,
}

impl Default for EtcdSettings {
    fn default() -> Self {
        Self::new([DEFAULT_ENDPOINT])
    }
}

impl EtcdSettings {
    /// Creates settings for the given endpoints without credentials.
    pub fn new<S: AsRef<str>>(endpoints: impl IntoIterator<Item = S>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            username: None,
            password: None,
            timeout: None,
        }
    }

    /// Sets user name and password.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads settings from the process environment.
    ///
    /// `ETCD_ENDPOINTS` wins over `ETCD_HOST`/`ETCD_PORT`; with neither set the
    /// default endpoint is used. Credentials need both `ETCD_USERNAME` and
    /// `ETCD_PASSWORD`.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoints: Vec<String> = match lookup(ENV_ENDPOINTS) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => match (lookup(ENV_HOST), lookup(ENV_PORT)) {
                (None, None) => vec![DEFAULT_ENDPOINT.to_string()],
                (host, port) => {
                    let port = match port {
                        Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Settings {
                            message: format!("{} is not a valid port: {}", ENV_PORT, e),
                        })?,
                        None => 2379,
                    };
                    let host = host.unwrap_or_else(|| "localhost".to_string());
                    vec![format!("{}:{}", host, port)]
                }
            },
        };
        if endpoints.is_empty() {
            return Err(ConfigError::Settings {
                message: format!("{} names no endpoints", ENV_ENDPOINTS),
            });
        }

        let mut settings = Self::new(endpoints);
        match (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(user), Some(password)) => settings = settings.with_credentials(user, password),
            (None, None) => {}
            _ => {
                return Err(ConfigError::Settings {
                    message: format!("{} and {} must be set together", ENV_USERNAME, ENV_PASSWORD),
                })
            }
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|e| ConfigError::Settings {
                message: format!("{} is not a number of seconds: {}", ENV_TIMEOUT_SECS, e),
            })?;
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        Ok(settings)
    }

    fn connect_options(&self) -> Option<ConnectOptions> {
        let mut options = None;
        if let (Some(user), Some(password)) = (&self.username, &self.password) {
            options = Some(ConnectOptions::new().with_user(user.clone(), password.clone()));
        }
        if let Some(timeout) = self.timeout {
            options = Some(options.unwrap_or_else(ConnectOptions::new).with_timeout(timeout));
        }
        options
    }
}

fn transport(message: &str, e: etcd_client::Error) -> BackendError {
    BackendError::Transport {
        message: format!("{}: {}", message, e),
        source: Some(Box::new(e)),
    }
}

/// Backend adapter for etcd.
///
/// # Examples
///
/// ```rust,no_run
/// use etcdcfg::adapters::{EtcdBackend, EtcdSettings};
/// use etcdcfg::ports::KvBackend;
///
/// # fn main() -> etcdcfg::domain::Result<()> {
/// let backend = EtcdBackend::connect(&EtcdSettings::default())?;
/// backend.set_scalar("/myapp/database/host", "localhost")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EtcdBackend {
    client: Client,
}

impl std::fmt::Debug for EtcdBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdBackend").finish_non_exhaustive()
    }
}

impl EtcdBackend {
    /// Connects to the cluster described by `settings`.
    pub fn connect(settings: &EtcdSettings) -> Result<Self> {
        let endpoints = settings.endpoints.clone();
        let options = settings.connect_options();
        let client = block_on(Client::connect(endpoints, options))
            .map_err(|e| ConfigError::from(transport("Failed to connect to etcd", e)))?;
        tracing::debug!("Connected to etcd at {:?}", settings.endpoints);
        Ok(Self { client })
    }

    /// Wraps an already connected client.
    ///
    /// The client must have been created on the shared remote runtime, which
    /// is the case for clients obtained from [`EtcdBackend::connect`].
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn scan(&self, path: &str, with_values: bool) -> BackendResult<Scan> {
        let mut client = self.client.clone();
        let leaf = if path == "/" {
            None
        } else {
            let response = client
                .get(path, None)
                .await
                .map_err(|e| transport("Failed to read key from etcd", e))?;
            response
                .kvs()
                .first()
                .map(|kv| kv.value_str().map(str::to_string))
                .transpose()
                .map_err(|e| transport("Invalid UTF-8 value in etcd", e))?
        };

        let mut options = GetOptions::new().with_prefix();
        if !with_values {
            options = options.with_keys_only();
        }
        let response = client
            .get(keyspace::dir_prefix(path), Some(options))
            .await
            .map_err(|e| transport("Failed to fetch keys from etcd", e))?;
        let mut descendants = Vec::with_capacity(response.kvs().len());
        for kv in response.kvs() {
            let key = kv
                .key_str()
                .map_err(|e| transport("Invalid UTF-8 key in etcd", e))?;
            let value = if with_values {
                kv.value_str()
                    .map_err(|e| transport("Invalid UTF-8 value in etcd", e))?
            } else {
                ""
            };
            descendants.push((key.to_string(), value.to_string()));
        }

        Ok(Scan {
            path: path.to_string(),
            leaf,
            descendants,
        })
    }

    async fn has_descendants(&self, path: &str) -> BackendResult<bool> {
        let mut client = self.client.clone();
        let response = client
            .get(
                keyspace::dir_prefix(path),
                Some(GetOptions::new().with_prefix().with_count_only()),
            )
            .await
            .map_err(|e| transport("Failed to count keys in etcd", e))?;
        Ok(response.count() > 0)
    }

    async fn check_ancestors(&self, path: &str) -> BackendResult<()> {
        let mut client = self.client.clone();
        for ancestor in keyspace::ancestors(path) {
            let response = client
                .get(ancestor.as_str(), Some(GetOptions::new().with_count_only()))
                .await
                .map_err(|e| transport("Failed to read key from etcd", e))?;
            if response.count() > 0 {
                return Err(BackendError::conflict(&ancestor, "not a directory"));
            }
        }
        Ok(())
    }
}

impl KvBackend for EtcdBackend {
    fn name(&self) -> &str {
        "etcd"
    }

    fn get_subtree(&self, path: &str) -> BackendResult<Subtree> {
        let path = keyspace::normalize(path);
        block_on(self.scan(&path, true))?.subtree()
    }

    fn set_scalar(&self, path: &str, value: &str) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        block_on(async {
            if path == "/" || self.has_descendants(&path).await? {
                return Err(BackendError::conflict(&path, "not a file"));
            }
            self.check_ancestors(&path).await?;
            let mut client = self.client.clone();
            client
                .put(path.as_str(), value, None)
                .await
                .map_err(|e| transport("Failed to write key to etcd", e))?;
            Ok(())
        })
    }

    fn delete_subtree(&self, path: &str, recursive: bool) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        block_on(async {
            let scan = self.scan(&path, false).await?;
            if scan.is_absent() {
                return Err(BackendError::not_found(&path));
            }
            if !recursive && scan.has_children() {
                return Err(BackendError::conflict(&path, "directory not empty"));
            }
            let mut client = self.client.clone();
            if scan.leaf.is_some() {
                client
                    .delete(path.as_str(), None)
                    .await
                    .map_err(|e| transport("Failed to delete key from etcd", e))?;
            }
            if !scan.descendants.is_empty() {
                client
                    .delete(
                        keyspace::dir_prefix(&path),
                        Some(DeleteOptions::new().with_prefix()),
                    )
                    .await
                    .map_err(|e| transport("Failed to delete keys from etcd", e))?;
            }
            Ok(())
        })
    }

    fn list_children(&self, path: &str) -> BackendResult<Listing> {
        let path = keyspace::normalize(path);
        block_on(self.scan(&path, false))?.listing()
    }

    fn make_dir(&self, path: &str) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        block_on(async {
            let scan = self.scan(&path, false).await?;
            if scan.leaf.is_some() {
                return Err(BackendError::conflict(&path, "not a directory"));
            }
            if !scan.descendants.is_empty() {
                return Ok(());
            }
            self.check_ancestors(&path).await?;
            let mut client = self.client.clone();
            client
                .put(keyspace::marker_key(&path), "", None)
                .await
                .map_err(|e| transport("Failed to create directory in etcd", e))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_settings_default_endpoint() {
        let settings = EtcdSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, EtcdSettings::default());
    }

    #[test]
    fn test_settings_host_and_port() {
        let settings =
            EtcdSettings::from_lookup(lookup(&[(ENV_HOST, "etcd"), (ENV_PORT, "4001")])).unwrap();
        assert_eq!(settings.endpoints, vec!["etcd:4001"]);
    }

    #[test]
    fn test_settings_endpoint_list_wins() {
        let settings = EtcdSettings::from_lookup(lookup(&[
            (ENV_ENDPOINTS, "a:1, b:2"),
            (ENV_HOST, "ignored"),
        ]))
        .unwrap();
        assert_eq!(settings.endpoints, vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_settings_bad_port() {
        let err = EtcdSettings::from_lookup(lookup(&[(ENV_PORT, "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Settings { .. }));
    }

    #[test]
    fn test_settings_half_credentials() {
        let err = EtcdSettings::from_lookup(lookup(&[(ENV_USERNAME, "root")])).unwrap_err();
        assert!(matches!(err, ConfigError::Settings { .. }));
    }

    #[test]
    fn test_settings_credentials_and_timeout() {
        let settings = EtcdSettings::from_lookup(lookup(&[
            (ENV_USERNAME, "root"),
            (ENV_PASSWORD, "pw"),
            (ENV_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();
        assert_eq!(settings.username.as_deref(), Some("root"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(3)));
        assert!(settings.connect_options().is_some());
    }

    #[test]
    fn test_connect_without_server_fails() {
        // Nothing listens on this port, so connecting must fail cleanly.
        let settings = EtcdSettings::new(["127.0.0.1:1"]).with_timeout(Duration::from_millis(200));
        let result = EtcdBackend::connect(&settings).and_then(|backend| {
            backend.get_subtree("/").map_err(ConfigError::from)
        });
        assert!(result.is_err());
    }
}
