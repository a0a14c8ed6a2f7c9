//! Authentication configuration.
//!
//! # Load Order
//!
//! 1. Default values
//! 2. TOML document or file (`config-file` feature)
//! 3. Environment overrides: `irodsServerDn`, then `SERVER_DN`
//!
//! Each layer overrides the previous. The remote-server policy has no
//! default: a document that omits `remote_server_auth` does not load.

use crate::codec::{DEFAULT_LEGACY_THRESHOLD, DEFAULT_SCRATCH_CAPACITY};
use crate::identity::StaticZones;
use crate::types::Oid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub use crate::security::HashScheme;

/// Environment variables that override [`AuthConfig::server_dn`], in
/// priority order.
pub const SERVER_DN_ENV_VARS: [&str; 2] = ["irodsServerDn", "SERVER_DN"];

/// Default bound on concurrently negotiating sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 32;

/// Default bound on the acceptor's post-handshake drain receive.
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 200;

/// What to do when a remote authority proves nothing about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteServerAuth {
    /// Fail the authentication.
    Require,
    /// Log a warning and accept the authority's verdict.
    WarnAndContinue,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A field holds an unusable value.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Settings for both sides of the handshake and for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Service name the initiator targets.
    #[serde(default)]
    pub server_dn: Option<String>,
    /// Mechanism OID in brace form.
    #[serde(default = "default_mechanism_oid")]
    pub mechanism_oid: String,
    /// Largest token a receiver accepts.
    #[serde(default = "default_scratch_capacity")]
    pub scratch_capacity: usize,
    /// Peeked prefix above which a peer is treated as unframed.
    #[serde(default = "default_legacy_threshold")]
    pub legacy_threshold: u32,
    /// Concurrent sessions admitted by the context table.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Policy for remote authorities without a server response.
    pub remote_server_auth: RemoteServerAuth,
    /// Hash used for remote server responses.
    #[serde(default)]
    pub hash_scheme: HashScheme,
    /// Read/write deadline installed on the transport before negotiating.
    #[serde(default)]
    pub io_timeout_ms: Option<u64>,
    /// Deadline for the acceptor's final drain receive.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Whether the initiator frames an empty final token.
    #[serde(default)]
    pub announce_completion: bool,
    /// Zone this process belongs to.
    #[serde(default)]
    pub home_zone: String,
    /// Shared secrets keyed by zone.
    #[serde(default)]
    pub zone_secrets: BTreeMap<String, String>,
}

fn default_mechanism_oid() -> String {
    Oid::GSS_EAP_AES256.to_owned()
}

const fn default_scratch_capacity() -> usize {
    DEFAULT_SCRATCH_CAPACITY
}

const fn default_legacy_threshold() -> u32 {
    DEFAULT_LEGACY_THRESHOLD
}

const fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

const fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

impl AuthConfig {
    /// Creates a configuration with defaults everywhere except the
    /// remote-server policy.
    #[must_use]
    pub fn new(remote_server_auth: RemoteServerAuth) -> Self {
        Self {
            server_dn: None,
            mechanism_oid: default_mechanism_oid(),
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            legacy_threshold: DEFAULT_LEGACY_THRESHOLD,
            max_sessions: DEFAULT_MAX_SESSIONS,
            remote_server_auth,
            hash_scheme: HashScheme::default(),
            io_timeout_ms: None,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
            announce_completion: false,
            home_zone: String::new(),
            zone_secrets: BTreeMap::new(),
        }
    }

    /// Parses [`mechanism_oid`](Self::mechanism_oid).
    pub fn mechanism(&self) -> crate::Result<Oid> {
        Oid::parse(&self.mechanism_oid)
    }

    /// Returns the transport deadline, if any.
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the drain deadline.
    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Builds the zone directory described by this configuration.
    #[must_use]
    pub fn zones(&self) -> StaticZones {
        self.zone_secrets
            .iter()
            .fold(StaticZones::new(self.home_zone.clone()), |zones, (zone, secret)| {
                zones.with_secret(zone.clone(), secret.as_str())
            })
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Oid::parse(&self.mechanism_oid)
            .map_err(|err| ConfigError::invalid("mechanism_oid", err.to_string()))?;
        if self.scratch_capacity == 0 {
            return Err(ConfigError::invalid("scratch_capacity", "must be non-zero"));
        }
        if self.legacy_threshold == 0 {
            return Err(ConfigError::invalid("legacy_threshold", "must be non-zero"));
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::invalid("max_sessions", "must be non-zero"));
        }
        if self.io_timeout_ms == Some(0) {
            return Err(ConfigError::invalid("io_timeout_ms", "must be non-zero"));
        }
        if self.drain_timeout_ms == 0 {
            return Err(ConfigError::invalid("drain_timeout_ms", "must be non-zero"));
        }
        if self.server_dn.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::invalid("server_dn", "must not be empty"));
        }
        Ok(())
    }
}

/// Loads an [`AuthConfig`], layering environment overrides on top.
///
/// # Example
///
/// ```
/// use gss_handshake::{AuthConfig, ConfigLoader, RemoteServerAuth};
///
/// let config = ConfigLoader::new()
///     .skip_env_vars()
///     .finish(AuthConfig::new(RemoteServerAuth::Require))
///     .unwrap();
/// assert_eq!(config.scratch_capacity, 20_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader that applies environment overrides.
    #[must_use]
    pub fn new() -> Self {
        Self { skip_env: false }
    }

    /// Skips environment overrides.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Parses a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(&self, document: &str) -> Result<AuthConfig, ConfigError> {
        let config: AuthConfig =
            toml::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        self.finish(config)
    }

    /// Reads and parses a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_file(&self, path: impl AsRef<std::path::Path>) -> Result<AuthConfig, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded auth config file");
        self.from_toml_str(&document)
    }

    /// Applies environment overrides unless they are skipped.
    pub fn apply_env(&self, config: &mut AuthConfig) {
        if !self.skip_env {
            apply_env_with(config, |var| std::env::var(var).ok());
        }
    }

    /// Applies environment overrides and validates.
    pub fn finish(&self, mut config: AuthConfig) -> Result<AuthConfig, ConfigError> {
        self.apply_env(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env_with<F>(config: &mut AuthConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some((var, value)) = SERVER_DN_ENV_VARS
        .iter()
        .find_map(|var| lookup(var).map(|value| (*var, value)))
    {
        debug!(var, "server DN taken from environment");
        config.server_dn = Some(value);
    }
}
