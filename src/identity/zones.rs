//! Zones, authorities and the shared-secret directory.

use crate::security::ZoneSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the authority for a zone runs relative to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorityLocation {
    /// Same host; answers are trusted as-is.
    Local,
    /// Another host; answers must carry a verifiable server response.
    Remote,
}

/// The authority consulted for a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorityInfo {
    /// Zone whose catalog the authority serves.
    pub zone: String,
    /// Where it runs.
    pub location: AuthorityLocation,
}

impl AuthorityInfo {
    /// An authority on this host.
    #[must_use]
    pub fn local(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            location: AuthorityLocation::Local,
        }
    }

    /// An authority on another host.
    #[must_use]
    pub fn remote(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            location: AuthorityLocation::Remote,
        }
    }

    /// Returns `true` if the authority runs on another host.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.location, AuthorityLocation::Remote)
    }
}

/// Zone and secret configuration.
pub trait ZoneDirectory: Send + Sync {
    /// Returns the secret shared with the authority of `zone`.
    fn shared_secret_for_zone(&self, zone: &str) -> Option<ZoneSecret>;

    /// Returns this process's home zone.
    fn home_zone(&self) -> &str;

    /// Returns `true` if `authority` serves a catalog other than the home
    /// zone's. Privileges it vouches for are remote-tier.
    fn is_foreign_authority(&self, authority: &AuthorityInfo) -> bool {
        authority.zone != self.home_zone()
    }
}

/// A [`ZoneDirectory`] backed by fixed configuration.
///
/// ```
/// use gss_handshake::identity::{AuthorityInfo, StaticZones, ZoneDirectory};
///
/// let zones = StaticZones::new("tempZone").with_secret("otherZone", "sid-1");
/// assert!(zones.shared_secret_for_zone("otherZone").is_some());
/// assert!(zones.is_foreign_authority(&AuthorityInfo::remote("otherZone")));
/// assert!(!zones.is_foreign_authority(&AuthorityInfo::remote("tempZone")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticZones {
    home_zone: String,
    secrets: HashMap<String, ZoneSecret>,
}

impl StaticZones {
    /// Creates a directory with no secrets.
    #[must_use]
    pub fn new(home_zone: impl Into<String>) -> Self {
        Self {
            home_zone: home_zone.into(),
            secrets: HashMap::new(),
        }
    }

    /// Adds a secret for `zone`.
    #[must_use]
    pub fn with_secret(mut self, zone: impl Into<String>, secret: impl Into<ZoneSecret>) -> Self {
        self.secrets.insert(zone.into(), secret.into());
        self
    }
}

impl ZoneDirectory for StaticZones {
    fn shared_secret_for_zone(&self, zone: &str) -> Option<ZoneSecret> {
        self.secrets.get(zone).filter(|s| !s.is_empty()).cloned()
    }

    fn home_zone(&self) -> &str {
        &self.home_zone
    }
}
