//! Privilege tiers and the proxy authorization rule.

use super::names::UserIdentity;
use crate::error::{Error, ErrorKind, Result};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Role attribute that grants the privileged tier.
pub const ADMIN_ROLE: &str = "rodsadmin";

/// Coarse authorization tier.
///
/// "Local" tiers were issued by this process's home authority, "remote"
/// tiers by a foreign one. Ordering follows the numeric codes, so
/// `level >= PrivilegeLevel::RemotePrivileged` reads as "at least remote
/// privileged".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivilegeLevel {
    /// Not authenticated.
    None,
    /// Standard user vouched for by a foreign authority.
    RemoteUser,
    /// Standard user vouched for by the home authority.
    LocalUser,
    /// Administrator vouched for by a foreign authority.
    RemotePrivileged,
    /// Administrator vouched for by the home authority.
    LocalPrivileged,
}

impl PrivilegeLevel {
    /// Returns the numeric code used on the wire by existing deployments.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::RemoteUser => 1,
            Self::LocalUser => 2,
            Self::RemotePrivileged => 3,
            Self::LocalPrivileged => 5,
        }
    }

    /// Decodes a numeric code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::RemoteUser),
            2 => Some(Self::LocalUser),
            3 => Some(Self::RemotePrivileged),
            5 => Some(Self::LocalPrivileged),
            _ => None,
        }
    }

    /// Level granted to a user with the given role attribute.
    #[must_use]
    pub fn for_role(role: &str) -> Self {
        if role == ADMIN_ROLE {
            Self::LocalPrivileged
        } else {
            Self::LocalUser
        }
    }

    /// Maps a local tier to the matching remote tier.
    #[must_use]
    pub const fn to_remote(self) -> Self {
        match self {
            Self::LocalPrivileged => Self::RemotePrivileged,
            Self::LocalUser => Self::RemoteUser,
            other => other,
        }
    }

    /// Maps a remote tier to the matching local tier.
    #[must_use]
    pub const fn to_local(self) -> Self {
        match self {
            Self::RemotePrivileged => Self::LocalPrivileged,
            Self::RemoteUser => Self::LocalUser,
            other => other,
        }
    }

    /// Level of a client from another zone, as seen through a foreign
    /// authority. Local tiers collapse to [`PrivilegeLevel::RemoteUser`];
    /// administrators of another zone are not administrators here.
    #[must_use]
    pub const fn to_foreign_client(self) -> Self {
        match self {
            Self::LocalPrivileged | Self::LocalUser => Self::RemoteUser,
            other => other,
        }
    }

    /// Returns `true` for either privileged tier.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::LocalPrivileged | Self::RemotePrivileged)
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::RemoteUser => "remote-user",
            Self::LocalUser => "local-user",
            Self::RemotePrivileged => "remote-privileged",
            Self::LocalPrivileged => "local-privileged",
        };
        write!(f, "{name}({})", self.code())
    }
}

/// Checks that `proxy`, holding `level`, may act for `client`.
///
/// A proxy acting for itself always may. Otherwise the proxy must be
/// locally privileged, or remotely privileged and in the client's zone.
pub fn check_proxy_privilege(
    proxy: &UserIdentity,
    client: &UserIdentity,
    level: PrivilegeLevel,
) -> Result<()> {
    if proxy.name == client.name {
        return Ok(());
    }
    let allowed = level >= PrivilegeLevel::LocalPrivileged
        || (level >= PrivilegeLevel::RemotePrivileged && proxy.zone == client.zone);
    if allowed {
        Ok(())
    } else {
        warn!(
            proxy = %proxy,
            client = %client,
            level = %level,
            "proxy user lacks privilege to act for client"
        );
        Err(Error::new(ErrorKind::InsufficientProxyPrivilege).with_context(format!(
            "proxy {proxy} with {level} may not act for {client}"
        )))
    }
}
