//! Application user identities and `user#zone` names.

use crate::error::{Error, Result};
use core::fmt;
use serde::{Deserialize, Serialize};

/// An application user within a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User name; empty when the client did not name itself.
    pub name: String,
    /// Home zone of the user; empty when not yet known.
    pub zone: String,
}

impl UserIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
        }
    }

    /// Creates an identity with neither name nor zone.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns `true` if the user has not been named.
    #[must_use]
    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.zone.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}#{}", self.name, self.zone)
        }
    }
}

/// A user name optionally qualified with a zone, written `user#zone`.
///
/// ```
/// use gss_handshake::identity::QualifiedUserName;
///
/// let name = QualifiedUserName::parse("alice#tempZone").unwrap();
/// assert_eq!(name.user(), "alice");
/// assert_eq!(name.zone(), Some("tempZone"));
/// assert_eq!(QualifiedUserName::parse("bob").unwrap().zone(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedUserName {
    user: String,
    zone: Option<String>,
}

impl QualifiedUserName {
    /// Parses `user` or `user#zone`. An empty zone after `#` counts as no
    /// zone.
    pub fn parse(input: &str) -> Result<Self> {
        let (user, zone) = match input.split_once('#') {
            Some((user, zone)) => (user, Some(zone)),
            None => (input, None),
        };
        if user.is_empty() {
            return Err(Error::invalid_input().with_context(format!("empty user name in {input:?}")));
        }
        if zone.is_some_and(|z| z.contains('#')) {
            return Err(Error::invalid_input().with_context(format!("more than one '#' in {input:?}")));
        }
        Ok(Self {
            user: user.to_owned(),
            zone: zone.filter(|z| !z.is_empty()).map(str::to_owned),
        })
    }

    /// Returns the user part.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the zone part, if present.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns the zone part, or `home_zone` if absent.
    #[must_use]
    pub fn zone_or<'a>(&'a self, home_zone: &'a str) -> &'a str {
        self.zone.as_deref().unwrap_or(home_zone)
    }
}

impl fmt::Display for QualifiedUserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.zone {
            Some(zone) => write!(f, "{}#{zone}", self.user),
            None => f.write_str(&self.user),
        }
    }
}

impl From<&UserIdentity> for QualifiedUserName {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            user: identity.name.clone(),
            zone: (!identity.zone.is_empty()).then(|| identity.zone.clone()),
        }
    }
}
