//! The user-store collaborator.

use crate::types::PrincipalName;

/// Failure reported by a user store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("user store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected the query.
    #[error("user store rejected query: {0}")]
    Query(String),
}

/// One row returned by a lookup, as an ordered list of attributes.
///
/// With a client-name hint a row holds `(id, type, zone)`; without one it
/// holds `(id, type, name, zone)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    attributes: Vec<String>,
}

impl UserRecord {
    /// Builds a row from its attributes.
    #[must_use]
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the attributes.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if the row has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Maps certified principal names to application users.
pub trait UserStore: Send + Sync {
    /// Returns every user bound to `name`.
    ///
    /// With `client_hint`, only users of that name are returned and rows
    /// carry three attributes; otherwise rows carry four. Implementations
    /// may stop after two rows.
    fn lookup_by_certified_name(
        &self,
        name: &PrincipalName,
        client_hint: Option<&str>,
    ) -> Result<Vec<UserRecord>, StoreError>;

    /// Gives site policy a chance to create a user for `name`.
    ///
    /// Best effort; the return value only feeds logging.
    fn provision(&self, name: &PrincipalName) -> bool {
        let _ = name;
        false
    }
}

impl<S: UserStore + ?Sized> UserStore for std::sync::Arc<S> {
    fn lookup_by_certified_name(
        &self,
        name: &PrincipalName,
        client_hint: Option<&str>,
    ) -> Result<Vec<UserRecord>, StoreError> {
        (**self).lookup_by_certified_name(name, client_hint)
    }

    fn provision(&self, name: &PrincipalName) -> bool {
        (**self).provision(name)
    }
}
