use crate::identity::{StoreError, UserRecord, UserStore};
use crate::types::PrincipalName;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct StoredUser {
    principal: String,
    id: String,
    name: String,
    role: String,
    zone: String,
}

#[derive(Debug, Default)]
struct Rows {
    users: Vec<StoredUser>,
    pending: Vec<StoredUser>,
    raw: Vec<(String, UserRecord)>,
}

/// An in-memory [`UserStore`].
///
/// Hinted lookups return `(id, type, zone)` rows for users of that name;
/// unhinted lookups return `(id, type, name, zone)`. Raw rows are returned
/// verbatim in both modes.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    rows: Mutex<Rows>,
    failure: Option<String>,
    lookups: AtomicUsize,
    provision_calls: AtomicUsize,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `principal` to a user.
    #[must_use]
    pub fn with_user(self, principal: &str, id: &str, name: &str, role: &str, zone: &str) -> Self {
        self.rows
            .lock()
            .users
            .push(user(principal, id, name, role, zone));
        self
    }

    /// Adds a user that only appears once `principal` is provisioned.
    #[must_use]
    pub fn provision_as(
        self,
        principal: &str,
        id: &str,
        name: &str,
        role: &str,
        zone: &str,
    ) -> Self {
        self.rows
            .lock()
            .pending
            .push(user(principal, id, name, role, zone));
        self
    }

    /// Adds a row returned as-is for `principal`.
    #[must_use]
    pub fn with_raw_row<I, S>(self, principal: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows
            .lock()
            .raw
            .push((principal.to_owned(), UserRecord::new(attributes)));
        self
    }

    /// Makes every lookup fail with [`StoreError::Unavailable`].
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Provisioning requests so far.
    pub fn provision_calls(&self) -> usize {
        self.provision_calls.load(Ordering::SeqCst)
    }
}

fn user(principal: &str, id: &str, name: &str, role: &str, zone: &str) -> StoredUser {
    StoredUser {
        principal: principal.to_owned(),
        id: id.to_owned(),
        name: name.to_owned(),
        role: role.to_owned(),
        zone: zone.to_owned(),
    }
}

impl UserStore for MemoryUserStore {
    fn lookup_by_certified_name(
        &self,
        name: &PrincipalName,
        client_hint: Option<&str>,
    ) -> Result<Vec<UserRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }

        let rows = self.rows.lock();
        let mut found: Vec<UserRecord> = rows
            .users
            .iter()
            .filter(|u| u.principal == name.as_str())
            .filter_map(|u| match client_hint {
                Some(hint) if hint == u.name => {
                    Some(UserRecord::new([&u.id, &u.role, &u.zone].map(String::as_str)))
                }
                Some(_) => None,
                None => Some(UserRecord::new(
                    [&u.id, &u.role, &u.name, &u.zone].map(String::as_str),
                )),
            })
            .collect();
        found.extend(
            rows.raw
                .iter()
                .filter(|(principal, _)| principal == name.as_str())
                .map(|(_, record)| record.clone()),
        );
        Ok(found)
    }

    fn provision(&self, name: &PrincipalName) -> bool {
        self.provision_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock();
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut rows.pending)
            .into_iter()
            .partition(|u| u.principal == name.as_str());
        rows.pending = waiting;
        let created = !ready.is_empty();
        rows.users.extend(ready);
        created
    }
}
