//! The shared acceptor credential.
//!
//! Every acceptor session in a process uses the same credential. It is
//! acquired on first use and then only read; acquisition itself runs under
//! the write lock so concurrent first callers wait for a single acquirer.

use crate::error::{Error, Result};
use crate::mechanism::{CredentialHandle, CredentialRole, Mechanism, log_status};
use crate::types::Oid;
use parking_lot::RwLock;
use std::sync::Arc;

/// Lazily acquired acceptor credential for one mechanism.
pub struct CredentialStore<M: Mechanism> {
    mech: Arc<M>,
    oid: Option<Oid>,
    held: RwLock<Option<Arc<CredentialHandle<M>>>>,
}

impl<M: Mechanism> CredentialStore<M> {
    /// Creates an empty store. `oid` restricts acquisition to one mechanism.
    #[must_use]
    pub fn new(mech: Arc<M>, oid: Option<Oid>) -> Self {
        Self {
            mech,
            oid,
            held: RwLock::new(None),
        }
    }

    /// Returns the held credential, acquiring it on first call.
    pub fn acquire(&self) -> Result<Arc<CredentialHandle<M>>> {
        if let Some(held) = self.held.read().as_ref() {
            return Ok(Arc::clone(held));
        }

        let mut slot = self.held.write();
        if let Some(held) = slot.as_ref() {
            return Ok(Arc::clone(held));
        }

        let credential = self
            .mech
            .acquire_credential(CredentialRole::Accept, self.oid.as_ref())
            .map_err(|status| {
                log_status(&*self.mech, "server", "acquire_credential", &status);
                Error::credential(status).with_context("acquire acceptor credential")
            })?;
        let handle = Arc::new(CredentialHandle::new(Arc::clone(&self.mech), credential));
        *slot = Some(Arc::clone(&handle));
        debug!(oid = ?self.oid.as_ref().map(ToString::to_string), "acceptor credential acquired");
        Ok(handle)
    }

    /// Returns `true` once a credential is held.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.held.read().is_some()
    }

    /// Drops the store's reference. Sessions that still hold the credential
    /// keep it alive; the next [`acquire`](Self::acquire) fetches a new one.
    pub fn invalidate(&self) {
        if self.held.write().take().is_some() {
            debug!("acceptor credential invalidated");
        }
    }
}

impl<M: Mechanism> std::fmt::Debug for CredentialStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("oid", &self.oid)
            .field("acquired", &self.is_acquired())
            .finish_non_exhaustive()
    }
}
