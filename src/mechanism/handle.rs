//! Scoped ownership of mechanism contexts, names and credentials.
//!
//! Each handle holds an `Arc` of the mechanism and gives its value back
//! through the matching release operation when dropped. A release failure
//! during drop is logged and otherwise ignored; callers that need to see it
//! use the explicit `release` methods.

use super::{AcceptStep, InitStep, MechStatus, Mechanism, StepStatus, log_status};
use crate::error::{Error, Result};
use crate::types::{NegotiatedFlags, PrincipalName};
use core::fmt;
use std::sync::Arc;

/// Lifecycle of a negotiated context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// No context exists yet.
    None,
    /// Negotiation is in progress.
    Establishing,
    /// Negotiation completed; flags are fixed.
    Established,
    /// Negotiation failed; the context has been released.
    Failed,
}

impl ContextState {
    /// Returns `true` for states that accept no further steps.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Established | Self::Failed)
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Establishing => "establishing",
            Self::Established => "established",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A mechanism context driven through init or accept steps.
pub struct ContextHandle<M: Mechanism> {
    mech: Arc<M>,
    inner: Option<M::Context>,
    state: ContextState,
    flags: NegotiatedFlags,
}

impl<M: Mechanism> ContextHandle<M> {
    /// Creates a handle in [`ContextState::None`].
    #[must_use]
    pub fn new(mech: Arc<M>) -> Self {
        Self {
            mech,
            inner: None,
            state: ContextState::None,
            flags: NegotiatedFlags::empty(),
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContextState {
        self.state
    }

    /// Returns the negotiated flags. Empty until established.
    #[must_use]
    pub const fn flags(&self) -> NegotiatedFlags {
        self.flags
    }

    /// Returns `true` once negotiation has completed.
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self.state, ContextState::Established)
    }

    /// Returns the mechanism this context belongs to.
    #[must_use]
    pub fn mechanism(&self) -> &Arc<M> {
        &self.mech
    }

    /// Runs one initiator step.
    ///
    /// On failure the context is released and the handle moves to
    /// [`ContextState::Failed`].
    pub fn init_step(
        &mut self,
        credential: Option<&CredentialHandle<M>>,
        target: Option<&NameHandle<M>>,
        input: Option<&[u8]>,
        requested: NegotiatedFlags,
    ) -> Result<InitStep> {
        self.ensure_open()?;
        let result = self.mech.init(
            &mut self.inner,
            credential.and_then(CredentialHandle::get),
            target.and_then(NameHandle::get),
            input,
            requested,
        );
        match result {
            Ok(step) => {
                self.advance(step.status, step.flags);
                Ok(step)
            }
            Err(status) => Err(self.fail("client", "init", status)),
        }
    }

    /// Runs one acceptor step.
    ///
    /// On failure the context is released and the handle moves to
    /// [`ContextState::Failed`].
    pub fn accept_step(
        &mut self,
        credential: Option<&CredentialHandle<M>>,
        input: &[u8],
    ) -> Result<AcceptStep<M::Name>> {
        self.ensure_open()?;
        let result = self.mech.accept(
            &mut self.inner,
            credential.and_then(CredentialHandle::get),
            input,
        );
        match result {
            Ok(step) => {
                self.advance(step.status, step.flags);
                Ok(step)
            }
            Err(status) => Err(self.fail("server", "accept", status)),
        }
    }

    /// Marks the context failed and releases it, for failures that happen
    /// outside a mechanism call (transport, framing).
    pub fn abort(&mut self) {
        self.state = ContextState::Failed;
        self.release_inner();
    }

    /// Releases the context now and reports the mechanism's verdict.
    pub fn release(mut self) -> Result<()> {
        match self.inner.take() {
            Some(ctx) => self.mech.release_context(ctx).map_err(|status| {
                log_status(&*self.mech, "context", "release", &status);
                Error::mechanism(status).with_context("release context")
            }),
            None => Ok(()),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::invalid_input()
                .with_context(format!("context is already {}", self.state)));
        }
        Ok(())
    }

    fn advance(&mut self, status: StepStatus, flags: Option<NegotiatedFlags>) {
        match status {
            StepStatus::ContinueNeeded => self.state = ContextState::Establishing,
            StepStatus::Complete => {
                self.state = ContextState::Established;
                self.flags = flags.unwrap_or_default();
            }
        }
    }

    fn fail(&mut self, side: &'static str, operation: &'static str, status: MechStatus) -> Error {
        log_status(&*self.mech, side, operation, &status);
        self.abort();
        Error::mechanism(status).with_context(format!("{side} {operation}"))
    }

    fn release_inner(&mut self) {
        if let Some(ctx) = self.inner.take() {
            if let Err(status) = self.mech.release_context(ctx) {
                debug!(%status, "failed to release mechanism context");
            }
        }
    }
}

impl<M: Mechanism> Drop for ContextHandle<M> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<M: Mechanism> fmt::Debug for ContextHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("live", &self.inner.is_some())
            .finish()
    }
}

/// A mechanism name, released on drop.
pub struct NameHandle<M: Mechanism> {
    mech: Arc<M>,
    inner: Option<M::Name>,
}

impl<M: Mechanism> NameHandle<M> {
    /// Takes ownership of a name produced by `mech`.
    #[must_use]
    pub fn new(mech: Arc<M>, name: M::Name) -> Self {
        Self {
            mech,
            inner: Some(name),
        }
    }

    /// Imports a service name string.
    pub fn import(mech: Arc<M>, name: &str) -> Result<Self> {
        match mech.import_name(name) {
            Ok(inner) => Ok(Self::new(mech, inner)),
            Err(status) => {
                log_status(&*mech, "client", "import_name", &status);
                Err(Error::mechanism(status).with_context(format!("import name {name:?}")))
            }
        }
    }

    /// Returns the mechanism name.
    #[must_use]
    pub fn get(&self) -> Option<&M::Name> {
        self.inner.as_ref()
    }

    /// Renders the name through the mechanism.
    pub fn display(&self) -> Result<PrincipalName> {
        let Some(name) = self.inner.as_ref() else {
            return Err(Error::invalid_input().with_context("name already released"));
        };
        match self.mech.display_name(name) {
            Ok(text) => Ok(PrincipalName::new(text)),
            Err(status) => {
                log_status(&*self.mech, "server", "display_name", &status);
                Err(Error::mechanism(status).with_context("display peer name"))
            }
        }
    }
}

impl<M: Mechanism> Drop for NameHandle<M> {
    fn drop(&mut self) {
        if let Some(name) = self.inner.take() {
            if let Err(status) = self.mech.release_name(name) {
                debug!(%status, "failed to release mechanism name");
            }
        }
    }
}

impl<M: Mechanism> fmt::Debug for NameHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameHandle")
            .field("live", &self.inner.is_some())
            .finish()
    }
}

/// A mechanism credential, released on drop.
pub struct CredentialHandle<M: Mechanism> {
    mech: Arc<M>,
    inner: Option<M::Credential>,
}

impl<M: Mechanism> CredentialHandle<M> {
    /// Takes ownership of a credential produced by `mech`.
    #[must_use]
    pub fn new(mech: Arc<M>, credential: M::Credential) -> Self {
        Self {
            mech,
            inner: Some(credential),
        }
    }

    /// Returns the credential.
    #[must_use]
    pub fn get(&self) -> Option<&M::Credential> {
        self.inner.as_ref()
    }
}

impl<M: Mechanism> Drop for CredentialHandle<M> {
    fn drop(&mut self) {
        if let Some(credential) = self.inner.take() {
            if let Err(status) = self.mech.release_credential(credential) {
                debug!(%status, "failed to release mechanism credential");
            }
        }
    }
}

impl<M: Mechanism> fmt::Debug for CredentialHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHandle")
            .field("live", &self.inner.is_some())
            .finish()
    }
}
