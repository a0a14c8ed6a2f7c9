//! Client side of the negotiation.

use super::{EstablishedContext, apply_io_timeout};
use crate::codec::TokenFramer;
use crate::error::Result;
use crate::io::Transport;
use crate::mechanism::{ContextHandle, CredentialHandle, Mechanism, NameHandle, StepStatus};
use crate::types::{NegotiatedFlags, Token};
use std::sync::Arc;
use std::time::Duration;

/// Drives [`Mechanism::init`] until the context is established.
pub struct Initiator<M: Mechanism> {
    mech: Arc<M>,
    framer: TokenFramer,
    target: Option<String>,
    credential: Option<Arc<CredentialHandle<M>>>,
    requested: NegotiatedFlags,
    announce_completion: bool,
    io_timeout: Option<Duration>,
}

impl<M: Mechanism> Initiator<M> {
    /// Creates an initiator using the default credential and no target.
    #[must_use]
    pub fn new(mech: Arc<M>, framer: TokenFramer) -> Self {
        Self {
            mech,
            framer,
            target: None,
            credential: None,
            requested: NegotiatedFlags::REQUESTED,
            announce_completion: false,
            io_timeout: None,
        }
    }

    /// Names the acceptor service.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Uses an explicit initiator credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Arc<CredentialHandle<M>>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Overrides the requested flags.
    #[must_use]
    pub const fn with_requested(mut self, requested: NegotiatedFlags) -> Self {
        self.requested = requested;
        self
    }

    /// Also frames an empty final token for acceptors that drain one.
    #[must_use]
    pub const fn announce_completion(mut self, announce: bool) -> Self {
        self.announce_completion = announce;
        self
    }

    /// Installs a read/write deadline on the transport before negotiating.
    #[must_use]
    pub const fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Runs the loop to completion.
    ///
    /// Any transport, framing or mechanism failure aborts the context.
    pub fn establish<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<EstablishedContext<M>> {
        apply_io_timeout(transport, self.io_timeout)?;

        let target = self
            .target
            .as_deref()
            .map(|name| NameHandle::import(Arc::clone(&self.mech), name))
            .transpose()?;
        let credential = self.credential.as_deref();

        let mut ctx = ContextHandle::new(Arc::clone(&self.mech));
        let mut input: Option<Token> = None;
        let mut rounds = 0usize;

        loop {
            let step = ctx.init_step(credential, target.as_ref(), input.as_deref(), self.requested)?;
            rounds += 1;

            let complete = step.status == StepStatus::Complete;
            if !step.output.is_empty() || (complete && self.announce_completion) {
                if let Err(err) = self.framer.send_token(transport, &step.output) {
                    warn!(side = "client", rounds, error = %err, "failed to send token");
                    ctx.abort();
                    return Err(err);
                }
            }
            if complete {
                break;
            }

            match self.framer.receive_token(transport) {
                Ok(token) => input = Some(token),
                Err(err) => {
                    warn!(side = "client", rounds, error = %err, "failed to receive token");
                    ctx.abort();
                    return Err(err);
                }
            }
        }

        info!(
            side = "client",
            rounds,
            flags = %ctx.flags(),
            target = self.target.as_deref().unwrap_or(""),
            "security context established"
        );
        Ok(EstablishedContext::new(ctx, rounds))
    }
}

impl<M: Mechanism> std::fmt::Debug for Initiator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initiator")
            .field("target", &self.target)
            .field("requested", &self.requested)
            .field("announce_completion", &self.announce_completion)
            .finish_non_exhaustive()
    }
}
