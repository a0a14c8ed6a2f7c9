//! Server side of the negotiation.

use super::{EstablishedContext, apply_io_timeout};
use crate::codec::TokenFramer;
use crate::config::DEFAULT_DRAIN_TIMEOUT_MS;
use crate::error::{Error, ErrorKind, Result};
use crate::io::Transport;
use crate::mechanism::{ContextHandle, CredentialHandle, Mechanism, NameHandle, StepStatus};
use crate::types::PrincipalName;
use std::sync::Arc;
use std::time::Duration;

/// Drives [`Mechanism::accept`] until the context is established and
/// reports the peer's certified principal.
pub struct Acceptor<M: Mechanism> {
    mech: Arc<M>,
    framer: TokenFramer,
    credential: Option<Arc<CredentialHandle<M>>>,
    io_timeout: Option<Duration>,
    drain_timeout: Duration,
}

impl<M: Mechanism> Acceptor<M> {
    /// Creates an acceptor using the mechanism's default credential.
    #[must_use]
    pub fn new(mech: Arc<M>, framer: TokenFramer) -> Self {
        Self {
            mech,
            framer,
            credential: None,
            io_timeout: None,
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
        }
    }

    /// Uses the shared acceptor credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Arc<CredentialHandle<M>>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Installs a read/write deadline on the transport before negotiating.
    #[must_use]
    pub const fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Bounds the receive that drains the peer's final token.
    #[must_use]
    pub const fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Runs the loop to completion.
    ///
    /// Tokens larger than the framer's capacity fail with
    /// [`ErrorKind::Framing`]. After the last step one more token is drained
    /// from the peer; a failure there is only logged.
    pub fn accept<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<(EstablishedContext<M>, PrincipalName)> {
        apply_io_timeout(transport, self.io_timeout)?;

        let credential = self.credential.as_deref();
        let mut ctx = ContextHandle::new(Arc::clone(&self.mech));
        let mut peer: Option<NameHandle<M>> = None;
        let mut rounds = 0usize;

        loop {
            let input = match self.framer.receive_token(transport) {
                Ok(token) => token,
                Err(err) => {
                    warn!(side = "server", rounds, error = %err, "failed to receive token");
                    ctx.abort();
                    return Err(err);
                }
            };

            let step = ctx.accept_step(credential, &input)?;
            rounds += 1;

            if let Some(name) = step.peer {
                peer = Some(NameHandle::new(Arc::clone(&self.mech), name));
            }
            if !step.output.is_empty() {
                if let Err(err) = self.framer.send_token(transport, &step.output) {
                    warn!(side = "server", rounds, error = %err, "failed to send token");
                    ctx.abort();
                    return Err(err);
                }
            }
            if step.status == StepStatus::Complete {
                break;
            }
        }

        self.drain(transport);

        let Some(peer) = peer else {
            ctx.abort();
            return Err(Error::new(ErrorKind::Mechanism)
                .with_context("context established without a peer name"));
        };
        let principal = peer.display()?;
        drop(peer);

        info!(
            side = "server",
            rounds,
            flags = %ctx.flags(),
            principal = %principal,
            "security context established"
        );
        Ok((EstablishedContext::new(ctx, rounds), principal))
    }

    /// Receives one more token under the drain deadline, then restores the
    /// previous read deadline. Skipped when the transport cannot bound a
    /// read.
    fn drain<T: Transport + ?Sized>(&self, transport: &mut T) {
        let previous = match transport.read_timeout() {
            Ok(previous) => previous,
            Err(err) => {
                debug!(error = %err, "cannot read transport deadline; skipping drain");
                return;
            }
        };
        if let Err(err) = transport.set_read_timeout(Some(self.drain_timeout)) {
            debug!(error = %err, "cannot bound drain receive; skipping drain");
            return;
        }

        match self.framer.receive_token(transport) {
            Ok(token) => debug!(len = token.len(), "drained final client token"),
            Err(err) => debug!(error = %err, "no final client token"),
        }

        if let Err(err) = transport.set_read_timeout(previous) {
            debug!(error = %err, "failed to restore transport deadline");
        }
    }
}

impl<M: Mechanism> std::fmt::Debug for Acceptor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acceptor")
            .field("io_timeout", &self.io_timeout)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}
