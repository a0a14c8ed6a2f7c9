//! Negotiation loops and in-progress context bookkeeping.
//!
//! # Wire Sequence
//!
//! ```text
//! Initiator                          Acceptor
//!   init()           ── token 1 ──▶    accept()
//!                    ◀── reply 1 ──
//!   init(reply 1)    ── token 2 ──▶    accept()
//!   ...                                ...
//!   init(reply K)                      accept() -> Complete
//!     -> Complete                      drain (bounded)
//! ```
//!
//! Each exchange is strictly sequential. An empty output token means the
//! peer has nothing to receive; `ContinueNeeded` means the peer has another
//! token to send.

mod acceptor;
mod initiator;
mod table;

pub use crate::mechanism::ContextState;
pub use acceptor::Acceptor;
pub use initiator::Initiator;
pub use table::{ContextTable, DEFAULT_MAX_SESSIONS, SlotLease};

use crate::error::Result;
use crate::io::Transport;
use crate::mechanism::{ContextHandle, Mechanism};
use crate::types::NegotiatedFlags;
use core::fmt;
use std::time::Duration;

/// A context that finished negotiating.
pub struct EstablishedContext<M: Mechanism> {
    handle: ContextHandle<M>,
    rounds: usize,
}

impl<M: Mechanism> EstablishedContext<M> {
    pub(crate) fn new(handle: ContextHandle<M>, rounds: usize) -> Self {
        Self { handle, rounds }
    }

    /// Flags the mechanism agreed to.
    #[must_use]
    pub const fn flags(&self) -> NegotiatedFlags {
        self.handle.flags()
    }

    /// Mechanism calls made on this side.
    #[must_use]
    pub const fn rounds(&self) -> usize {
        self.rounds
    }

    /// Lifecycle state; always [`ContextState::Established`].
    #[must_use]
    pub const fn state(&self) -> ContextState {
        self.handle.state()
    }

    /// Releases the context and reports the mechanism's verdict.
    pub fn release(self) -> Result<()> {
        self.handle.release()
    }
}

impl<M: Mechanism> fmt::Debug for EstablishedContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstablishedContext")
            .field("flags", &format_args!("{}", self.flags()))
            .field("rounds", &self.rounds)
            .finish()
    }
}

/// Installs `timeout` as both the read and write deadline.
fn apply_io_timeout<T: Transport + ?Sized>(
    transport: &mut T,
    timeout: Option<Duration>,
) -> Result<()> {
    if let Some(timeout) = timeout {
        transport.set_read_timeout(Some(timeout))?;
        transport.set_write_timeout(Some(timeout))?;
    }
    Ok(())
}
