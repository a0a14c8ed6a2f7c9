//! The security mechanism as a capability set.
//!
//! The negotiation loops never see a mechanism's wire format or
//! cryptography. They see [`Mechanism`]: a handful of operations that
//! produce and consume opaque [`Token`]s and hand back opaque context,
//! name and credential values. Those values are wrapped in the scoped
//! handles from [`handle`], which give them back to the mechanism on every
//! exit path.

pub mod handle;

pub use handle::{ContextHandle, ContextState, CredentialHandle, NameHandle};

use crate::types::{NegotiatedFlags, Oid, Token};
use core::fmt;

/// The two diagnostic codes a mechanism reports with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MechStatus {
    /// Routine/calling error code.
    pub major: u32,
    /// Mechanism-specific code.
    pub minor: u32,
}

impl MechStatus {
    /// Creates a status pair.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for MechStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "major=0x{:08x} minor={}", self.major, self.minor)
    }
}

/// Outcome of a successful init or accept call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The context is established.
    Complete,
    /// The peer has another token to send.
    ContinueNeeded,
}

/// Role a credential is acquired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialRole {
    /// Starts negotiations.
    Initiate,
    /// Answers negotiations.
    Accept,
}

/// Result of one [`Mechanism::init`] call.
#[derive(Debug, Clone)]
pub struct InitStep {
    /// Whether another round is needed.
    pub status: StepStatus,
    /// Token for the peer; empty means nothing to send.
    pub output: Token,
    /// Negotiated flags, set on completion.
    pub flags: Option<NegotiatedFlags>,
}

/// Result of one [`Mechanism::accept`] call.
#[derive(Debug)]
pub struct AcceptStep<N> {
    /// Whether another round is needed.
    pub status: StepStatus,
    /// Token for the peer; empty means nothing to send.
    pub output: Token,
    /// The peer's certified identity, set on completion.
    pub peer: Option<N>,
    /// Negotiated flags, set on completion.
    pub flags: Option<NegotiatedFlags>,
}

/// A GSS-style negotiated-context mechanism.
///
/// Every fallible operation reports failure as a [`MechStatus`]. `init` and
/// `accept` receive the caller's context slot: `None` on the first call,
/// then whatever the mechanism stored there. The release operations take
/// ownership; callers reach them through the scoped handles in [`handle`].
pub trait Mechanism: Send + Sync {
    /// Per-negotiation state.
    type Context: Send;
    /// The right to act as an identity.
    type Credential: Send + Sync;
    /// A mechanism-internal name.
    type Name: Send;

    /// Converts a service name string into a mechanism name.
    fn import_name(&self, name: &str) -> Result<Self::Name, MechStatus>;

    /// Acquires a credential with no time limit.
    fn acquire_credential(
        &self,
        role: CredentialRole,
        mech: Option<&Oid>,
    ) -> Result<Self::Credential, MechStatus>;

    /// Runs one initiator step. `input` is `None` on the first call.
    fn init(
        &self,
        context: &mut Option<Self::Context>,
        credential: Option<&Self::Credential>,
        target: Option<&Self::Name>,
        input: Option<&[u8]>,
        requested: NegotiatedFlags,
    ) -> Result<InitStep, MechStatus>;

    /// Runs one acceptor step.
    fn accept(
        &self,
        context: &mut Option<Self::Context>,
        credential: Option<&Self::Credential>,
        input: &[u8],
    ) -> Result<AcceptStep<Self::Name>, MechStatus>;

    /// Renders a name as text.
    fn display_name(&self, name: &Self::Name) -> Result<String, MechStatus>;

    /// Releases a context.
    fn release_context(&self, context: Self::Context) -> Result<(), MechStatus>;

    /// Releases a name.
    fn release_name(&self, name: Self::Name) -> Result<(), MechStatus>;

    /// Releases a credential.
    fn release_credential(&self, credential: Self::Credential) -> Result<(), MechStatus>;

    /// Human-readable lines describing a status pair, for logs.
    fn describe_status(&self, status: &MechStatus) -> Vec<String> {
        let _ = status;
        Vec::new()
    }
}

/// Logs a mechanism failure with both codes and the mechanism's own
/// description of them.
pub(crate) fn log_status<M: Mechanism + ?Sized>(
    mech: &M,
    side: &'static str,
    operation: &'static str,
    status: &MechStatus,
) {
    error!(
        side,
        operation,
        major = status.major,
        minor = status.minor,
        "mechanism call failed"
    );
    for line in mech.describe_status(status) {
        error!(side, operation, "{line}");
    }
}
