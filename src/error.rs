//! Error types for the authentication core.
//!
//! Every failure is terminal for the current authentication attempt: nothing
//! in this crate retries internally. An [`Error`] carries an [`ErrorKind`],
//! optional human-readable context and, for mechanism failures, the two
//! diagnostic status codes reported by the mechanism.

use crate::mechanism::MechStatus;
use core::fmt;
use std::io;

/// The kind of authentication error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure: short write, non-interrupt read/write error, or a
    /// peer that closed the stream.
    Io,
    /// A token could not be framed or unframed (oversized, buffer too small).
    Framing,
    /// Fewer bytes than declared arrived before end-of-stream.
    PartialRead,
    /// The mechanism's init, accept, display, import or release failed.
    Mechanism,
    /// The acceptor credential could not be acquired.
    Credential,
    /// No application user matches the certified name.
    NoMatchingIdentity,
    /// More than one application user matches the certified name.
    AmbiguousIdentity,
    /// The user store returned a record of unexpected shape.
    InternalLookup,
    /// The proxy identity may not act for the client identity.
    InsufficientProxyPrivilege,
    /// The remote authority's response did not match the expected digest.
    RemoteServerAuthenticationFailure,
    /// No shared secret is configured for the remote authority's zone.
    NoSharedSecretConfigured,
    /// The remote authority returned no (or an empty) response while the
    /// configuration requires one.
    RemoteServerResponseMissing,
    /// A session identifier was reused before its slot was cleared.
    SessionCollision,
    /// The context table is at capacity.
    SessionLimit,
    /// Caller-supplied input was malformed.
    InvalidInput,
}

impl ErrorKind {
    /// Returns a short, stable description of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "transport I/O failure",
            Self::Framing => "token framing error",
            Self::PartialRead => "partial token read",
            Self::Mechanism => "security mechanism failure",
            Self::Credential => "credential acquisition failed",
            Self::NoMatchingIdentity => "no matching identity",
            Self::AmbiguousIdentity => "ambiguous identity",
            Self::InternalLookup => "internal lookup error",
            Self::InsufficientProxyPrivilege => "insufficient proxy privilege",
            Self::RemoteServerAuthenticationFailure => "remote server authentication failed",
            Self::NoSharedSecretConfigured => "no shared secret configured",
            Self::RemoteServerResponseMissing => "remote server response missing",
            Self::SessionCollision => "session identifier already in use",
            Self::SessionLimit => "session limit reached",
            Self::InvalidInput => "invalid input",
        }
    }

    /// Returns `true` for the kinds produced by reconciling an identity, as
    /// opposed to transport or mechanism failures.
    #[must_use]
    pub const fn is_reconciliation(self) -> bool {
        matches!(
            self,
            Self::NoMatchingIdentity
                | Self::AmbiguousIdentity
                | Self::InternalLookup
                | Self::InsufficientProxyPrivilege
                | Self::RemoteServerAuthenticationFailure
                | Self::NoSharedSecretConfigured
                | Self::RemoteServerResponseMissing
        )
    }
}

/// An error from the authentication core.
///
/// # Example
///
/// ```
/// use gss_handshake::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::AmbiguousIdentity)
///     .with_context("2 records for /CN=alice");
///
/// assert_eq!(err.kind(), ErrorKind::AmbiguousIdentity);
/// assert!(err.to_string().contains("/CN=alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    context: Option<String>,
    status: Option<MechStatus>,
    io_kind: Option<io::ErrorKind>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            status: None,
            io_kind: None,
        }
    }

    /// Creates a mechanism error carrying the mechanism's diagnostic codes.
    #[must_use]
    pub const fn mechanism(status: MechStatus) -> Self {
        Self {
            kind: ErrorKind::Mechanism,
            context: None,
            status: Some(status),
            io_kind: None,
        }
    }

    /// Creates a credential error carrying the mechanism's diagnostic codes.
    #[must_use]
    pub const fn credential(status: MechStatus) -> Self {
        Self {
            kind: ErrorKind::Credential,
            context: None,
            status: Some(status),
            io_kind: None,
        }
    }

    /// Creates a framing error.
    #[must_use]
    pub const fn framing() -> Self {
        Self::new(ErrorKind::Framing)
    }

    /// Creates a partial-read error.
    #[must_use]
    pub const fn partial_read() -> Self {
        Self::new(ErrorKind::PartialRead)
    }

    /// Creates an invalid-input error.
    #[must_use]
    pub const fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the mechanism diagnostic codes, if any.
    #[must_use]
    pub const fn status(&self) -> Option<MechStatus> {
        self.status
    }

    /// Returns the underlying I/O error kind for [`ErrorKind::Io`] errors
    /// built from an [`io::Error`].
    #[must_use]
    pub const fn io_kind(&self) -> Option<io::ErrorKind> {
        self.io_kind
    }

    /// Returns `true` if this is a transport failure.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Returns `true` if this is a framing failure.
    #[must_use]
    pub const fn is_framing(&self) -> bool {
        matches!(self.kind, ErrorKind::Framing)
    }

    /// Returns `true` if this is a mechanism failure.
    #[must_use]
    pub const fn is_mechanism(&self) -> bool {
        matches!(self.kind, ErrorKind::Mechanism)
    }

    /// Adds context to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Returns the error context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;

        if let Some(status) = &self.status {
            write!(f, " ({status})")?;
        }

        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            context: Some(err.to_string()),
            status: None,
            io_kind: Some(err.kind()),
        }
    }
}

/// Result type for authentication operations.
pub type Result<T> = std::result::Result<T, Error>;
