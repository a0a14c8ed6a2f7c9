//! gss-handshake: mutual authentication over a duplex byte stream using a
//! GSS-style negotiated-context mechanism, followed by identity and privilege
//! reconciliation against local policy.
//!
//! # Overview
//!
//! A client (initiator) and a server (acceptor) exchange opaque mechanism
//! tokens until the mechanism reports that the security context is complete.
//! Each token travels with a 4-byte big-endian length prefix; an acceptor that
//! sees an implausible prefix falls back, once and for the whole process, to
//! the legacy unframed format. Once the server knows the peer's certified
//! principal name, the identity reconciler maps it to exactly one application
//! user and decides which privilege level the session receives.
//!
//! # Core Guarantees
//!
//! - **No silent truncation**: short reads and writes surface as errors, never
//!   as shorter tokens
//! - **Scoped mechanism resources**: contexts, names and credentials are
//!   released on every exit path via RAII handles
//! - **Collision-free slots**: in-progress contexts are keyed by a monotonic
//!   [`SessionId`], never by a reusable descriptor number
//! - **Fail closed**: every missing or ambiguous identity case is a hard
//!   error; the only bypass is the explicitly named
//!   [`RemoteServerAuth::WarnAndContinue`] policy
//!
//! # Module Structure
//!
//! - [`io`]: Token channel (interrupt-tolerant `write_all`/`read_all`) and the
//!   [`Transport`](io::Transport) seam
//! - [`codec`]: Length-prefix framing with legacy auto-detection
//! - [`mechanism`]: The mechanism capability set and scoped handles
//! - [`credential`]: Process-wide, lazily acquired acceptor credential
//! - [`session`]: Initiator and acceptor negotiation loops plus the context table
//! - [`security`]: Challenge/response verification of remote authorities
//! - [`identity`]: User-store contract, privilege levels and the reconciler
//! - [`client`] / [`agent`]: Client-side and server-side authentication flows
//! - [`config`]: Configuration loading
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
pub mod tracing_compat;

pub mod agent;
pub mod client;
pub mod codec;
pub mod config;
pub mod credential;
pub mod error;
pub mod identity;
pub mod io;
pub mod kvp;
pub mod mechanism;
pub mod security;
pub mod session;
pub mod types;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod testing;

pub use agent::{AuthAgent, AuthenticatedSession, AuthorityCheck, AuthorityGateway, ClaimedUsers};
pub use client::{AuthClient, AuthResponse};
pub use codec::{FramingMode, FramingState, TokenFramer};
pub use config::{AuthConfig, ConfigError, ConfigLoader, HashScheme, RemoteServerAuth};
pub use credential::CredentialStore;
pub use error::{Error, ErrorKind, Result};
pub use identity::{
    IdentityReconciler, PrivilegeDecision, PrivilegeLevel, UserIdentity, UserStore,
    ZoneDirectory,
};
pub use mechanism::{MechStatus, Mechanism, StepStatus};
pub use session::{Acceptor, ContextState, ContextTable, EstablishedContext, Initiator};
pub use types::{NegotiatedFlags, Oid, PrincipalName, SessionId, Token};
