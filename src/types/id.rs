//! Identifier types for authentication sessions.
//!
//! A [`SessionId`] keys one connection's slot in the
//! [`ContextTable`](crate::session::ContextTable). Identifiers come from a
//! process-wide monotonic counter, so two connections never share one even
//! when the operating system reuses a descriptor number.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for one authentication session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocates the next identifier from the process-wide counter.
    #[must_use]
    pub fn next() -> Self {
        Self(SESSION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw identifier.
    ///
    /// Callers that mint their own identifiers are responsible for keeping
    /// them unique; the context table rejects a live duplicate with
    /// [`ErrorKind::SessionCollision`](crate::ErrorKind::SessionCollision).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}
