//! Random challenges issued to authorities.

use crate::error::{Error, ErrorKind, Result};
use core::fmt;

/// Length of a challenge in bytes.
pub const CHALLENGE_LEN: usize = 64;

/// A fixed-length random challenge.
///
/// The remote authority proves it knows the zone's shared secret by hashing
/// this value together with the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Challenge {
    bytes: [u8; CHALLENGE_LEN],
}

impl Challenge {
    /// Draws a challenge from the operating system's entropy source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; CHALLENGE_LEN];
        getrandom::fill(&mut bytes).map_err(|err| {
            Error::new(ErrorKind::Io).with_context(format!("OS entropy unavailable: {err}"))
        })?;
        Ok(Self { bytes })
    }

    /// Wraps known challenge bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHALLENGE_LEN]) -> Self {
        Self { bytes }
    }

    /// Returns the challenge bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHALLENGE_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Challenge({:02x}{:02x}...{:02x}{:02x})",
            self.bytes[0],
            self.bytes[1],
            self.bytes[CHALLENGE_LEN - 2],
            self.bytes[CHALLENGE_LEN - 1]
        )
    }
}
