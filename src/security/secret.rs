//! Shared secrets configured per zone.

use core::fmt;

/// A secret shared with the authority of one zone.
///
/// Used to check that a remote authority really answered a challenge. The
/// secret never appears in `Debug` or `Display` output and is zeroed on
/// drop.
///
/// ```
/// use gss_handshake::security::ZoneSecret;
///
/// let secret = ZoneSecret::new("s3cr3t");
/// assert_eq!(secret.as_bytes(), b"s3cr3t");
/// assert!(!format!("{secret:?}").contains("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ZoneSecret {
    bytes: Vec<u8>,
}

impl ZoneSecret {
    /// Wraps secret material.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the secret material.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` if the secret is empty. An empty secret counts as
    /// not configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for ZoneSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for ZoneSecret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Debug for ZoneSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneSecret({} bytes, redacted)", self.bytes.len())
    }
}

impl Drop for ZoneSecret {
    fn drop(&mut self) {
        // Best-effort; the optimizer may elide it.
        for byte in &mut self.bytes {
            *byte = 0;
        }
    }
}
