//! Mechanism tokens and principal names.

use core::fmt;
use std::ops::Deref;

/// Number of bytes shown at each end of an abbreviated hex dump.
const HEX_EDGE: usize = 16;

/// One opaque unit of mechanism-protocol data.
///
/// A token owns its bytes and carries an explicit length; it is never
/// terminated by a sentinel byte. An empty token means "nothing to send".
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Token(Vec<u8>);

impl Token {
    /// Creates an empty token.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Creates a token from owned bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the token length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the token carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the token and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Renders the token as hex, eliding the middle of long tokens.
    ///
    /// Tokens up to 32 bytes are shown in full. Longer tokens show the first
    /// and last 16 bytes around a `...` marker.
    ///
    /// ```
    /// use gss_handshake::Token;
    ///
    /// assert_eq!(Token::new(vec![0xde, 0xad]).abbreviated_hex(), "dead");
    /// let long = Token::new(vec![0u8; 40]).abbreviated_hex();
    /// assert!(long.contains("..."));
    /// ```
    #[must_use]
    pub fn abbreviated_hex(&self) -> String {
        use fmt::Write as _;

        let bytes = &self.0;
        let mut out = String::with_capacity(HEX_EDGE * 4 + 3);
        if bytes.len() <= HEX_EDGE * 2 {
            for b in bytes {
                let _ = write!(out, "{b:02x}");
            }
            return out;
        }
        for b in &bytes[..HEX_EDGE] {
            let _ = write!(out, "{b:02x}");
        }
        out.push_str("...");
        for b in &bytes[bytes.len() - HEX_EDGE..] {
            let _ = write!(out, "{b:02x}");
        }
        out
    }
}

impl Deref for Token {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Token {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Token {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({} bytes: {})", self.0.len(), self.abbreviated_hex())
    }
}

/// The mechanism-certified identity of a negotiated peer.
///
/// A principal name is only what the mechanism displayed. It is not trusted
/// for authorization until the
/// [`IdentityReconciler`](crate::identity::IdentityReconciler) maps it to an
/// application user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalName(String);

impl PrincipalName {
    /// Wraps a displayed name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrincipalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
