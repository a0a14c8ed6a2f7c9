//! Mechanism object identifiers.

use crate::error::{Error, Result};
use core::fmt;
use std::str::FromStr;

/// Object identifier naming a security mechanism.
///
/// Parsed from and displayed in the brace form used by GSS-API tooling,
/// e.g. `{ 1 3 6 1 5 5 15 1 1 18 }`.
///
/// ```
/// use gss_handshake::Oid;
///
/// let oid = Oid::parse("{ 1 3 6 1 5 5 15 1 1 18 }").unwrap();
/// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 5, 5, 15, 1, 1, 18]);
/// assert_eq!(oid.to_string(), "{ 1 3 6 1 5 5 15 1 1 18 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(Vec<u64>);

impl Oid {
    /// GSS-EAP with AES256-CTS-HMAC-SHA1-96.
    pub const GSS_EAP_AES256: &'static str = "{ 1 3 6 1 5 5 15 1 1 18 }";

    /// Parses the brace form. Braces are optional; arcs are separated by
    /// whitespace or dots.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = match (trimmed.strip_prefix('{'), trimmed.ends_with('}')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => trimmed,
            _ => {
                return Err(Error::invalid_input()
                    .with_context(format!("unbalanced braces in OID {input:?}")));
            }
        };

        let arcs = body
            .split(|c: char| c.is_whitespace() || c == '.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    Error::invalid_input().with_context(format!("bad OID arc {part:?} in {input:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if arcs.len() < 2 {
            return Err(Error::invalid_input().with_context(format!("OID {input:?} has fewer than two arcs")));
        }
        if arcs[0] > 2 {
            return Err(Error::invalid_input().with_context(format!("OID {input:?} has first arc above 2")));
        }

        Ok(Self(arcs))
    }

    /// Returns the arcs.
    #[must_use]
    pub fn arcs(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for arc in &self.0 {
            write!(f, " {arc}")?;
        }
        f.write_str(" }")
    }
}
