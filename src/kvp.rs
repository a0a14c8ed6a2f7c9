//! `key=value;key=value` strings exchanged during authentication.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Separates pairs.
pub const DELIMITER: char = ';';
/// Separates a key from its value.
pub const ASSOCIATION: char = '=';

/// Key naming the authenticating user.
pub const AUTH_USER_KEY: &str = "a_user";
/// Key naming the authentication scheme.
pub const AUTH_SCHEME_KEY: &str = "a_scheme";
/// Scheme value for this mechanism family.
pub const GSSEAP_SCHEME: &str = "gsseap";

/// Longest context string a request may carry.
pub const MAX_CONTEXT_LEN: usize = 1088;

/// Renders pairs in key order.
///
/// ```
/// use std::collections::BTreeMap;
/// use gss_handshake::kvp;
///
/// let mut pairs = BTreeMap::new();
/// pairs.insert("a_scheme".to_owned(), "gsseap".to_owned());
/// assert_eq!(kvp::render(&pairs), "a_scheme=gsseap");
/// ```
#[must_use]
pub fn render(pairs: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push(DELIMITER);
        }
        out.push_str(key);
        out.push(ASSOCIATION);
        out.push_str(value);
    }
    out
}

/// Parses a context string. Empty segments are skipped; a segment without
/// `=` is an [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput)
/// error.
pub fn parse(input: &str) -> Result<BTreeMap<String, String>> {
    input
        .split(DELIMITER)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once(ASSOCIATION)
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .ok_or_else(|| {
                    Error::invalid_input().with_context(format!("malformed pair {segment:?}"))
                })
        })
        .collect()
}

/// Appends one pair to `base`, inserting the delimiter when `base` is
/// non-empty.
#[must_use]
pub fn append(base: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(base.len() + key.len() + value.len() + 2);
    out.push_str(base);
    if !base.is_empty() {
        out.push(DELIMITER);
    }
    out.push_str(key);
    out.push(ASSOCIATION);
    out.push_str(value);
    out
}
