//! Challenge/response verification of a remote authority.
//!
//! The expected response is a one-way hash over a 114-byte buffer: the
//! 64-byte challenge followed by the zone's shared secret, truncated or
//! zero-padded to 50 bytes. Only the first 16 digest bytes are compared,
//! and any zero byte among them is bumped to 1 so the value survives
//! string-based transports on the authority side.

use super::challenge::{CHALLENGE_LEN, Challenge};
use super::secret::ZoneSecret;
use crate::error::{Error, ErrorKind, Result};
use hmac::Hmac;
use hmac::Mac;
use hmac::digest::KeyInit;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of response bytes compared.
pub const RESPONSE_LEN: usize = 16;

/// Bytes the shared secret occupies in the hashed buffer.
pub const SECRET_FIELD_LEN: usize = 50;

/// One-way hash used for authority responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// MD5 over challenge and padded secret. Interoperates with legacy
    /// authorities.
    #[default]
    Md5,
    /// SHA-256 over challenge and padded secret, truncated.
    Sha256,
    /// HMAC-SHA256 keyed by the secret over the challenge, truncated.
    HmacSha256,
}

impl HashScheme {
    /// Returns the configuration name of the scheme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

/// Computes the response an authority holding `secret` must return.
pub fn expected_response(
    challenge: &Challenge,
    secret: &ZoneSecret,
    scheme: HashScheme,
) -> Result<[u8; RESPONSE_LEN]> {
    let mut digest = [0u8; RESPONSE_LEN];
    match scheme {
        HashScheme::Md5 => {
            let mut buf = hash_input(challenge, secret);
            digest.copy_from_slice(&md5::compute(buf).0[..RESPONSE_LEN]);
            buf.fill(0);
        }
        HashScheme::Sha256 => {
            let mut buf = hash_input(challenge, secret);
            let full = Sha256::digest(buf);
            digest.copy_from_slice(&full[..RESPONSE_LEN]);
            buf.fill(0);
        }
        HashScheme::HmacSha256 => {
            let mut mac = <Hmac<Sha256> as KeyInit>::new_from_slice(secret.as_bytes())
                .map_err(|_| Error::invalid_input().with_context("unusable HMAC key"))?;
            mac.update(challenge.as_bytes());
            let full = mac.finalize().into_bytes();
            digest.copy_from_slice(&full[..RESPONSE_LEN]);
        }
    }

    for byte in &mut digest {
        if *byte == 0 {
            *byte = 1;
        }
    }
    Ok(digest)
}

/// Checks an authority's response against the expected digest.
///
/// The comparison covers exactly [`RESPONSE_LEN`] bytes and takes the same
/// time wherever the first difference is. A response shorter than that is
/// a mismatch.
pub fn verify_server_response(
    challenge: &Challenge,
    secret: &ZoneSecret,
    scheme: HashScheme,
    response: &[u8],
) -> Result<()> {
    let expected = expected_response(challenge, secret, scheme)?;
    let matches = response
        .get(..RESPONSE_LEN)
        .is_some_and(|got| constant_time_eq(got, &expected));

    debug!(scheme = scheme.as_str(), matches, "checked remote server response");
    if matches {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::RemoteServerAuthenticationFailure)
            .with_context("server response incorrect"))
    }
}

fn hash_input(challenge: &Challenge, secret: &ZoneSecret) -> [u8; CHALLENGE_LEN + SECRET_FIELD_LEN] {
    let mut buf = [0u8; CHALLENGE_LEN + SECRET_FIELD_LEN];
    buf[..CHALLENGE_LEN].copy_from_slice(challenge.as_bytes());
    let secret = secret.as_bytes();
    let n = secret.len().min(SECRET_FIELD_LEN);
    buf[CHALLENGE_LEN..CHALLENGE_LEN + n].copy_from_slice(&secret[..n]);
    buf
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
