//! Verification of remote authorities.
//!
//! When the authority that vouched for a user lives on another host, the
//! agent issues a random [`Challenge`] and expects the authority to answer
//! with a digest of that challenge and the zone's [`ZoneSecret`]. This
//! module computes and checks that digest.
//!
//! # Design Principles
//!
//! 1. **No ambient secrets**: secrets come from an explicit zone directory
//! 2. **Fail closed**: a missing secret or a short response never verifies
//! 3. **Redacted by default**: secrets and challenges never print in full

pub mod challenge;
pub mod response;
pub mod secret;

pub use challenge::{CHALLENGE_LEN, Challenge};
pub use response::{
    HashScheme, RESPONSE_LEN, SECRET_FIELD_LEN, expected_response, verify_server_response,
};
pub use secret::ZoneSecret;
