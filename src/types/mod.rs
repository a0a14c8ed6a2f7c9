//! Core value types shared by every layer.
//!
//! - [`id`]: Collision-free session identifiers (`SessionId`)
//! - [`token`]: Opaque mechanism tokens and certified principal names
//! - [`flags`]: Negotiated context flag set
//! - [`oid`]: Mechanism object identifiers

pub mod flags;
pub mod id;
pub mod oid;
pub mod token;

pub use flags::NegotiatedFlags;
pub use id::SessionId;
pub use oid::Oid;
pub use token::{PrincipalName, Token};
