//! Token framing.
//!
//! This module provides the 4-byte big-endian length prefix used on the
//! wire, the process-wide [`FramingState`] that remembers whether a legacy
//! unframed peer has been seen, and the [`TokenFramer`] that sends and
//! receives whole tokens over a [`Transport`](crate::io::Transport).

pub mod framed;
pub mod length_prefix;

pub use framed::TokenFramer;
pub use length_prefix::{
    DEFAULT_LEGACY_THRESHOLD, DEFAULT_SCRATCH_CAPACITY, FramingMode, FramingState, HEADER_LEN,
    decode_header, encode_header,
};
