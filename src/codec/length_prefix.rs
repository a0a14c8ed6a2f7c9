//! The 4-byte length prefix and the process-wide framing mode.
//!
//! Wire format: a big-endian `u32` length followed by exactly that many
//! opaque bytes. Peers that predate framing send bare tokens; a receiver
//! that peeks a prefix larger than the legacy threshold concludes it is
//! talking to such a peer and switches, for the rest of the process, to
//! [`FramingMode::Raw`].

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Length of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// A peeked prefix above this value selects the legacy raw format.
pub const DEFAULT_LEGACY_THRESHOLD: u32 = 100_000;

/// Default capacity of the receive scratch buffer.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 20_000;

static PROCESS_STATE: OnceLock<Arc<FramingState>> = OnceLock::new();

/// Encodes a token length as a frame header.
///
/// Fails with [`ErrorKind::Framing`](crate::ErrorKind::Framing) when the
/// length does not fit in 32 bits.
pub fn encode_header(len: usize) -> Result<[u8; HEADER_LEN]> {
    let len = u32::try_from(len)
        .map_err(|_| Error::framing().with_context(format!("token of {len} bytes exceeds u32 length prefix")))?;
    Ok(len.to_be_bytes())
}

/// Decodes a frame header into the declared token length.
#[must_use]
pub const fn decode_header(header: [u8; HEADER_LEN]) -> u32 {
    u32::from_be_bytes(header)
}

/// Wire format used by a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramingMode {
    /// Length-prefixed tokens.
    Framed,
    /// Legacy bare tokens: one read yields one token.
    Raw,
}

/// Framing mode shared by every receiver in a process.
///
/// The switch to [`FramingMode::Raw`] is one-way. Tests build their own
/// state with [`FramingState::new`]; production code shares
/// [`FramingState::process`].
#[derive(Debug)]
pub struct FramingState {
    raw: AtomicBool,
    legacy_threshold: u32,
}

impl FramingState {
    /// Creates a state in [`FramingMode::Framed`].
    #[must_use]
    pub const fn new(legacy_threshold: u32) -> Self {
        Self {
            raw: AtomicBool::new(false),
            legacy_threshold,
        }
    }

    /// Returns the process-wide state, creating it with the default
    /// threshold on first use.
    #[must_use]
    pub fn process() -> Arc<Self> {
        Self::process_with_threshold(DEFAULT_LEGACY_THRESHOLD)
    }

    /// Returns the process-wide state. The threshold only takes effect if
    /// this call creates the state.
    #[must_use]
    pub fn process_with_threshold(legacy_threshold: u32) -> Arc<Self> {
        Arc::clone(PROCESS_STATE.get_or_init(|| Arc::new(Self::new(legacy_threshold))))
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> FramingMode {
        if self.raw.load(Ordering::Acquire) {
            FramingMode::Raw
        } else {
            FramingMode::Framed
        }
    }

    /// Returns the legacy detection threshold.
    #[must_use]
    pub const fn legacy_threshold(&self) -> u32 {
        self.legacy_threshold
    }

    /// Inspects a peeked prefix and switches to raw mode if it is implausible.
    ///
    /// Returns the mode to use for the token that follows.
    pub fn observe_prefix(&self, header: [u8; HEADER_LEN]) -> FramingMode {
        let declared = decode_header(header);
        if declared > self.legacy_threshold {
            if !self.raw.swap(true, Ordering::AcqRel) {
                warn!(
                    declared,
                    threshold = self.legacy_threshold,
                    "peer sent implausible token length; switching to unframed legacy mode for this process"
                );
            }
            FramingMode::Raw
        } else {
            self.mode()
        }
    }
}

impl Default for FramingState {
    fn default() -> Self {
        Self::new(DEFAULT_LEGACY_THRESHOLD)
    }
}
