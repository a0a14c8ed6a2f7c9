//! Negotiated context flags.

use core::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of protection services negotiated for a security context.
///
/// Bit values follow the GSS-API context flag assignments so that a mechanism
/// adapter can pass them through unchanged. Once a context is established
/// its flags are fixed.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NegotiatedFlags(u32);

impl NegotiatedFlags {
    /// Credential delegation.
    pub const DELEGATION: Self = Self(1);
    /// Mutual authentication.
    pub const MUTUAL: Self = Self(2);
    /// Replay detection.
    pub const REPLAY: Self = Self(4);
    /// Out-of-sequence detection.
    pub const SEQUENCE: Self = Self(8);
    /// Confidentiality (wrap with encryption).
    pub const CONFIDENTIALITY: Self = Self(16);
    /// Integrity (per-message MIC).
    pub const INTEGRITY: Self = Self(32);

    /// The flags an initiator requests.
    pub const REQUESTED: Self = Self(Self::MUTUAL.0 | Self::REPLAY.0);

    const NAMES: [(Self, &'static str); 6] = [
        (Self::MUTUAL, "mutual"),
        (Self::REPLAY, "replay"),
        (Self::SEQUENCE, "sequence"),
        (Self::CONFIDENTIALITY, "conf"),
        (Self::INTEGRITY, "integ"),
        (Self::DELEGATION, "deleg"),
    ];

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw bits, keeping only known flags.
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & 0x3f)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the set with `other` added.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for NegotiatedFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NegotiatedFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for NegotiatedFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NegotiatedFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NegotiatedFlags({self})")
    }
}
