//! Deterministic collaborators for tests.
//!
//! - [`RoundTripMechanism`]: a mechanism that needs exactly K rounds
//! - [`MemoryUserStore`]: an in-memory user store with provisioning
//! - [`ChunkedTransport`]: a transport that moves bytes in small chunks and
//!   injects interrupts

mod mechanism;
mod store;
mod transport;

pub use mechanism::{RoundTripContext, RoundTripCredential, RoundTripMechanism, RoundTripName};
pub use store::MemoryUserStore;
pub use transport::ChunkedTransport;

/// Installs a test subscriber honoring `RUST_LOG` (default `debug`).
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_logging() {
    #[cfg(feature = "test-internals")]
    {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}
