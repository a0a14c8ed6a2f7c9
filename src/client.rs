//! Client-side authentication flow.
//!
//! ```text
//! start(user, zone) -> request_context(base) -> establish(transport) -> response()
//! ```

use crate::codec::{FramingState, TokenFramer};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::identity::UserIdentity;
use crate::io::Transport;
use crate::kvp;
use crate::mechanism::Mechanism;
use crate::session::{EstablishedContext, Initiator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// What the client sends after the handshake so the server can consult
/// the proxy user's authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// `a_scheme=gsseap`.
    pub response: String,
    /// `user#zone`.
    pub username: String,
}

/// Drives one client authentication.
pub struct AuthClient<M: Mechanism> {
    mech: Arc<M>,
    framer: TokenFramer,
    target: Option<String>,
    announce_completion: bool,
    io_timeout: Option<Duration>,
    user: Option<UserIdentity>,
}

impl<M: Mechanism> AuthClient<M> {
    /// Creates a client from configuration, sharing the process framing
    /// state.
    #[must_use]
    pub fn new(mech: Arc<M>, config: &AuthConfig) -> Self {
        let state = FramingState::process_with_threshold(config.legacy_threshold);
        Self {
            mech,
            framer: TokenFramer::with_capacity(state, config.scratch_capacity),
            target: config.server_dn.clone(),
            announce_completion: config.announce_completion,
            io_timeout: config.io_timeout(),
            user: None,
        }
    }

    /// Replaces the framer.
    #[must_use]
    pub fn with_framer(mut self, framer: TokenFramer) -> Self {
        self.framer = framer;
        self
    }

    /// Records the user this client authenticates as.
    pub fn start(&mut self, user: &str, zone: &str) -> Result<()> {
        if user.is_empty() {
            return Err(Error::invalid_input().with_context("client user name is empty"));
        }
        self.user = Some(UserIdentity::new(user, zone));
        debug!(user, zone, "client authentication started");
        Ok(())
    }

    /// The started user.
    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// Appends `a_user=<user>` to `base`.
    ///
    /// Fails with [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput)
    /// if the result exceeds [`kvp::MAX_CONTEXT_LEN`] bytes.
    pub fn request_context(&self, base: &str) -> Result<String> {
        let user = self.started()?;
        let context = kvp::append(base, kvp::AUTH_USER_KEY, &user.name);
        if context.len() > kvp::MAX_CONTEXT_LEN {
            return Err(Error::invalid_input().with_context(format!(
                "context string is {} bytes, limit {}",
                context.len(),
                kvp::MAX_CONTEXT_LEN
            )));
        }
        Ok(context)
    }

    /// Runs the initiator loop against the configured target.
    pub fn establish<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<EstablishedContext<M>> {
        self.started()?;
        let mut initiator = Initiator::new(Arc::clone(&self.mech), self.framer.clone())
            .announce_completion(self.announce_completion)
            .with_io_timeout(self.io_timeout);
        if let Some(target) = &self.target {
            initiator = initiator.with_target(target.clone());
        }
        initiator.establish(transport)
    }

    /// Builds the post-handshake response.
    pub fn response(&self) -> Result<AuthResponse> {
        let user = self.started()?;
        let mut pairs = BTreeMap::new();
        pairs.insert(kvp::AUTH_SCHEME_KEY.to_owned(), kvp::GSSEAP_SCHEME.to_owned());
        Ok(AuthResponse {
            response: kvp::render(&pairs),
            username: user.to_string(),
        })
    }

    fn started(&self) -> Result<&UserIdentity> {
        self.user
            .as_ref()
            .ok_or_else(|| Error::invalid_input().with_context("client authentication not started"))
    }
}

impl<M: Mechanism> std::fmt::Debug for AuthClient<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("target", &self.target)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
