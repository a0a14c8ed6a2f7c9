//! Server-side authentication flow for one connection.
//!
//! ```text
//! prepare()                    shared acceptor credential
//! start(id, transport, users)  slot -> acceptor loop -> principal -> user
//! respond(session, response)   authority check -> final privilege tiers
//! ```
//!
//! The session's slot in the [`ContextTable`] lives as long as the returned
//! [`AuthenticatedSession`].

use crate::client::AuthResponse;
use crate::codec::{FramingState, TokenFramer};
use crate::config::AuthConfig;
use crate::credential::CredentialStore;
use crate::error::Result;
use crate::identity::{
    AuthorityInfo, AuthorityVerdict, IdentityReconciler, PrivilegeDecision, QualifiedUserName,
    UserIdentity, UserStore, ZoneDirectory,
};
use crate::io::Transport;
use crate::kvp;
use crate::mechanism::Mechanism;
use crate::security::Challenge;
use crate::session::{Acceptor, ContextTable, SlotLease};
use crate::types::{PrincipalName, SessionId};
use std::sync::Arc;
use std::time::Duration;

/// An authority's authentication check, as sent to it.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityCheck<'a> {
    /// Challenge issued for this connection.
    pub challenge: &'a Challenge,
    /// The client's response string.
    pub response: &'a str,
    /// The `user#zone` name the client presented.
    pub username: &'a str,
}

/// Reaches the authority that owns a zone's catalog.
pub trait AuthorityGateway: Send + Sync {
    /// Finds the authority for `zone`.
    fn locate(&self, zone: &str) -> Result<AuthorityInfo>;

    /// Asks `authority` to check a client.
    fn check(&self, authority: &AuthorityInfo, request: &AuthorityCheck<'_>)
    -> Result<AuthorityVerdict>;
}

/// The users a client claimed when it connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimedUsers {
    /// The user the connection authenticates as.
    pub proxy: UserIdentity,
    /// The user the connection acts for.
    pub client: UserIdentity,
}

impl ClaimedUsers {
    /// A client that named no user.
    #[must_use]
    pub fn unnamed() -> Self {
        Self::default()
    }

    /// A client acting as itself.
    #[must_use]
    pub fn named(user: &str, zone: &str) -> Self {
        let identity = UserIdentity::new(user, zone);
        Self {
            proxy: identity.clone(),
            client: identity,
        }
    }

    /// A proxy acting for another user.
    #[must_use]
    pub const fn proxied(proxy: UserIdentity, client: UserIdentity) -> Self {
        Self { proxy, client }
    }

    /// Reads the `a_user` entry of a client's request context, as built by
    /// [`AuthClient::request_context`](crate::AuthClient::request_context).
    ///
    /// The value may be `user#zone`. A context without `a_user` names no
    /// user.
    pub fn from_request_context(context: &str) -> Result<Self> {
        let pairs = kvp::parse(context)?;
        match pairs.get(kvp::AUTH_USER_KEY).filter(|user| !user.is_empty()) {
            Some(user) => {
                let name = QualifiedUserName::parse(user)?;
                Ok(Self::named(name.user(), name.zone().unwrap_or_default()))
            }
            None => Ok(Self::unnamed()),
        }
    }
}

/// One authenticated connection.
pub struct AuthenticatedSession<M: Mechanism> {
    lease: SlotLease<M>,
    principal: PrincipalName,
    challenge: Challenge,
    decision: PrivilegeDecision,
}

impl<M: Mechanism> AuthenticatedSession<M> {
    /// The session's identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.lease.id()
    }

    /// The certified principal of the peer.
    #[must_use]
    pub fn principal(&self) -> &PrincipalName {
        &self.principal
    }

    /// The challenge authorities must answer for this session.
    #[must_use]
    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// The current privilege decision.
    #[must_use]
    pub fn decision(&self) -> &PrivilegeDecision {
        &self.decision
    }
}

impl<M: Mechanism> std::fmt::Debug for AuthenticatedSession<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("id", &self.id())
            .field("principal", &self.principal)
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}

/// Server-side authentication for every connection in a process.
pub struct AuthAgent<M: Mechanism> {
    mech: Arc<M>,
    framer: TokenFramer,
    credentials: CredentialStore<M>,
    table: Arc<ContextTable<M>>,
    reconciler: IdentityReconciler,
    io_timeout: Option<Duration>,
    drain_timeout: Duration,
}

impl<M: Mechanism> AuthAgent<M> {
    /// Builds an agent from configuration and its collaborators.
    pub fn new(
        mech: Arc<M>,
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        zones: Arc<dyn ZoneDirectory>,
    ) -> Result<Self> {
        let oid = config.mechanism()?;
        let state = FramingState::process_with_threshold(config.legacy_threshold);
        Ok(Self {
            framer: TokenFramer::with_capacity(state, config.scratch_capacity),
            credentials: CredentialStore::new(Arc::clone(&mech), Some(oid)),
            table: Arc::new(ContextTable::new(config.max_sessions)),
            reconciler: IdentityReconciler::new(users, zones, config.remote_server_auth)
                .with_hash_scheme(config.hash_scheme),
            io_timeout: config.io_timeout(),
            drain_timeout: config.drain_timeout(),
            mech,
        })
    }

    /// Replaces the framer.
    #[must_use]
    pub fn with_framer(mut self, framer: TokenFramer) -> Self {
        self.framer = framer;
        self
    }

    /// The context table.
    #[must_use]
    pub fn table(&self) -> &Arc<ContextTable<M>> {
        &self.table
    }

    /// Acquires the shared acceptor credential if it is not held yet.
    pub fn prepare(&self) -> Result<()> {
        self.credentials.acquire().map(|_| ())
    }

    /// Authenticates one connection.
    ///
    /// Admits a slot for `id`, runs the acceptor loop on `transport`, binds
    /// the peer's principal to a user and parks the established context.
    /// Any failure releases the slot.
    pub fn start<T: Transport + ?Sized>(
        &self,
        id: SessionId,
        transport: &mut T,
        users: &ClaimedUsers,
    ) -> Result<AuthenticatedSession<M>> {
        let lease = self.table.admit(id)?;
        let credential = self.credentials.acquire()?;

        let (ctx, principal) = Acceptor::new(Arc::clone(&self.mech), self.framer.clone())
            .with_credential(credential)
            .with_io_timeout(self.io_timeout)
            .with_drain_timeout(self.drain_timeout)
            .accept(transport)?;

        let proxy = if users.proxy.is_unnamed() {
            &users.client
        } else {
            &users.proxy
        };
        let decision = self.reconciler.resolve(&principal, proxy, &users.client)?;

        info!(
            session = %id,
            principal = %principal,
            user = %decision.client,
            flags = %ctx.flags(),
            "connection authenticated"
        );
        lease.park(ctx);

        Ok(AuthenticatedSession {
            lease,
            principal,
            challenge: Challenge::generate()?,
            decision,
        })
    }

    /// Consults the proxy user's authority and settles final tiers.
    ///
    /// A remote authority must prove it holds the zone secret by answering
    /// the session's challenge.
    pub fn respond(
        &self,
        session: &mut AuthenticatedSession<M>,
        response: &AuthResponse,
        gateway: &dyn AuthorityGateway,
    ) -> Result<PrivilegeDecision> {
        let home_zone = self.reconciler.zones().home_zone().to_owned();
        let zone = if session.decision.proxy.zone.is_empty() {
            home_zone.as_str()
        } else {
            session.decision.proxy.zone.as_str()
        };
        let authority = gateway.locate(zone)?;
        debug!(session = %session.id(), zone, remote = authority.is_remote(), "consulting authority");

        let verdict = gateway.check(
            &authority,
            &AuthorityCheck {
                challenge: &session.challenge,
                response: &response.response,
                username: &response.username,
            },
        )?;

        let decision = self.reconciler.reconcile_verdict(
            &session.challenge,
            &response.username,
            &authority,
            &verdict,
            &session.decision.proxy,
            &session.decision.client,
        )?;
        session.decision = decision.clone();
        Ok(decision)
    }
}

impl<M: Mechanism> std::fmt::Debug for AuthAgent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthAgent")
            .field("table", &self.table)
            .field("credentials", &self.credentials)
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}
