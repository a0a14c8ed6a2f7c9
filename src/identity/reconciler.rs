//! Mapping a certified principal to an application user and privilege.
//!
//! Reconciliation happens in two passes. [`IdentityReconciler::resolve`]
//! runs right after the handshake and binds the principal to exactly one
//! user record. [`IdentityReconciler::reconcile_verdict`] runs once the
//! authority for the proxy user's zone has answered, and settles the final
//! privilege tiers for the proxy and client users.

use super::names::{QualifiedUserName, UserIdentity};
use super::privilege::{PrivilegeLevel, check_proxy_privilege};
use super::store::{UserRecord, UserStore};
use super::zones::{AuthorityInfo, ZoneDirectory};
use crate::config::RemoteServerAuth;
use crate::error::{Error, ErrorKind, Result};
use crate::security::{Challenge, HashScheme, verify_server_response};
use crate::types::PrincipalName;
use std::sync::Arc;

/// Attribute count of a row looked up with a client-name hint.
const HINTED_ATTRIBUTES: usize = 3;
/// Attribute count of a row looked up by principal alone.
const UNNAMED_ATTRIBUTES: usize = 4;

/// The identities and tiers a session runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeDecision {
    /// The user the connection authenticated as.
    pub proxy: UserIdentity,
    /// The user the connection acts for.
    pub client: UserIdentity,
    /// Tier of the proxy user.
    pub privilege_level: PrivilegeLevel,
    /// Tier of the client user.
    pub client_privilege_level: PrivilegeLevel,
}

impl PrivilegeDecision {
    /// Name of the application user the session runs as.
    #[must_use]
    pub fn application_user(&self) -> &str {
        &self.proxy.name
    }

    /// Zone of the application user.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.proxy.zone
    }
}

/// An authority's answer to an authentication check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityVerdict {
    /// Tier the authority grants the proxy user.
    pub privilege_level: PrivilegeLevel,
    /// Tier the authority grants the client user.
    pub client_privilege_level: PrivilegeLevel,
    /// Proof that the authority holds the zone secret. Only inspected when
    /// the authority is remote.
    pub server_response: Option<Vec<u8>>,
}

/// Binds principals to users and computes privilege decisions.
#[derive(Clone)]
pub struct IdentityReconciler {
    store: Arc<dyn UserStore>,
    zones: Arc<dyn ZoneDirectory>,
    policy: RemoteServerAuth,
    scheme: HashScheme,
}

impl IdentityReconciler {
    /// Creates a reconciler. `policy` decides what a missing remote server
    /// response means and has no default.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        zones: Arc<dyn ZoneDirectory>,
        policy: RemoteServerAuth,
    ) -> Self {
        Self {
            store,
            zones,
            policy,
            scheme: HashScheme::default(),
        }
    }

    /// Selects the hash used to check remote server responses.
    #[must_use]
    pub fn with_hash_scheme(mut self, scheme: HashScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Returns the zone directory.
    #[must_use]
    pub fn zones(&self) -> &Arc<dyn ZoneDirectory> {
        &self.zones
    }

    /// Binds `principal` to exactly one user and derives the initial tier.
    ///
    /// If `client` is named, only that user may match and the proxy check
    /// runs against `proxy`. Otherwise the matching user becomes both
    /// proxy and client.
    pub fn resolve(
        &self,
        principal: &PrincipalName,
        proxy: &UserIdentity,
        client: &UserIdentity,
    ) -> Result<PrivilegeDecision> {
        let hint = (!client.is_unnamed()).then_some(client.name.as_str());
        let record = self.lookup_one(principal, hint)?;

        let (proxy, client, role) = match (hint, record.attributes()) {
            (Some(_), [_id, role, zone]) => {
                let mut client = client.clone();
                if client.zone.is_empty() {
                    client.zone.clone_from(zone);
                }
                (proxy.clone(), client, role.as_str())
            }
            (None, [_id, role, name, zone]) => {
                let user = UserIdentity::new(name.as_str(), zone.as_str());
                (user.clone(), user, role.as_str())
            }
            (_, attributes) => {
                let expected = if hint.is_some() {
                    HINTED_ATTRIBUTES
                } else {
                    UNNAMED_ATTRIBUTES
                };
                return Err(Error::new(ErrorKind::InternalLookup).with_context(format!(
                    "lookup returned {} attributes, expected {expected}",
                    attributes.len()
                )));
            }
        };

        let level = PrivilegeLevel::for_role(role);
        check_proxy_privilege(&proxy, &client, level)?;

        info!(
            principal = %principal,
            proxy = %proxy,
            client = %client,
            level = %level,
            "principal bound to application user"
        );
        Ok(PrivilegeDecision {
            proxy,
            client,
            privilege_level: level,
            client_privilege_level: level,
        })
    }

    /// Settles final tiers from an authority's verdict.
    ///
    /// `username` is the `user#zone` name the client presented; its zone
    /// selects the secret that verifies a remote authority. An empty client
    /// zone is filled in with the home zone before the tiers are adjusted.
    pub fn reconcile_verdict(
        &self,
        challenge: &Challenge,
        username: &str,
        authority: &AuthorityInfo,
        verdict: &AuthorityVerdict,
        proxy: &UserIdentity,
        client: &UserIdentity,
    ) -> Result<PrivilegeDecision> {
        if authority.is_remote() {
            self.verify_remote_server(challenge, username, verdict.server_response.as_deref())?;
        }

        let home_zone = self.zones.home_zone();
        let mut client = client.clone();
        if client.zone.is_empty() {
            client.zone = home_zone.to_owned();
        }

        let same_user = proxy.name == client.name;
        let mut proxy_level = verdict.privilege_level;
        let mut client_level = verdict.client_privilege_level;

        if self.zones.is_foreign_authority(authority) {
            proxy_level = proxy_level.to_remote();
            client_level = if same_user {
                proxy_level
            } else if client.zone == home_zone {
                client_level.to_local()
            } else {
                client_level.to_foreign_client()
            };
        } else if same_user {
            client_level = proxy_level;
        }

        check_proxy_privilege(proxy, &client, proxy_level)?;

        info!(
            proxy_level = %proxy_level,
            client_level = %client_level,
            user = username,
            proxy = %proxy,
            client = %client,
            "authority verdict reconciled"
        );
        Ok(PrivilegeDecision {
            proxy: proxy.clone(),
            client,
            privilege_level: proxy_level,
            client_privilege_level: if same_user { proxy_level } else { client_level },
        })
    }

    /// Checks a remote authority's response to `challenge`.
    ///
    /// A missing or empty response fails with
    /// [`ErrorKind::RemoteServerResponseMissing`] under
    /// [`RemoteServerAuth::Require`] and is logged and accepted under
    /// [`RemoteServerAuth::WarnAndContinue`]. A zone without a configured
    /// secret always fails.
    pub fn verify_remote_server(
        &self,
        challenge: &Challenge,
        username: &str,
        response: Option<&[u8]>,
    ) -> Result<()> {
        let response = match response {
            Some(bytes) if !bytes.is_empty() => bytes,
            missing => {
                let what = if missing.is_none() { "absent" } else { "empty" };
                return match self.policy {
                    RemoteServerAuth::Require => {
                        Err(Error::new(ErrorKind::RemoteServerResponseMissing)
                            .with_context(format!("server response {what}")))
                    }
                    RemoteServerAuth::WarnAndContinue => {
                        warn!(what, "cannot authenticate remote server; continuing by configuration");
                        Ok(())
                    }
                };
            }
        };

        let home_zone = self.zones.home_zone();
        let zone = if username.is_empty() {
            home_zone.to_owned()
        } else {
            QualifiedUserName::parse(username)?.zone_or(home_zone).to_owned()
        };

        let Some(secret) = self.zones.shared_secret_for_zone(&zone) else {
            warn!(zone = %zone, "no shared secret configured for remote zone");
            return Err(Error::new(ErrorKind::NoSharedSecretConfigured)
                .with_context(format!("zone {zone}")));
        };

        verify_server_response(challenge, &secret, self.scheme, response)
    }

    fn lookup_one(&self, principal: &PrincipalName, hint: Option<&str>) -> Result<UserRecord> {
        let mut rows = self.query(principal, hint)?;
        if rows.is_empty() {
            let provisioned = self.store.provision(principal);
            debug!(principal = %principal, provisioned, "no user for principal; re-querying after provisioning");
            rows = self.query(principal, hint)?;
        }

        let count = rows.len();
        let mut rows = rows.into_iter();
        match (rows.next(), count) {
            (Some(record), 1) => Ok(record),
            (None, _) => {
                warn!(principal = %principal, hint, "no matching user for principal");
                Err(Error::new(ErrorKind::NoMatchingIdentity)
                    .with_context(format!("principal {principal}")))
            }
            (Some(_), _) => {
                warn!(principal = %principal, count, "principal matches more than one user");
                Err(Error::new(ErrorKind::AmbiguousIdentity)
                    .with_context(format!("{count} users for principal {principal}")))
            }
        }
    }

    fn query(&self, principal: &PrincipalName, hint: Option<&str>) -> Result<Vec<UserRecord>> {
        self.store
            .lookup_by_certified_name(principal, hint)
            .map_err(|err| Error::new(ErrorKind::InternalLookup).with_context(err.to_string()))
    }
}

impl std::fmt::Debug for IdentityReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityReconciler")
            .field("home_zone", &self.zones.home_zone())
            .field("policy", &self.policy)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
