//! Identity and privilege reconciliation.
//!
//! - [`names`]: `UserIdentity` and `user#zone` parsing
//! - [`privilege`]: Privilege tiers and the proxy authorization rule
//! - [`store`]: The user-store contract
//! - [`zones`]: Authorities, zones and shared secrets
//! - [`reconciler`]: From certified principal to [`PrivilegeDecision`]
//!
//! # Zone Reconciliation
//!
//! When the authority that answered for the proxy user serves another
//! zone's catalog, its tiers are remapped:
//!
//! ```text
//! proxy                      local-privileged -> remote-privileged
//!                            local-user       -> remote-user
//! client == proxy            inherits the proxy's remapped tier
//! client in home zone        remote -> local re-promotion
//! client in another zone     local tiers -> remote-user
//! ```

pub mod names;
pub mod privilege;
pub mod reconciler;
pub mod store;
pub mod zones;

pub use names::{QualifiedUserName, UserIdentity};
pub use privilege::{ADMIN_ROLE, PrivilegeLevel, check_proxy_privilege};
pub use reconciler::{AuthorityVerdict, IdentityReconciler, PrivilegeDecision};
pub use store::{StoreError, UserRecord, UserStore};
pub use zones::{AuthorityInfo, AuthorityLocation, StaticZones, ZoneDirectory};
