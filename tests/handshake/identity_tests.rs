use crate::common::{framed, isolated_framer};
use gss_handshake::identity::{QualifiedUserName, StaticZones};
use gss_handshake::testing::{ChunkedTransport, MemoryUserStore, RoundTripMechanism};
use gss_handshake::{
    AuthAgent, AuthConfig, ClaimedUsers, ErrorKind, IdentityReconciler, PrincipalName,
    PrivilegeLevel, RemoteServerAuth, SessionId, UserIdentity, UserStore,
};
use std::sync::Arc;

const DN: &str = "/C=US/O=Example/CN=alice";

fn init_test(name: &str) {
    crate::common::init_test_logging();
    test_phase!(name);
}

fn reconciler(store: Arc<MemoryUserStore>) -> IdentityReconciler {
    IdentityReconciler::new(
        store as Arc<dyn UserStore>,
        Arc::new(StaticZones::new("home")),
        RemoteServerAuth::Require,
    )
}

#[test]
fn principal_bound_to_two_users_is_ambiguous() {
    init_test("principal_bound_to_two_users_is_ambiguous");
    let store = Arc::new(
        MemoryUserStore::new()
            .with_user(DN, "1", "alice", "rodsuser", "home")
            .with_user(DN, "2", "alice_admin", "rodsadmin", "home"),
    );

    let err = reconciler(Arc::clone(&store))
        .resolve(&PrincipalName::new(DN), &UserIdentity::anonymous(), &UserIdentity::anonymous())
        .expect_err("two matches");
    assert_with_log!(
        err.kind() == ErrorKind::AmbiguousIdentity,
        "unnamed lookup",
        ErrorKind::AmbiguousIdentity,
        err.kind()
    );
    assert_eq!(store.provision_calls(), 0, "rows were found; nothing to provision");

    test_section!("a name hint disambiguates");
    let admin = UserIdentity::new("alice_admin", "home");
    let decision = reconciler(store)
        .resolve(&PrincipalName::new(DN), &admin, &admin)
        .expect("hinted");
    assert_eq!(decision.privilege_level, PrivilegeLevel::LocalPrivileged);
    test_complete!("principal_bound_to_two_users_is_ambiguous");
}

#[test]
fn hinted_lookup_provisions_on_miss() {
    init_test("hinted_lookup_provisions_on_miss");
    let store = Arc::new(MemoryUserStore::new().provision_as(DN, "9", "alice", "rodsuser", "home"));
    let alice = UserIdentity::new("alice", "");

    let decision = reconciler(Arc::clone(&store))
        .resolve(&PrincipalName::new(DN), &alice, &alice)
        .expect("provisioned");

    assert_eq!(decision.client, UserIdentity::new("alice", "home"));
    assert_eq!(store.provision_calls(), 1);
    assert_eq!(store.lookups(), 2);
    test_complete!("hinted_lookup_provisions_on_miss");
}

#[test]
fn proxy_without_privilege_is_rejected_at_bind() {
    init_test("proxy_without_privilege_is_rejected_at_bind");
    let store = Arc::new(MemoryUserStore::new().with_user(DN, "1", "bob", "rodsuser", "home"));
    let err = reconciler(store)
        .resolve(
            &PrincipalName::new(DN),
            &UserIdentity::new("svc", "home"),
            &UserIdentity::new("bob", "home"),
        )
        .expect_err("rodsuser proxy");
    assert_eq!(err.kind(), ErrorKind::InsufficientProxyPrivilege);
    test_complete!("proxy_without_privilege_is_rejected_at_bind");
}

#[test]
fn unknown_principal_fails_and_frees_the_slot() {
    init_test("unknown_principal_fails_and_frees_the_slot");
    let mut config = AuthConfig::new(RemoteServerAuth::Require);
    config.home_zone = "home".into();
    config.drain_timeout_ms = 10;

    let mech = Arc::new(RoundTripMechanism::new(1).with_principal("stranger@EXAMPLE.ORG"));
    let store = Arc::new(MemoryUserStore::new());
    let agent = AuthAgent::new(
        Arc::clone(&mech),
        &config,
        Arc::clone(&store) as Arc<dyn UserStore>,
        Arc::new(config.zones()),
    )
    .expect("agent")
    .with_framer(isolated_framer());

    let mut transport = ChunkedTransport::new(framed(b"rt-req:1"), 64);
    let err = agent
        .start(SessionId::next(), &mut transport, &ClaimedUsers::unnamed())
        .expect_err("nobody");

    assert_with_log!(
        err.kind() == ErrorKind::NoMatchingIdentity,
        "unknown principal",
        ErrorKind::NoMatchingIdentity,
        err.kind()
    );
    assert_eq!(store.provision_calls(), 1);
    assert!(agent.table().is_empty());
    assert_eq!(mech.live_contexts(), 0);
    test_complete!("unknown_principal_fails_and_frees_the_slot");
}

#[test]
fn qualified_names_split_on_hash() {
    init_test("qualified_names_split_on_hash");
    let name = QualifiedUserName::parse("rods#tempZone").expect("parse");
    assert_eq!(name.user(), "rods");
    assert_eq!(name.zone(), Some("tempZone"));

    let bare = QualifiedUserName::parse("rods").expect("parse");
    assert_eq!(bare.zone(), None);
    assert_eq!(bare.zone_or("home"), "home");
    test_complete!("qualified_names_split_on_hash");
}
