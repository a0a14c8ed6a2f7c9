use gss_handshake::identity::{AuthorityInfo, AuthorityVerdict, StaticZones};
use gss_handshake::security::Challenge;
use gss_handshake::testing::MemoryUserStore;
use gss_handshake::{ErrorKind, IdentityReconciler, PrivilegeLevel, RemoteServerAuth, UserIdentity};
use std::sync::Arc;

use PrivilegeLevel::{LocalPrivileged, LocalUser, RemotePrivileged, RemoteUser};

const HOME: &str = "home";

fn init_test(name: &str) {
    crate::common::init_test_logging();
    test_phase!(name);
}

fn reconciler() -> IdentityReconciler {
    IdentityReconciler::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(StaticZones::new(HOME)),
        RemoteServerAuth::Require,
    )
}

fn user(qualified: &str) -> UserIdentity {
    let (name, zone) = qualified.split_once('#').expect("user#zone");
    UserIdentity::new(name, zone)
}

struct Case {
    label: &'static str,
    authority_zone: &'static str,
    proxy: &'static str,
    client: &'static str,
    granted: (PrivilegeLevel, PrivilegeLevel),
    expected: (PrivilegeLevel, PrivilegeLevel),
}

#[test]
fn authority_user_and_zone_matrix() {
    init_test("authority_user_and_zone_matrix");
    let cases = [
        Case {
            label: "home authority, same user, home zone",
            authority_zone: HOME,
            proxy: "alice#home",
            client: "alice#home",
            granted: (LocalPrivileged, LocalUser),
            expected: (LocalPrivileged, LocalPrivileged),
        },
        Case {
            label: "home authority, same user, other zone",
            authority_zone: HOME,
            proxy: "alice#far",
            client: "alice#far",
            granted: (LocalUser, RemoteUser),
            expected: (LocalUser, LocalUser),
        },
        Case {
            label: "home authority, proxied, home zone",
            authority_zone: HOME,
            proxy: "svc#home",
            client: "bob#home",
            granted: (LocalPrivileged, LocalUser),
            expected: (LocalPrivileged, LocalUser),
        },
        Case {
            label: "home authority, proxied, other zone",
            authority_zone: HOME,
            proxy: "svc#home",
            client: "bob#far",
            granted: (LocalPrivileged, LocalUser),
            expected: (LocalPrivileged, LocalUser),
        },
        Case {
            label: "foreign authority, same user, home zone",
            authority_zone: "far",
            proxy: "alice#home",
            client: "alice#home",
            granted: (LocalPrivileged, LocalUser),
            expected: (RemotePrivileged, RemotePrivileged),
        },
        Case {
            label: "foreign authority, same user, other zone",
            authority_zone: "far",
            proxy: "alice#far",
            client: "alice#far",
            granted: (LocalUser, LocalUser),
            expected: (RemoteUser, RemoteUser),
        },
        Case {
            label: "foreign authority, proxied, home zone",
            authority_zone: "far",
            proxy: "svc#home",
            client: "bob#home",
            granted: (LocalPrivileged, RemoteUser),
            expected: (RemotePrivileged, LocalUser),
        },
        Case {
            label: "foreign authority, proxied, other zone",
            authority_zone: "far",
            proxy: "svc#far",
            client: "bob#far",
            granted: (LocalPrivileged, LocalPrivileged),
            expected: (RemotePrivileged, RemoteUser),
        },
    ];

    let reconciler = reconciler();
    let challenge = Challenge::from_bytes([0; 64]);
    for case in cases {
        test_section!(case.label);
        let verdict = AuthorityVerdict {
            privilege_level: case.granted.0,
            client_privilege_level: case.granted.1,
            server_response: None,
        };
        let decision = reconciler
            .reconcile_verdict(
                &challenge,
                case.client,
                &AuthorityInfo::local(case.authority_zone),
                &verdict,
                &user(case.proxy),
                &user(case.client),
            )
            .unwrap_or_else(|err| panic!("{}: {err}", case.label));

        let actual = (decision.privilege_level, decision.client_privilege_level);
        assert_with_log!(actual == case.expected, case.label, case.expected, actual);
    }
    test_complete!("authority_user_and_zone_matrix");
}

#[test]
fn remote_privileged_proxy_is_confined_to_its_zone() {
    init_test("remote_privileged_proxy_is_confined_to_its_zone");
    let verdict = AuthorityVerdict {
        privilege_level: LocalPrivileged,
        client_privilege_level: LocalUser,
        server_response: None,
    };
    let err = reconciler()
        .reconcile_verdict(
            &Challenge::from_bytes([0; 64]),
            "bob#elsewhere",
            &AuthorityInfo::local("far"),
            &verdict,
            &user("svc#home"),
            &user("bob#elsewhere"),
        )
        .expect_err("remote admin acting across zones");
    assert_with_log!(
        err.kind() == ErrorKind::InsufficientProxyPrivilege,
        "cross-zone proxy",
        ErrorKind::InsufficientProxyPrivilege,
        err.kind()
    );
    test_complete!("remote_privileged_proxy_is_confined_to_its_zone");
}

#[test]
fn ordinary_user_cannot_proxy() {
    init_test("ordinary_user_cannot_proxy");
    let verdict = AuthorityVerdict {
        privilege_level: LocalUser,
        client_privilege_level: LocalUser,
        server_response: None,
    };
    let err = reconciler()
        .reconcile_verdict(
            &Challenge::from_bytes([0; 64]),
            "bob#home",
            &AuthorityInfo::local(HOME),
            &verdict,
            &user("alice#home"),
            &user("bob#home"),
        )
        .expect_err("user acting for another user");
    assert_eq!(err.kind(), ErrorKind::InsufficientProxyPrivilege);
    test_complete!("ordinary_user_cannot_proxy");
}

#[test]
fn empty_client_zone_defaults_to_home() {
    init_test("empty_client_zone_defaults_to_home");
    let verdict = AuthorityVerdict {
        privilege_level: LocalPrivileged,
        client_privilege_level: RemoteUser,
        server_response: None,
    };
    let decision = reconciler()
        .reconcile_verdict(
            &Challenge::from_bytes([0; 64]),
            "bob",
            &AuthorityInfo::local("far"),
            &verdict,
            &user("svc#home"),
            &UserIdentity::new("bob", ""),
        )
        .expect("home-zone client");

    assert_eq!(decision.client.zone, HOME);
    assert_eq!(decision.privilege_level, RemotePrivileged);
    assert_eq!(decision.client_privilege_level, LocalUser);
    test_complete!("empty_client_zone_defaults_to_home");
}
