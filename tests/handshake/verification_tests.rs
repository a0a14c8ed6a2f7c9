use gss_handshake::identity::{AuthorityInfo, AuthorityVerdict, StaticZones};
use gss_handshake::security::{
    Challenge, HashScheme, RESPONSE_LEN, SECRET_FIELD_LEN, ZoneSecret, expected_response,
    verify_server_response,
};
use gss_handshake::testing::MemoryUserStore;
use gss_handshake::{
    ErrorKind, IdentityReconciler, PrivilegeLevel, RemoteServerAuth, UserIdentity,
};
use proptest::prelude::*;
use std::sync::Arc;

const HOME: &str = "home";
const FAR_SECRET: &str = "far-zone-key";

fn init_test(name: &str) {
    crate::common::init_test_logging();
    test_phase!(name);
}

fn reconciler(policy: RemoteServerAuth, scheme: HashScheme) -> IdentityReconciler {
    IdentityReconciler::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(StaticZones::new(HOME).with_secret("far", FAR_SECRET)),
        policy,
    )
    .with_hash_scheme(scheme)
}

fn verdict(server_response: Option<Vec<u8>>) -> AuthorityVerdict {
    AuthorityVerdict {
        privilege_level: PrivilegeLevel::LocalUser,
        client_privilege_level: PrivilegeLevel::LocalUser,
        server_response,
    }
}

#[test]
fn correct_response_passes_for_every_scheme() {
    init_test("correct_response_passes_for_every_scheme");
    let challenge = Challenge::generate().expect("challenge");
    let secret = ZoneSecret::from(FAR_SECRET);
    let alice = UserIdentity::new("alice", "far");

    for scheme in [HashScheme::Md5, HashScheme::Sha256, HashScheme::HmacSha256] {
        test_section!(scheme.as_str());
        let response = expected_response(&challenge, &secret, scheme).expect("hash");
        let decision = reconciler(RemoteServerAuth::Require, scheme)
            .reconcile_verdict(
                &challenge,
                "alice#far",
                &AuthorityInfo::remote("far"),
                &verdict(Some(response.to_vec())),
                &alice,
                &alice,
            )
            .expect("verified");
        assert_eq!(decision.privilege_level, PrivilegeLevel::RemoteUser);
    }
    test_complete!("correct_response_passes_for_every_scheme");
}

#[test]
fn every_single_bit_flip_is_rejected() {
    init_test("every_single_bit_flip_is_rejected");
    let challenge = Challenge::from_bytes([0x5c; 64]);
    let secret = ZoneSecret::from(FAR_SECRET);
    let good = expected_response(&challenge, &secret, HashScheme::Md5).expect("hash");

    for index in 0..RESPONSE_LEN {
        for bit in 0..8 {
            let mut forged = good;
            forged[index] ^= 1 << bit;
            let err = verify_server_response(&challenge, &secret, HashScheme::Md5, &forged)
                .expect_err("forged response");
            assert_with_log!(
                err.kind() == ErrorKind::RemoteServerAuthenticationFailure,
                format!("byte {index} bit {bit}"),
                ErrorKind::RemoteServerAuthenticationFailure,
                err.kind()
            );
        }
    }
    test_complete!("every_single_bit_flip_is_rejected");
}

#[test]
fn truncated_response_is_rejected() {
    init_test("truncated_response_is_rejected");
    let challenge = Challenge::from_bytes([1; 64]);
    let secret = ZoneSecret::from(FAR_SECRET);
    let good = expected_response(&challenge, &secret, HashScheme::Md5).expect("hash");

    let err = verify_server_response(&challenge, &secret, HashScheme::Md5, &good[..RESPONSE_LEN - 1])
        .expect_err("short response");
    assert_eq!(err.kind(), ErrorKind::RemoteServerAuthenticationFailure);

    let mut padded = good.to_vec();
    padded.extend_from_slice(b"trailing");
    verify_server_response(&challenge, &secret, HashScheme::Md5, &padded)
        .expect("only the digest length is compared");
    test_complete!("truncated_response_is_rejected");
}

#[test]
fn missing_response_follows_policy() {
    init_test("missing_response_follows_policy");
    let challenge = Challenge::from_bytes([2; 64]);
    let alice = UserIdentity::new("alice", "far");

    for response in [None, Some(Vec::new())] {
        test_section!(format!("response = {response:?}"));
        let err = reconciler(RemoteServerAuth::Require, HashScheme::Md5)
            .reconcile_verdict(
                &challenge,
                "alice#far",
                &AuthorityInfo::remote("far"),
                &verdict(response.clone()),
                &alice,
                &alice,
            )
            .expect_err("required");
        assert_with_log!(
            err.kind() == ErrorKind::RemoteServerResponseMissing,
            "require policy",
            ErrorKind::RemoteServerResponseMissing,
            err.kind()
        );

        let decision = reconciler(RemoteServerAuth::WarnAndContinue, HashScheme::Md5)
            .reconcile_verdict(
                &challenge,
                "alice#far",
                &AuthorityInfo::remote("far"),
                &verdict(response),
                &alice,
                &alice,
            )
            .expect("warn-and-continue accepts");
        assert_eq!(decision.privilege_level, PrivilegeLevel::RemoteUser);
    }
    test_complete!("missing_response_follows_policy");
}

#[test]
fn local_authority_skips_verification() {
    init_test("local_authority_skips_verification");
    let alice = UserIdentity::new("alice", HOME);
    let decision = reconciler(RemoteServerAuth::Require, HashScheme::Md5)
        .reconcile_verdict(
            &Challenge::from_bytes([3; 64]),
            "alice#home",
            &AuthorityInfo::local(HOME),
            &verdict(None),
            &alice,
            &alice,
        )
        .expect("local answers are trusted");
    assert_eq!(decision.privilege_level, PrivilegeLevel::LocalUser);
    test_complete!("local_authority_skips_verification");
}

#[test]
fn md5_ignores_secret_bytes_past_field() {
    init_test("md5_ignores_secret_bytes_past_field");
    let challenge = Challenge::from_bytes([4; 64]);
    let base = vec![b'k'; SECRET_FIELD_LEN];
    let mut longer = base.clone();
    longer.extend_from_slice(b"ignored tail");

    let a = expected_response(&challenge, &ZoneSecret::new(base), HashScheme::Md5).expect("hash");
    let b = expected_response(&challenge, &ZoneSecret::new(longer), HashScheme::Md5).expect("hash");
    assert_eq!(a, b);
    assert!(a.iter().all(|&byte| byte != 0), "digest never carries a zero byte");
    test_complete!("md5_ignores_secret_bytes_past_field");
}

#[test]
fn challenges_are_fresh() {
    init_test("challenges_are_fresh");
    let first = Challenge::generate().expect("challenge");
    let second = Challenge::generate().expect("challenge");
    assert_ne!(first.as_bytes(), second.as_bytes());
    test_complete!("challenges_are_fresh");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wrong_secret_never_verifies(
        challenge in prop::array::uniform32(any::<u8>()),
        secret in "[a-z0-9]{1,40}",
        other in "[a-z0-9]{1,40}",
    ) {
        prop_assume!(secret != other);
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&challenge);
        bytes[32..].copy_from_slice(&challenge);
        let challenge = Challenge::from_bytes(bytes);

        let response = expected_response(&challenge, &ZoneSecret::from(secret.as_str()), HashScheme::Md5)
            .expect("hash");
        prop_assert!(verify_server_response(
            &challenge,
            &ZoneSecret::from(secret.as_str()),
            HashScheme::Md5,
            &response
        )
        .is_ok());
        prop_assert!(verify_server_response(
            &challenge,
            &ZoneSecret::from(other.as_str()),
            HashScheme::Md5,
            &response
        )
        .is_err());
    }
}
