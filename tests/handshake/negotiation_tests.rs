use crate::common::isolated_framer;
use gss_handshake::identity::{AuthorityInfo, AuthorityVerdict};
use gss_handshake::testing::{MemoryUserStore, RoundTripMechanism};
use gss_handshake::{
    Acceptor, AuthAgent, AuthClient, AuthConfig, AuthorityCheck, AuthorityGateway, ClaimedUsers,
    ContextState, ErrorKind, Initiator, NegotiatedFlags, PrivilegeLevel, RemoteServerAuth,
    Result, SessionId,
};
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

const PRINCIPAL: &str = "alice@EXAMPLE.ORG";

fn init_test(name: &str) {
    crate::common::init_test_logging();
    test_phase!(name);
}

#[test]
fn k_rounds_exchange_exactly_k_pairs() {
    init_test("k_rounds_exchange_exactly_k_pairs");
    for k in 1..=5u32 {
        test_section!(format!("k = {k}"));
        let client_mech = Arc::new(RoundTripMechanism::new(k));
        let server_mech = Arc::new(RoundTripMechanism::new(k).with_principal(PRINCIPAL));
        let (mut client_end, mut server_end) = UnixStream::pair().expect("socket pair");

        let server = {
            let mech = Arc::clone(&server_mech);
            thread::spawn(move || {
                Acceptor::new(mech, isolated_framer())
                    .with_drain_timeout(Duration::from_millis(50))
                    .accept(&mut server_end)
            })
        };
        let client_ctx = Initiator::new(Arc::clone(&client_mech), isolated_framer())
            .with_target("host@server")
            .establish(&mut client_end)
            .expect("client establish");
        drop(client_end);

        let (server_ctx, principal) = server.join().expect("server thread").expect("accept");

        assert_eq!(principal.as_str(), PRINCIPAL);
        assert_with_log!(
            server_mech.accept_calls() == k as usize,
            "acceptor steps",
            k,
            server_mech.accept_calls()
        );
        assert_with_log!(
            client_mech.init_calls() == k as usize + 1,
            "initiator steps",
            k + 1,
            client_mech.init_calls()
        );
        assert_eq!(server_ctx.rounds(), k as usize);
        assert_eq!(client_ctx.rounds(), k as usize + 1);
        assert_eq!(client_ctx.state(), ContextState::Established);
        assert!(client_ctx.flags().contains(NegotiatedFlags::MUTUAL | NegotiatedFlags::REPLAY));

        drop(client_ctx);
        drop(server_ctx);
        assert_eq!(client_mech.live_contexts(), 0);
        assert_eq!(server_mech.live_contexts(), 0);
        assert_eq!(server_mech.live_names(), 0);
    }
    test_complete!("k_rounds_exchange_exactly_k_pairs");
}

#[test]
fn acceptor_drains_announced_completion() {
    init_test("acceptor_drains_announced_completion");
    let (mut client_end, mut server_end) = UnixStream::pair().expect("socket pair");
    let server_mech = Arc::new(RoundTripMechanism::new(2));

    let server = {
        let mech = Arc::clone(&server_mech);
        thread::spawn(move || {
            let result = Acceptor::new(mech, isolated_framer())
                .with_io_timeout(Some(Duration::from_secs(5)))
                .accept(&mut server_end);
            let restored = server_end.read_timeout().expect("read timeout");
            (result, restored)
        })
    };
    Initiator::new(Arc::new(RoundTripMechanism::new(2)), isolated_framer())
        .announce_completion(true)
        .establish(&mut client_end)
        .expect("client establish");

    let (result, restored) = server.join().expect("server thread");
    result.expect("accept");
    assert_with_log!(
        restored == Some(Duration::from_secs(5)),
        "drain restores the previous deadline",
        Some(Duration::from_secs(5)),
        restored
    );
    test_complete!("acceptor_drains_announced_completion");
}

/// A socket whose transport keeps the default deadline hooks.
struct PlainSocket(UnixStream);

impl Read for PlainSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for PlainSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl gss_handshake::io::Transport for PlainSocket {
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        gss_handshake::io::Transport::peek(&mut self.0, buf)
    }
}

#[test]
fn drain_is_skipped_without_deadline_support() {
    init_test("drain_is_skipped_without_deadline_support");
    let (mut client_end, server_end) = UnixStream::pair().expect("socket pair");
    let (tx, rx) = mpsc::channel();

    let server = thread::spawn(move || {
        let mut socket = PlainSocket(server_end);
        let result = Acceptor::new(Arc::new(RoundTripMechanism::new(2)), isolated_framer())
            .with_drain_timeout(Duration::from_millis(50))
            .accept(&mut socket)
            .map(|(ctx, _)| ctx.rounds());
        let _ = tx.send(result);
    });
    Initiator::new(Arc::new(RoundTripMechanism::new(2)), isolated_framer())
        .establish(&mut client_end)
        .expect("client establish");

    let outcome = rx.recv_timeout(Duration::from_secs(3));
    assert_with_log!(
        outcome.is_ok(),
        "acceptor returns while the client stays connected",
        "returned",
        outcome
    );
    assert_eq!(outcome.expect("returned").expect("accept"), 2);
    drop(client_end);
    server.join().expect("server thread");
    test_complete!("drain_is_skipped_without_deadline_support");
}

#[test]
fn acceptor_failure_reaches_client_as_io_error() {
    init_test("acceptor_failure_reaches_client_as_io_error");
    let (mut client_end, mut server_end) = UnixStream::pair().expect("socket pair");
    let server_mech = Arc::new(RoundTripMechanism::new(3).fail_accept_at(2));

    let server = {
        let mech = Arc::clone(&server_mech);
        thread::spawn(move || {
            let result = Acceptor::new(mech, isolated_framer()).accept(&mut server_end);
            drop(server_end);
            result.map(|_| ())
        })
    };
    let client_mech = Arc::new(RoundTripMechanism::new(3));
    let err = Initiator::new(Arc::clone(&client_mech), isolated_framer())
        .establish(&mut client_end)
        .expect_err("server hung up");

    let server_err = server.join().expect("server thread").expect_err("injected");
    assert_eq!(server_err.kind(), ErrorKind::Mechanism);
    assert_with_log!(err.kind() == ErrorKind::Io, "client error kind", ErrorKind::Io, err.kind());
    assert_eq!(client_mech.live_contexts(), 0);
    assert_eq!(server_mech.live_contexts(), 0);
    test_complete!("acceptor_failure_reaches_client_as_io_error");
}

struct LocalAuthority;

impl AuthorityGateway for LocalAuthority {
    fn locate(&self, zone: &str) -> Result<AuthorityInfo> {
        Ok(AuthorityInfo::local(zone))
    }

    fn check(
        &self,
        _authority: &AuthorityInfo,
        request: &AuthorityCheck<'_>,
    ) -> Result<AuthorityVerdict> {
        assert_eq!(request.response, "a_scheme=gsseap");
        Ok(AuthorityVerdict {
            privilege_level: PrivilegeLevel::LocalPrivileged,
            client_privilege_level: PrivilegeLevel::LocalPrivileged,
            server_response: None,
        })
    }
}

#[test]
fn client_and_agent_complete_full_flow() {
    init_test("client_and_agent_complete_full_flow");
    let mut config = AuthConfig::new(RemoteServerAuth::Require);
    config.home_zone = "tempZone".into();
    config.server_dn = Some("irods/server@EXAMPLE.ORG".into());
    config.drain_timeout_ms = 50;

    let server_mech = Arc::new(RoundTripMechanism::new(3).with_principal(PRINCIPAL));
    let agent = AuthAgent::new(
        Arc::clone(&server_mech),
        &config,
        Arc::new(MemoryUserStore::new().with_user(PRINCIPAL, "10", "rods", "rodsadmin", "tempZone")),
        Arc::new(config.zones()),
    )
    .expect("agent")
    .with_framer(isolated_framer());
    agent.prepare().expect("prepare");

    let client_mech = Arc::new(RoundTripMechanism::new(3));
    let mut client = AuthClient::new(Arc::clone(&client_mech), &config).with_framer(isolated_framer());
    client.start("rods", "tempZone").expect("start");

    let (mut client_end, mut server_end) = UnixStream::pair().expect("socket pair");
    let id = SessionId::next();

    thread::scope(|scope| {
        let server = scope.spawn(|| {
            agent.start(id, &mut server_end, &ClaimedUsers::named("rods", "tempZone"))
        });
        client.establish(&mut client_end).expect("client establish");
        drop(client_end);

        let mut session = server.join().expect("server thread").expect("agent start");
        assert_eq!(session.id(), id);
        assert_eq!(agent.table().state(id), Some(ContextState::Established));
        assert_eq!(client_mech.last_target().as_deref(), Some("irods/server@EXAMPLE.ORG"));

        let response = client.response().expect("response");
        let decision = agent
            .respond(&mut session, &response, &LocalAuthority)
            .expect("respond");
        assert_eq!(decision.application_user(), "rods");
        assert_eq!(decision.zone(), "tempZone");
        assert_eq!(decision.privilege_level, PrivilegeLevel::LocalPrivileged);
        assert_eq!(decision.client_privilege_level, PrivilegeLevel::LocalPrivileged);
    });

    assert!(agent.table().is_empty());
    assert_eq!(server_mech.live_contexts(), 0);
    test_complete!("client_and_agent_complete_full_flow");
}

#[test]
fn concurrent_sessions_get_distinct_slots() {
    init_test("concurrent_sessions_get_distinct_slots");
    let mut config = AuthConfig::new(RemoteServerAuth::Require);
    config.home_zone = "tempZone".into();
    config.drain_timeout_ms = 20;

    let server_mech = Arc::new(RoundTripMechanism::new(2).with_principal(PRINCIPAL));
    let agent = AuthAgent::new(
        Arc::clone(&server_mech),
        &config,
        Arc::new(MemoryUserStore::new().with_user(PRINCIPAL, "10", "alice", "rodsuser", "tempZone")),
        Arc::new(config.zones()),
    )
    .expect("agent")
    .with_framer(isolated_framer());

    let sessions = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let agent = &agent;
                scope.spawn(move || {
                    let (mut client_end, mut server_end) = UnixStream::pair().expect("socket pair");
                    let client = thread::spawn(move || {
                        Initiator::new(Arc::new(RoundTripMechanism::new(2)), isolated_framer())
                            .establish(&mut client_end)
                            .map(|_| ())
                    });
                    let session = agent
                        .start(SessionId::next(), &mut server_end, &ClaimedUsers::unnamed())
                        .expect("agent start");
                    client.join().expect("client thread").expect("client establish");
                    session
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("worker"))
            .collect::<Vec<_>>()
    });

    assert_eq!(agent.table().len(), 4);
    let mut ids: Vec<_> = sessions.iter().map(|s| s.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(server_mech.credential_acquisitions(), 1);

    drop(sessions);
    assert!(agent.table().is_empty());
    test_complete!("concurrent_sessions_get_distinct_slots");
}
