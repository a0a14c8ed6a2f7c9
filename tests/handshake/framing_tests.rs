use crate::common::{framed, isolated_framer};
use gss_handshake::codec::{FramingMode, FramingState, TokenFramer};
use gss_handshake::io::{read_all, write_all};
use gss_handshake::testing::ChunkedTransport;
use gss_handshake::ErrorKind;
use proptest::prelude::*;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MAX_TOKEN: usize = 65_536;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn framed_round_trip(
        payload in prop::collection::vec(any::<u8>(), 0..=MAX_TOKEN),
        chunk in 1usize..4096,
        interrupts in 0usize..4,
    ) {
        let framer = TokenFramer::with_capacity(Arc::new(FramingState::default()), MAX_TOKEN);

        let mut sender = ChunkedTransport::new(Vec::new(), chunk).with_interrupts(interrupts);
        framer.send_token(&mut sender, &payload).expect("send");

        let mut receiver = ChunkedTransport::new(sender.written().to_vec(), chunk)
            .with_interrupts(interrupts);
        let token = framer.receive_token(&mut receiver).expect("receive");

        prop_assert_eq!(token.len(), payload.len());
        prop_assert_eq!(token.as_bytes(), payload.as_slice());
        prop_assert_eq!(receiver.remaining(), 0);
        prop_assert_eq!(framer.state().mode(), FramingMode::Framed);
    }

    #[test]
    fn short_writes_deliver_every_byte(
        payload in prop::collection::vec(any::<u8>(), 0..8192),
        chunk in 1usize..64,
        interrupts in 0usize..8,
    ) {
        let mut channel = ChunkedTransport::new(Vec::new(), chunk).with_interrupts(interrupts);
        let n = write_all(&mut channel, &payload).expect("write");
        prop_assert_eq!(n, payload.len());
        prop_assert_eq!(channel.written(), payload.as_slice());

        let mut back = ChunkedTransport::new(payload.clone(), chunk).with_interrupts(interrupts);
        let mut buf = vec![0u8; payload.len()];
        let n = read_all(&mut back, &mut buf).expect("read");
        prop_assert_eq!(n, payload.len());
        prop_assert_eq!(buf, payload);
    }
}

#[test]
fn oversized_declared_length_is_rejected_before_payload() {
    init_test("oversized_declared_length_is_rejected_before_payload");
    let framer = TokenFramer::with_capacity(Arc::new(FramingState::default()), 1024);

    let mut wire = 1025u32.to_be_bytes().to_vec();
    wire.extend(std::iter::repeat_n(0x5a, 1025));
    let mut transport = ChunkedTransport::new(wire, 512);

    let err = framer.receive_token(&mut transport).expect_err("too large");
    assert_with_log!(
        err.kind() == ErrorKind::Framing,
        "oversized token kind",
        ErrorKind::Framing,
        err.kind()
    );
    assert_with_log!(
        transport.remaining() == 1025,
        "payload must stay unread",
        1025,
        transport.remaining()
    );
    test_complete!("oversized_declared_length_is_rejected_before_payload");
}

#[test]
fn declared_length_equal_to_capacity_is_accepted() {
    init_test("declared_length_equal_to_capacity_is_accepted");
    let framer = TokenFramer::with_capacity(Arc::new(FramingState::default()), 16);
    let mut transport = ChunkedTransport::new(framed(&[7; 16]), 3);
    let token = framer.receive_token(&mut transport).expect("receive");
    assert_eq!(token.len(), 16);
    test_complete!("declared_length_equal_to_capacity_is_accepted");
}

#[test]
fn truncated_payload_is_partial_read() {
    init_test("truncated_payload_is_partial_read");
    let mut wire = 64u32.to_be_bytes().to_vec();
    wire.extend_from_slice(&[1; 10]);
    let mut transport = ChunkedTransport::new(wire, 4);

    let err = isolated_framer()
        .receive_token(&mut transport)
        .expect_err("truncated");
    assert_with_log!(
        err.kind() == ErrorKind::PartialRead,
        "truncated token kind",
        ErrorKind::PartialRead,
        err.kind()
    );
    test_complete!("truncated_payload_is_partial_read");
}

#[test]
fn prefix_below_threshold_stays_framed() {
    init_test("prefix_below_threshold_stays_framed");
    let state = Arc::new(FramingState::default());
    let framer = TokenFramer::with_capacity(Arc::clone(&state), 100_000);

    let payload = vec![0x42; 99_999];
    let mut transport = ChunkedTransport::new(framed(&payload), 8192);
    let token = framer.receive_token(&mut transport).expect("receive");

    assert_eq!(token.len(), 99_999);
    assert_with_log!(
        state.mode() == FramingMode::Framed,
        "99999 must not trigger fallback",
        FramingMode::Framed,
        state.mode()
    );
    test_complete!("prefix_below_threshold_stays_framed");
}

#[test]
fn legacy_prefix_split_across_segments_switches_to_raw() {
    init_test("legacy_prefix_split_across_segments_switches_to_raw");
    let state = Arc::new(FramingState::default());
    let framer = TokenFramer::new(Arc::clone(&state));
    let (mut peer, mut local) = UnixStream::pair().expect("socket pair");

    let mut legacy = 150_000u32.to_be_bytes().to_vec();
    legacy.extend_from_slice(b"legacy-token");
    let rest = legacy[1..].to_vec();
    peer.write_all(&legacy[..1]).expect("first byte");
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        peer.write_all(&rest).expect("rest");
        peer
    });

    let token = framer.receive_token(&mut local).expect("raw receive");
    let _peer = writer.join().expect("writer");
    assert_with_log!(
        state.mode() == FramingMode::Raw,
        "split legacy header",
        FramingMode::Raw,
        state.mode()
    );
    assert_eq!(token.as_bytes(), legacy.as_slice());
    test_complete!("legacy_prefix_split_across_segments_switches_to_raw");
}

#[test]
fn peer_closing_inside_header_is_partial_read() {
    init_test("peer_closing_inside_header_is_partial_read");
    let (mut peer, mut local) = UnixStream::pair().expect("socket pair");
    peer.write_all(&[0x00, 0x00]).expect("half header");
    drop(peer);

    let err = isolated_framer()
        .receive_token(&mut local)
        .expect_err("closed mid-header");
    assert_with_log!(
        err.kind() == ErrorKind::PartialRead,
        "half header kind",
        ErrorKind::PartialRead,
        err.kind()
    );
    test_complete!("peer_closing_inside_header_is_partial_read");
}

#[test]
fn prefix_above_threshold_switches_every_framer_sharing_state() {
    init_test("prefix_above_threshold_switches_every_framer_sharing_state");
    let state = Arc::new(FramingState::default());
    let first = TokenFramer::new(Arc::clone(&state));
    let second = TokenFramer::new(Arc::clone(&state));

    test_section!("legacy peer");
    let mut legacy = 150_000u32.to_be_bytes().to_vec();
    legacy.extend_from_slice(b"legacy-token");
    let mut transport = ChunkedTransport::new(legacy.clone(), 4096);
    let token = first.receive_token(&mut transport).expect("raw receive");
    assert_eq!(token.as_bytes(), legacy.as_slice());
    assert_with_log!(
        state.mode() == FramingMode::Raw,
        "150000 must trigger fallback",
        FramingMode::Raw,
        state.mode()
    );

    test_section!("later tokens are raw");
    let wire = framed(b"abc");
    let mut transport = ChunkedTransport::new(wire.clone(), 4096);
    let token = second.receive_token(&mut transport).expect("raw receive");
    assert_eq!(token.as_bytes(), wire.as_slice(), "prefix is no longer stripped");
    test_complete!("prefix_above_threshold_switches_every_framer_sharing_state");
}

fn init_test(name: &str) {
    crate::common::init_test_logging();
    test_phase!(name);
}
