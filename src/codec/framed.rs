//! Sending and receiving whole tokens over a [`Transport`].

use super::length_prefix::{
    DEFAULT_SCRATCH_CAPACITY, FramingMode, FramingState, HEADER_LEN, decode_header, encode_header,
};
use crate::error::{Error, ErrorKind, Result};
use crate::io::{Transport, read_all, write_all};
use crate::types::Token;
use std::io::{self, Write};
use std::sync::Arc;

/// Moves tokens across a transport using length-prefix framing.
///
/// Sending always frames. Receiving peeks at the next four bytes first so
/// that an unframed legacy peer is detected before anything is consumed;
/// see [`FramingState`].
///
/// # Example
///
/// ```
/// use gss_handshake::{FramingState, Token, TokenFramer};
/// use std::sync::Arc;
///
/// let framer = TokenFramer::new(Arc::new(FramingState::default()));
/// let mut wire = Vec::new();
/// framer.send_token(&mut wire, b"hello").unwrap();
/// assert_eq!(wire, b"\x00\x00\x00\x05hello");
/// ```
#[derive(Debug, Clone)]
pub struct TokenFramer {
    state: Arc<FramingState>,
    capacity: usize,
}

impl TokenFramer {
    /// Creates a framer with the default scratch capacity.
    #[must_use]
    pub fn new(state: Arc<FramingState>) -> Self {
        Self::with_capacity(state, DEFAULT_SCRATCH_CAPACITY)
    }

    /// Creates a framer that rejects tokens larger than `capacity`.
    #[must_use]
    pub fn with_capacity(state: Arc<FramingState>, capacity: usize) -> Self {
        Self { state, capacity }
    }

    /// Returns the receive capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the shared framing state.
    #[must_use]
    pub fn state(&self) -> &Arc<FramingState> {
        &self.state
    }

    /// Sends one framed token: the big-endian length, then the payload.
    ///
    /// A short write of either part is an [`ErrorKind::Io`] error.
    pub fn send_token<W: Write + ?Sized>(&self, writer: &mut W, token: &[u8]) -> Result<()> {
        let header = encode_header(token.len())?;

        let n = write_all(writer, &header)?;
        if n != HEADER_LEN {
            return Err(short_write("token header", n, HEADER_LEN));
        }

        let n = write_all(writer, token)?;
        if n != token.len() {
            return Err(short_write("token payload", n, token.len()));
        }
        writer.flush()?;

        trace!(
            len = token.len(),
            hex = %Token::from(token).abbreviated_hex(),
            "sent token"
        );
        Ok(())
    }

    /// Receives one token.
    ///
    /// In framed mode a declared length above the capacity fails with
    /// [`ErrorKind::Framing`] before any payload is read, and a stream that
    /// ends early fails with [`ErrorKind::PartialRead`]. A stream that ends
    /// before any header byte fails with [`ErrorKind::Io`].
    pub fn receive_token<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Token> {
        let token = match self.state.mode() {
            FramingMode::Raw => self.receive_raw(transport, &[])?,
            FramingMode::Framed => match peek_header(transport)? {
                Header::Peeked(header) => match self.state.observe_prefix(header) {
                    FramingMode::Framed => self.receive_framed(transport)?,
                    FramingMode::Raw => self.receive_raw(transport, &[])?,
                },
                Header::Consumed(header) => match self.state.observe_prefix(header) {
                    FramingMode::Framed => self.receive_payload(transport, header)?,
                    FramingMode::Raw => self.receive_raw(transport, &header)?,
                },
            },
        };

        trace!(
            len = token.len(),
            hex = %token.abbreviated_hex(),
            "received token"
        );
        Ok(token)
    }

    fn receive_framed<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Token> {
        let header = read_header(transport)?;
        self.receive_payload(transport, header)
    }

    fn receive_payload<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        header: [u8; HEADER_LEN],
    ) -> Result<Token> {
        let declared = decode_header(header) as usize;
        if declared > self.capacity {
            return Err(Error::framing().with_context(format!(
                "declared token length {declared} exceeds capacity {}",
                self.capacity
            )));
        }

        let mut payload = vec![0u8; declared];
        let n = read_all(transport, &mut payload)?;
        if n != declared {
            return Err(Error::partial_read()
                .with_context(format!("read {n} of {declared} declared token bytes")));
        }
        Ok(Token::new(payload))
    }

    /// Accepts one read as the whole token, after any header bytes that
    /// were already consumed.
    fn receive_raw<T: Transport + ?Sized>(&self, transport: &mut T, prefix: &[u8]) -> Result<Token> {
        let mut scratch = vec![0u8; self.capacity.max(prefix.len())];
        scratch[..prefix.len()].copy_from_slice(prefix);
        if prefix.len() == scratch.len() {
            return Ok(Token::new(scratch));
        }
        loop {
            match transport.read(&mut scratch[prefix.len()..]) {
                Ok(0) => {
                    return Err(Error::new(ErrorKind::Io)
                        .with_context("peer closed while reading unframed token"));
                }
                Ok(n) => {
                    scratch.truncate(prefix.len() + n);
                    return Ok(Token::new(scratch));
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// The four bytes that decide the framing mode.
enum Header {
    /// Still pending on the transport.
    Peeked([u8; HEADER_LEN]),
    /// Already read off the transport.
    Consumed([u8; HEADER_LEN]),
}

/// Looks at the next header without consuming it when the transport has
/// all four bytes buffered.
///
/// When a peek comes back short the header arrived split across segments.
/// The rest is then read with a blocking read, which also tells a slow peer
/// apart from one that closed mid-header.
fn peek_header<T: Transport + ?Sized>(transport: &mut T) -> Result<Header> {
    let mut header = [0u8; HEADER_LEN];
    loop {
        match transport.peek(&mut header) {
            Ok(0) => return Err(closed_before_header()),
            Ok(n) if n >= HEADER_LEN => return Ok(Header::Peeked(header)),
            Ok(n) => {
                trace!(peeked = n, "short header peek; reading the rest");
                return read_header(transport).map(Header::Consumed);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_header<T: Transport + ?Sized>(transport: &mut T) -> Result<[u8; HEADER_LEN]> {
    let mut header = [0u8; HEADER_LEN];
    let n = read_all(transport, &mut header)?;
    if n == 0 {
        return Err(closed_before_header());
    }
    if n != HEADER_LEN {
        return Err(Error::partial_read()
            .with_context(format!("read {n} of {HEADER_LEN} header bytes")));
    }
    Ok(header)
}

fn closed_before_header() -> Error {
    Error::from(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "peer closed before token header",
    ))
}

fn short_write(what: &str, written: usize, expected: usize) -> Error {
    Error::new(ErrorKind::Io).with_context(format!("short write of {what}: {written} of {expected} bytes"))
}
