use crate::io::Transport;
use std::io::{self, Read, Write};
use std::time::Duration;

/// An in-memory transport that moves at most `chunk` bytes per call.
///
/// Reads drain a fixed input; writes collect into a buffer. The first
/// `interrupts` read or write calls fail with [`io::ErrorKind::Interrupted`].
/// With a write limit, writes past the limit report zero bytes. Peeks see
/// at most one chunk, like a socket that has only one segment buffered.
///
/// Reads never block, so the deadline hooks only record what was set.
#[derive(Debug, Clone)]
pub struct ChunkedTransport {
    input: Vec<u8>,
    pos: usize,
    chunk: usize,
    interrupts: usize,
    write_limit: Option<usize>,
    written: Vec<u8>,
    read_timeout: Option<Duration>,
}

impl ChunkedTransport {
    /// Creates a transport that reads `input` in `chunk`-byte steps.
    #[must_use]
    pub fn new(input: Vec<u8>, chunk: usize) -> Self {
        Self {
            input,
            pos: 0,
            chunk: chunk.max(1),
            interrupts: 0,
            write_limit: None,
            written: Vec::new(),
            read_timeout: None,
        }
    }

    /// Fails the next `count` reads or writes with `Interrupted`.
    #[must_use]
    pub const fn with_interrupts(mut self, count: usize) -> Self {
        self.interrupts = count;
        self
    }

    /// Accepts at most `limit` bytes in total.
    #[must_use]
    pub const fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Bytes written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Input bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn interrupt(&mut self) -> io::Result<()> {
        if self.interrupts > 0 {
            self.interrupts -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        Ok(())
    }
}

impl Read for ChunkedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt()?;
        let n = buf.len().min(self.chunk).min(self.remaining());
        buf[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for ChunkedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.interrupt()?;
        let room = self
            .write_limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(self.written.len()));
        let n = buf.len().min(self.chunk).min(room);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ChunkedTransport {
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk).min(self.remaining());
        buf[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
        Ok(n)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        Ok(self.read_timeout)
    }
}
