//! The byte-stream seam between the negotiation core and the host.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// A bidirectional byte stream that can also peek at pending bytes.
///
/// Every operation blocks. Hosts that want deadlines install them through
/// [`set_read_timeout`](Transport::set_read_timeout) and
/// [`set_write_timeout`](Transport::set_write_timeout); a timed-out read
/// surfaces as an ordinary I/O error and ends the negotiation.
///
/// The deadline hooks default to [`io::ErrorKind::Unsupported`]. Steps that
/// need a bounded read, such as the acceptor's final drain, are skipped on
/// transports that keep the defaults.
pub trait Transport: Read + Write {
    /// Copies up to `buf.len()` pending bytes into `buf` without consuming
    /// them. Blocks until at least one byte is available or the peer closes.
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Sets (or clears) the deadline applied to each read.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let _ = timeout;
        Err(unsupported("read deadline"))
    }

    /// Sets (or clears) the deadline applied to each write.
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let _ = timeout;
        Err(unsupported("write deadline"))
    }

    /// Returns the current read deadline.
    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        Err(unsupported("read deadline"))
    }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("transport has no {what}"),
    )
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).peek(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_write_timeout(timeout)
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        (**self).read_timeout()
    }
}

impl Transport for TcpStream {
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Self::peek(self, buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_write_timeout(self, timeout)
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        Self::read_timeout(self)
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    #[allow(unsafe_code)]
    fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::io::AsRawFd;

        loop {
            // SAFETY: recv with MSG_PEEK writes at most buf.len() bytes into buf
            let ret = unsafe {
                libc::recv(
                    self.as_raw_fd(),
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    libc::MSG_PEEK,
                )
            };

            if let Ok(n) = usize::try_from(ret) {
                return Ok(n);
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_write_timeout(self, timeout)
    }

    fn read_timeout(&self) -> io::Result<Option<Duration>> {
        Self::read_timeout(self)
    }
}
