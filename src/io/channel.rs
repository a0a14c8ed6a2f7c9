//! Interrupt-tolerant whole-buffer reads and writes.
//!
//! Unlike [`std::io::Write::write_all`], these helpers report how many bytes
//! actually moved instead of collapsing a short transfer into an error. The
//! framing layer decides whether a short count is fatal.

use std::io::{self, Read, Write};

/// Writes as much of `buf` as the writer accepts.
///
/// Retries on [`io::ErrorKind::Interrupted`]. Returns the number of bytes
/// written, which is less than `buf.len()` only when the writer reports
/// `Ok(0)` (it can accept no more). Any other error is returned as-is.
pub fn write_all<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(written)
}

/// Reads until `buf` is full or the reader reaches end-of-stream.
///
/// Retries on [`io::ErrorKind::Interrupted`]. Returns the number of bytes
/// read, which is less than `buf.len()` only at end-of-stream.
pub fn read_all<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
