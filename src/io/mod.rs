//! Blocking token channel over a duplex byte stream.
//!
//! - [`channel`]: `write_all` / `read_all` that retry interrupted calls and
//!   report short transfers instead of hiding them
//! - [`transport`]: The [`Transport`] trait (read, write, peek, timeout hook)
//!   with implementations for `TcpStream` and `UnixStream`

pub mod channel;
pub mod transport;

pub use channel::{read_all, write_all};
pub use transport::Transport;
