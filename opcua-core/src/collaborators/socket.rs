//! Socket facade (spec §4.7). The core never owns a `TcpStream`; it
//! reads/writes through this trait so the embedder can plug in
//! blocking sockets, `mio`, or a test double. Grounded on the shape of
//! the teacher's `Channel`, which wraps a `TcpStream` directly — here
//! that ownership is inverted into a trait the connection borrows.

use std::io;

pub trait Socket {
    /// Non-blocking read into `buf`; `Ok(0)` means no data is currently
    /// available (treated the same as `WouldBlock`, not as EOF — the
    /// spec's transport layer never ascribes meaning to a zero read).
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Non-blocking write of `buf`; returns the number of bytes
    /// actually written, which may be less than `buf.len()`.
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn shutdown(&mut self) -> io::Result<()>;
}
