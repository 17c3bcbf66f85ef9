//! The socket a connection is bound to.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::protocol::Timeout;

/// A bidirectional byte channel with socket-level controls.
///
/// Reads and writes are blocking; the read timeout bounds how long a read
/// may wait.
pub trait Endpoint: Read + Write {
    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn peer_addr(&self) -> io::Result<SocketAddr>;

    fn so_timeout(&self) -> io::Result<Timeout>;

    fn set_so_timeout(&self, timeout: Timeout) -> io::Result<()>;

    fn shutdown_input(&self) -> io::Result<()>;

    fn shutdown_output(&self) -> io::Result<()>;

    /// Releases the channel. Called at most once per bound endpoint.
    fn close(&mut self) -> io::Result<()>;
}

impl Endpoint for TcpStream {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn so_timeout(&self) -> io::Result<Timeout> {
        self.read_timeout().map(Timeout::from)
    }

    fn set_so_timeout(&self, timeout: Timeout) -> io::Result<()> {
        self.set_read_timeout(timeout.as_duration())
    }

    fn shutdown_input(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Read)
    }

    fn shutdown_output(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Write)
    }

    /// The descriptor itself goes away when the stream is dropped; shutting
    /// down both directions makes sure the peer sees the close even if the
    /// stream was cloned.
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}
