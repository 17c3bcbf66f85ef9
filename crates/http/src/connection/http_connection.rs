use std::fmt;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::body::{PayloadDecoder, PayloadEncoder};
use crate::config::Http1Config;
use crate::connection::timeout_guard::TimeoutGuard;
use crate::io::{ContentInputStream, Endpoint, OutgoingContent, Peek, SessionInputBuffer, SessionOutputBuffer};
use crate::protocol::{
    ConnectionError, ContentLengthStrategy, DefaultContentLengthStrategy, HttpError, HttpMessage, IncomingEntity, PayloadSize,
    Timeout,
};

/// How long the stale check waits for the peer.
const STALE_CHECK_TIMEOUT: Timeout = Timeout::of_millis(1);

const UNBOUND: u8 = 0;
const OPEN: u8 = 1;
const CLOSED: u8 = 2;

/// How [`HttpConnection::close_with`] releases the endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CloseMode {
    /// Flush pending output, then close the endpoint
    #[default]
    Immediate,
    /// Close the endpoint right away, discarding pending output
    Graceful,
}

/// A blocking HTTP/1.1 connection over a bound [`Endpoint`].
///
/// The connection moves from unbound to open on [`bind`](Self::bind) and from
/// open to closed on the first [`close`](Self::close); closed is final. Only
/// the call that wins the open to closed transition touches the endpoint, so
/// repeated closes are no-ops.
///
/// Both session buffers live as long as the connection. Body streams borrow
/// the input buffer and the endpoint, so bytes that follow one body stay
/// available for the next message.
///
/// # Type Parameters
///
/// * `E`: the endpoint type, usually a [`TcpStream`]
/// * `S`: the strategy that maps message heads to a framing decision
pub struct HttpConnection<E, S = DefaultContentLengthStrategy> {
    config: Http1Config,
    state: AtomicU8,
    endpoint: Option<E>,
    local_addr: Option<SocketAddr>,
    remote_addr: Option<SocketAddr>,
    in_buffer: SessionInputBuffer,
    out_buffer: SessionOutputBuffer,
    strategy: S,
}

impl<E: Endpoint> HttpConnection<E> {
    pub fn new(config: Http1Config) -> Self {
        Self::with_strategy(config, DefaultContentLengthStrategy)
    }
}

impl HttpConnection<TcpStream> {
    /// Opens a TCP connection and binds to it.
    pub fn connect<A: ToSocketAddrs>(addr: A, config: Http1Config) -> Result<Self, ConnectionError> {
        let stream = TcpStream::connect(addr)?;
        let mut connection = Self::new(config);
        connection.bind(stream)?;
        Ok(connection)
    }
}

impl<E: Endpoint, S: ContentLengthStrategy> HttpConnection<E, S> {
    pub fn with_strategy(config: Http1Config, strategy: S) -> Self {
        Self {
            config,
            state: AtomicU8::new(UNBOUND),
            endpoint: None,
            local_addr: None,
            remote_addr: None,
            in_buffer: SessionInputBuffer::new(config.buffer_size()),
            out_buffer: SessionOutputBuffer::new(config.buffer_size(), config.chunk_size_hint()),
            strategy,
        }
    }

    pub fn config(&self) -> &Http1Config {
        &self.config
    }

    /// Binds the connection to `endpoint` and caches its addresses.
    ///
    /// Only an unbound connection can be bound; a connection serves exactly
    /// one endpoint over its lifetime.
    pub fn bind(&mut self, endpoint: E) -> Result<(), ConnectionError> {
        match self.state.load(Ordering::Acquire) {
            UNBOUND => {}
            OPEN => return Err(ConnectionError::AlreadyBound),
            _ => return Err(ConnectionError::Closed),
        }

        self.local_addr = endpoint.local_addr().ok();
        self.remote_addr = endpoint.peer_addr().ok();
        self.endpoint = Some(endpoint);
        self.state.store(OPEN, Ordering::Release);
        debug!(local = ?self.local_addr, remote = ?self.remote_addr, "connection bound");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }

    /// Fails unless the connection is bound and not yet closed.
    pub fn ensure_open(&self) -> Result<(), ConnectionError> {
        match self.state.load(Ordering::Acquire) {
            OPEN => Ok(()),
            UNBOUND => Err(ConnectionError::NotBound),
            _ => Err(ConnectionError::Closed),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// The endpoint's read timeout; [`Timeout::DISABLED`] when unbound or
    /// when the endpoint can't report it.
    pub fn socket_timeout(&self) -> Timeout {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Timeout::DISABLED;
        };

        endpoint.so_timeout().unwrap_or_else(|e| {
            debug!(cause = %e, "can't query socket timeout");
            Timeout::DISABLED
        })
    }

    /// Best effort: failures are logged and dropped.
    pub fn set_socket_timeout(&self, timeout: Timeout) {
        if let Some(endpoint) = self.endpoint.as_ref()
            && let Err(e) = endpoint.set_so_timeout(timeout)
        {
            debug!(cause = %e, %timeout, "can't set socket timeout");
        }
    }

    /// Waits up to `timeout` for input.
    ///
    /// Buffered bytes answer immediately without touching the endpoint.
    /// Otherwise a single read is made with the endpoint's timeout set to
    /// `timeout`; the previous timeout is restored afterwards. End of stream
    /// and an expired timeout both mean no input. When the endpoint's timeout
    /// can't be queried or set, no read is made and the failure is returned.
    pub fn await_input(&mut self, timeout: Timeout) -> Result<bool, ConnectionError> {
        self.ensure_open()?;
        if self.in_buffer.has_buffered_data() {
            return Ok(true);
        }

        let endpoint = self.endpoint.as_mut().ok_or(ConnectionError::Closed)?;
        let mut endpoint = TimeoutGuard::install(endpoint, timeout)?;
        let peek = self.in_buffer.peek(&mut *endpoint)?;
        trace!(?peek, %timeout, "awaited input");
        Ok(matches!(peek, Peek::Data(_)))
    }

    /// Checks whether the connection can still be used.
    ///
    /// A closed connection is stale. Buffered bytes mean it is alive.
    /// Otherwise the endpoint is checked with a brief read: data or a timeout mean the
    /// peer is alive, end of stream or any other I/O error mean it is gone.
    /// An endpoint whose timeout can't be queried or set is not read and
    /// counts as stale.
    pub fn is_stale(&mut self) -> bool {
        if !self.is_open() {
            return true;
        }
        if self.in_buffer.has_buffered_data() {
            return false;
        }
        let Some(endpoint) = self.endpoint.as_mut() else {
            return true;
        };

        let mut endpoint = match TimeoutGuard::install(endpoint, STALE_CHECK_TIMEOUT) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                debug!(cause = %e, "can't bound the stale check, assume stale");
                return true;
            }
        };
        let stale = match self.in_buffer.peek(&mut *endpoint) {
            Ok(Peek::Data(_) | Peek::WouldBlock) => false,
            Ok(Peek::EndOfStream) => true,
            Err(e) => {
                debug!(cause = %e, "stale check failed");
                true
            }
        };
        debug!(stale, "stale check");
        stale
    }

    /// Writes pending output to the endpoint and flushes it.
    pub fn flush(&mut self) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        let endpoint = self.endpoint.as_mut().ok_or(ConnectionError::Closed)?;
        self.out_buffer.flush(endpoint)?;
        Ok(())
    }

    /// Flushes pending output and closes the endpoint.
    ///
    /// See [`close_with`](Self::close_with).
    pub fn close(&mut self) -> io::Result<()> {
        self.close_with(CloseMode::Immediate)
    }

    /// Closes the connection once; later calls do nothing.
    ///
    /// The connection counts as closed even when flushing or closing the
    /// endpoint fails. In [`CloseMode::Immediate`] such a failure is
    /// returned; in [`CloseMode::Graceful`] it is logged. Neither mode
    /// half-closes the endpoint.
    pub fn close_with(&mut self, mode: CloseMode) -> io::Result<()> {
        if self.state.compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Ok(());
        }

        let Some(mut endpoint) = self.endpoint.take() else {
            return Ok(());
        };
        self.in_buffer.clear();
        debug!(?mode, "closing connection");

        match mode {
            CloseMode::Immediate => {
                let flushed = self.out_buffer.flush(&mut endpoint);
                self.out_buffer.clear();
                let closed = endpoint.close();
                flushed.and(closed)
            }
            CloseMode::Graceful => {
                self.out_buffer.clear();
                if let Err(e) = endpoint.close() {
                    debug!(cause = %e, "error closing endpoint");
                }
                Ok(())
            }
        }
    }

    /// Reads the next message head, up to and including its empty line.
    ///
    /// The head may be at most one buffer long. Returns `None` when the peer
    /// closed the connection before sending anything.
    pub fn receive_head(&mut self) -> Result<Option<Bytes>, HttpError> {
        self.ensure_open()?;
        let endpoint = self.endpoint.as_mut().ok_or(ConnectionError::Closed)?;
        let head = self.in_buffer.read_head(endpoint, self.config.buffer_size())?;
        trace!(len = head.as_ref().map(Bytes::len), "received message head");
        Ok(head)
    }

    /// Builds the entity for `message` from the connection's own buffer and
    /// endpoint, with the framing decided by the connection's strategy.
    pub fn receive_entity(&mut self, message: &dyn HttpMessage) -> Result<IncomingEntity<'_, E>, HttpError> {
        let payload_size = self.strategy.determine_length(message)?;
        Ok(self.incoming_entity(message, payload_size)?)
    }

    /// Builds the entity for `message` with an already made framing decision.
    pub fn incoming_entity(
        &mut self,
        message: &dyn HttpMessage,
        payload_size: PayloadSize,
    ) -> Result<IncomingEntity<'_, E>, ConnectionError> {
        self.ensure_open()?;
        let endpoint = self.endpoint.as_mut().ok_or(ConnectionError::Closed)?;
        Ok(create_incoming_entity(message, &mut self.in_buffer, endpoint, payload_size, &self.config))
    }

    /// Opens a body stream with the given framing over the output buffer.
    pub fn send_content(&mut self, payload_size: PayloadSize) -> Result<OutgoingContent<'_, E>, ConnectionError> {
        self.ensure_open()?;
        let endpoint = self.endpoint.as_mut().ok_or(ConnectionError::Closed)?;
        Ok(OutgoingContent::new(PayloadEncoder::from(payload_size), &mut self.out_buffer, endpoint, self.config.chunk_size_hint()))
    }

    /// Opens a body stream for `message`, framed by the connection's strategy.
    pub fn send_entity(&mut self, message: &dyn HttpMessage) -> Result<OutgoingContent<'_, E>, HttpError> {
        let payload_size = self.strategy.determine_length(message)?;
        Ok(self.send_content(payload_size)?)
    }
}

/// Wraps `in_buffer` and `source` in the stream matching `payload_size` and
/// pairs it with the content type and encoding of `message`.
pub fn create_incoming_entity<'a, R: Read + ?Sized>(
    message: &dyn HttpMessage,
    in_buffer: &'a mut SessionInputBuffer,
    source: &'a mut R,
    payload_size: PayloadSize,
    config: &Http1Config,
) -> IncomingEntity<'a, R> {
    let decoder = PayloadDecoder::from_payload_size(payload_size, config);
    trace!(?payload_size, "create incoming entity");
    IncomingEntity::new(
        payload_size,
        message.content_type().map(ToOwned::to_owned),
        message.content_encoding().map(ToOwned::to_owned),
        ContentInputStream::new(decoder, in_buffer, source),
    )
}

impl<E, S> fmt::Display for HttpConnection<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.state.load(Ordering::Acquire) == UNBOUND {
            return f.write_str("[Not bound]");
        }

        match self.local_addr {
            Some(local) => write!(f, "{local}")?,
            None => f.write_str("unknown")?,
        }
        f.write_str("<->")?;
        match self.remote_addr {
            Some(remote) => write!(f, "{remote}"),
            None => f.write_str("unknown"),
        }
    }
}

impl<E, S> fmt::Debug for HttpConnection<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("state", &self.state.load(Ordering::Acquire))
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.remote_addr)
            .field("buffered_input", &self.in_buffer.len())
            .field("buffered_output", &self.out_buffer.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::body::StreamKind;
    use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
    use http::{Response, StatusCode};
    use mockall::mock;
    use mockall::predicate::eq;
    use std::io::{Cursor, ErrorKind, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpListener};
    use std::sync::{Arc, Mutex};
    use std::thread;

    mock! {
        pub Socket {}

        impl Read for Socket {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
        }

        impl Write for Socket {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
            fn flush(&mut self) -> io::Result<()>;
        }

        impl Endpoint for Socket {
            fn local_addr(&self) -> io::Result<SocketAddr>;
            fn peer_addr(&self) -> io::Result<SocketAddr>;
            fn so_timeout(&self) -> io::Result<Timeout>;
            fn set_so_timeout(&self, timeout: Timeout) -> io::Result<()>;
            fn shutdown_input(&self) -> io::Result<()>;
            fn shutdown_output(&self) -> io::Result<()>;
            fn close(&mut self) -> io::Result<()>;
        }
    }

    fn local() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8888)
    }

    fn remote() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 80)
    }

    fn socket() -> MockSocket {
        let mut socket = MockSocket::new();
        socket.expect_local_addr().returning(|| Ok(local()));
        socket.expect_peer_addr().returning(|| Ok(remote()));
        socket
    }

    /// A socket whose timeout can be queried and changed freely.
    fn socket_with_timeouts() -> MockSocket {
        let mut socket = socket();
        socket.expect_so_timeout().returning(|| Ok(Timeout::DISABLED));
        socket.expect_set_so_timeout().returning(|_| Ok(()));
        socket
    }

    fn connection() -> HttpConnection<MockSocket> {
        HttpConnection::new(Http1Config::default())
    }

    fn bound(socket: MockSocket) -> HttpConnection<MockSocket> {
        let mut conn = connection();
        conn.bind(socket).unwrap();
        conn.ensure_open().unwrap();
        conn
    }

    fn fill_with(bytes: &'static [u8]) -> impl FnMut(&mut [u8]) -> io::Result<usize> {
        move |buf: &mut [u8]| {
            buf[..bytes.len()].copy_from_slice(bytes);
            Ok(bytes.len())
        }
    }

    #[test]
    fn test_basics() {
        let conn = connection();
        assert!(!conn.is_open());
        assert_eq!(conn.local_addr(), None);
        assert_eq!(conn.remote_addr(), None);
        assert_eq!(conn.to_string(), "[Not bound]");
        assert!(matches!(conn.ensure_open(), Err(ConnectionError::NotBound)));
    }

    #[test]
    fn test_socket_bind() {
        let conn = bound(socket());

        assert_eq!(conn.to_string(), "127.0.0.1:8888<->10.0.0.2:80");
        assert!(conn.is_open());
        assert_eq!(conn.local_addr(), Some(local()));
        assert_eq!(conn.remote_addr(), Some(remote()));
    }

    #[test]
    fn test_bind_twice_is_rejected() {
        let mut conn = bound(socket());
        assert!(matches!(conn.bind(socket()), Err(ConnectionError::AlreadyBound)));
        assert!(conn.is_open());
    }

    #[test]
    fn test_connection_close() {
        let mut socket = socket();
        socket.expect_write().times(1).returning(|buf| Ok(buf.len()));
        socket.expect_flush().times(1).returning(|| Ok(()));
        socket.expect_close().times(1).returning(|| Ok(()));
        socket.expect_shutdown_input().never();
        socket.expect_shutdown_output().never();

        let mut conn = bound(socket);
        conn.out_buffer.write(&[0], conn.endpoint.as_mut().unwrap()).unwrap();
        assert!(conn.is_open());

        conn.close().unwrap();
        assert!(!conn.is_open());
        assert!(matches!(conn.ensure_open(), Err(ConnectionError::Closed)));

        conn.close().unwrap();
        conn.close_with(CloseMode::Graceful).unwrap();
        assert!(!conn.is_open());
        assert_eq!(conn.to_string(), "127.0.0.1:8888<->10.0.0.2:80");
    }

    #[test]
    fn test_connection_shutdown() {
        let mut socket = socket();
        socket.expect_write().never();
        socket.expect_flush().never();
        socket.expect_shutdown_input().never();
        socket.expect_shutdown_output().never();
        socket.expect_close().times(1).returning(|| Ok(()));

        let mut conn = bound(socket);
        let mut other_stream = Vec::new();
        conn.out_buffer.write(&[0], &mut other_stream).unwrap();
        assert!(conn.is_open());

        conn.close_with(CloseMode::Graceful).unwrap();
        assert!(!conn.is_open());
        assert!(other_stream.is_empty());
        assert!(conn.out_buffer.is_empty());

        conn.close().unwrap();
        conn.close_with(CloseMode::Graceful).unwrap();
    }

    #[test]
    fn test_close_failure_still_closes() {
        let mut socket = socket();
        socket.expect_flush().times(1).returning(|| Ok(()));
        socket.expect_close().times(1).returning(|| Err(io::Error::from(ErrorKind::ConnectionReset)));

        let mut conn = bound(socket);
        assert_eq!(conn.close().unwrap_err().kind(), ErrorKind::ConnectionReset);
        assert!(!conn.is_open());
        conn.close().unwrap();
    }

    #[test]
    fn test_bind_after_close_is_rejected() {
        let mut socket = socket();
        socket.expect_close().times(1).returning(|| Ok(()));
        let mut conn = bound(socket);
        conn.close_with(CloseMode::Graceful).unwrap();

        assert!(matches!(conn.bind(self::socket()), Err(ConnectionError::Closed)));
        assert!(!conn.is_open());
    }

    #[test]
    fn test_create_entity_length_delimited() {
        let conn = connection();
        let mut in_buffer = SessionInputBuffer::new(conn.config().buffer_size());
        let mut source = Cursor::new(Vec::new());
        let message = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_LENGTH, "10")
            .header(CONTENT_TYPE, "stuff")
            .header(CONTENT_ENCODING, "chunked")
            .body(())
            .unwrap();

        let payload_size = DefaultContentLengthStrategy.determine_length(&message).unwrap();
        assert_eq!(payload_size, PayloadSize::Length(10));

        let entity = create_incoming_entity(&message, &mut in_buffer, &mut source, payload_size, conn.config());
        assert!(!entity.is_chunked());
        assert_eq!(entity.content_length(), 10);
        assert_eq!(entity.content_type(), Some("stuff"));
        assert_eq!(entity.content_encoding(), Some("chunked"));
        assert_eq!(entity.kind(), StreamKind::LengthDelimited);
    }

    #[test]
    fn test_create_entity_input_chunked() {
        let conn = connection();
        let mut in_buffer = SessionInputBuffer::new(conn.config().buffer_size());
        let mut source = Cursor::new(Vec::new());
        let message = Response::builder().status(StatusCode::OK).body(()).unwrap();

        let entity = create_incoming_entity(&message, &mut in_buffer, &mut source, PayloadSize::Chunked, conn.config());
        assert!(entity.is_chunked());
        assert_eq!(entity.content_length(), -1);
        assert_eq!(entity.content_type(), None);
        assert_eq!(entity.kind(), StreamKind::Chunked);
    }

    #[test]
    fn test_create_entity_input_undefined() {
        let conn = connection();
        let mut in_buffer = SessionInputBuffer::new(conn.config().buffer_size());
        let mut source = Cursor::new(Vec::new());
        let message = Response::builder().status(StatusCode::OK).body(()).unwrap();

        let entity = create_incoming_entity(&message, &mut in_buffer, &mut source, PayloadSize::Undefined, conn.config());
        assert!(!entity.is_chunked());
        assert_eq!(entity.content_length(), -1);
        assert_eq!(entity.kind(), StreamKind::Identity);
    }

    #[test]
    fn test_receive_entity_needs_open_connection() {
        let mut conn = connection();
        let message = Response::builder().status(StatusCode::OK).body(()).unwrap();
        assert!(matches!(
            conn.receive_entity(&message),
            Err(HttpError::Connection { source: ConnectionError::NotBound })
        ));
    }

    #[test]
    fn test_receive_entity_reads_from_socket() {
        let mut socket = socket();
        socket.expect_read().times(1).returning(fill_with(b"4\r\nWiki\r\n0\r\n\r\nHTTP/1.1"));

        let mut conn = bound(socket);
        let message = Response::builder().header(TRANSFER_ENCODING, "chunked").header(CONTENT_TYPE, "text/plain").body(()).unwrap();

        let mut body = String::new();
        {
            let mut entity = conn.receive_entity(&message).unwrap();
            assert!(entity.is_chunked());
            assert_eq!(entity.content_mime(), Some(mime::TEXT_PLAIN));
            entity.read_to_string(&mut body).unwrap();
        }
        assert_eq!(body, "Wiki");
        assert_eq!(conn.in_buffer.len(), 8);
        assert!(!conn.is_stale());
    }

    #[test]
    fn test_receive_head_then_body() {
        let mut socket = socket();
        socket.expect_read().times(1).returning(fill_with(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc"));

        let mut conn = bound(socket);
        let head = conn.receive_head().unwrap().unwrap();
        assert!(head.ends_with(b"\r\n\r\n"));

        let message = Response::builder().header(CONTENT_LENGTH, "3").body(()).unwrap();
        let mut body = Vec::new();
        conn.receive_entity(&message).unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_set_socket_timeout() {
        let mut socket = socket();
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(123))).times(1).returning(|_| Ok(()));

        let conn = bound(socket);
        conn.set_socket_timeout(Timeout::of_millis(123));
    }

    #[test]
    fn test_set_socket_timeout_exception() {
        let mut socket = socket();
        socket
            .expect_set_so_timeout()
            .with(eq(Timeout::of_millis(123)))
            .times(1)
            .returning(|_| Err(io::Error::other("socket exception")));

        let conn = bound(socket);
        conn.set_socket_timeout(Timeout::of_millis(123));
    }

    #[test]
    fn test_get_socket_timeout() {
        assert_eq!(connection().socket_timeout(), Timeout::DISABLED);

        let mut socket = socket();
        socket.expect_so_timeout().returning(|| Ok(Timeout::of_millis(345)));
        let conn = bound(socket);

        assert_eq!(conn.socket_timeout(), Timeout::of_millis(345));
    }

    #[test]
    fn test_get_socket_timeout_exception() {
        assert_eq!(connection().socket_timeout(), Timeout::DISABLED);

        let mut socket = socket();
        socket.expect_so_timeout().returning(|| Err(io::Error::other("socket exception")));
        let conn = bound(socket);

        assert_eq!(conn.socket_timeout(), Timeout::DISABLED);
    }

    #[test]
    fn test_await_input_in_buffer() {
        let mut socket = socket();
        socket.expect_so_timeout().never();
        socket.expect_set_so_timeout().never();
        socket.expect_read().never();

        let mut conn = bound(socket);
        conn.in_buffer.fill(&mut Cursor::new(vec![1u8, 2, 3, 4, 5])).unwrap();

        assert!(conn.await_input(Timeout::of_millis(432)).unwrap());
    }

    #[test]
    fn test_await_input_in_socket() {
        let mut socket = socket();
        socket.expect_so_timeout().times(1).returning(|| Ok(Timeout::of_millis(345)));
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(432))).times(1).returning(|_| Ok(()));
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(345))).times(1).returning(|_| Ok(()));
        socket.expect_read().times(1).returning(fill_with(&[1, 2, 3, 4, 5]));

        let mut conn = bound(socket);
        assert!(conn.await_input(Timeout::of_millis(432)).unwrap());
        assert_eq!(conn.in_buffer.len(), 5);
    }

    #[test]
    fn test_await_input_restores_timeout_on_error() {
        let mut socket = socket();
        socket.expect_so_timeout().times(1).returning(|| Ok(Timeout::of_millis(345)));
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(432))).times(1).returning(|_| Ok(()));
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(345))).times(1).returning(|_| Ok(()));
        socket.expect_read().times(1).returning(|_| Err(io::Error::from(ErrorKind::ConnectionReset)));

        let mut conn = bound(socket);
        assert!(matches!(conn.await_input(Timeout::of_millis(432)), Err(ConnectionError::Io { .. })));
    }

    #[test]
    fn test_await_input_no_data() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().returning(|_| Ok(0));

        let mut conn = bound(socket);
        assert!(!conn.await_input(Timeout::of_millis(432)).unwrap());
    }

    #[test]
    fn test_await_input_timeout() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().returning(|_| Err(io::Error::from(ErrorKind::WouldBlock)));

        let mut conn = bound(socket);
        assert!(!conn.await_input(Timeout::of_millis(432)).unwrap());
    }

    #[test]
    fn test_stale_when_closed() {
        let mut socket = socket();
        socket.expect_flush().returning(|| Ok(()));
        socket.expect_close().times(1).returning(|| Ok(()));

        let mut conn = bound(socket);
        conn.close().unwrap();
        assert!(conn.is_stale());
    }

    #[test]
    fn test_stale_when_unbound() {
        assert!(connection().is_stale());
    }

    #[test]
    fn test_not_stale_when_has_data() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().times(1).returning(fill_with(&[1, 2, 3, 4, 5]));

        let mut conn = bound(socket);
        assert!(!conn.is_stale());
        // the bytes read by the check stay buffered and answer the next check
        assert!(!conn.is_stale());
    }

    #[test]
    fn test_stale_when_end_of_stream() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().returning(|_| Ok(0));

        let mut conn = bound(socket);
        assert!(conn.is_stale());
    }

    #[test]
    fn test_not_stale_when_timeout() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().returning(|_| Err(io::Error::from(ErrorKind::TimedOut)));

        let mut conn = bound(socket);
        assert!(!conn.is_stale());
    }

    #[test]
    fn test_stale_when_io_error() {
        let mut socket = socket_with_timeouts();
        socket.expect_read().returning(|_| Err(io::Error::from(ErrorKind::ConnectionReset)));

        let mut conn = bound(socket);
        assert!(conn.is_stale());
    }

    #[test]
    fn test_display_with_unknown_address() {
        let mut socket = MockSocket::new();
        socket.expect_local_addr().returning(|| Err(io::Error::from(ErrorKind::NotConnected)));
        socket.expect_peer_addr().returning(|| Ok(remote()));

        let conn = bound(socket);
        assert!(conn.is_open());
        assert_eq!(conn.local_addr(), None);
        assert_eq!(conn.to_string(), "unknown<->10.0.0.2:80");
    }

    #[test]
    fn test_stale_when_timeout_cannot_be_set() {
        let mut socket = socket();
        socket.expect_so_timeout().returning(|| Ok(Timeout::DISABLED));
        socket.expect_set_so_timeout().times(1).returning(|_| Err(io::Error::other("socket exception")));
        socket.expect_read().never();

        let mut conn = bound(socket);
        assert!(conn.is_stale());
    }

    #[test]
    fn test_stale_when_timeout_cannot_be_queried() {
        let mut socket = socket();
        socket.expect_so_timeout().times(1).returning(|| Err(io::Error::other("socket exception")));
        socket.expect_set_so_timeout().never();
        socket.expect_read().never();

        let mut conn = bound(socket);
        assert!(conn.is_stale());
    }

    #[test]
    fn test_await_input_fails_when_timeout_cannot_be_set() {
        let mut socket = socket();
        socket.expect_so_timeout().returning(|| Ok(Timeout::DISABLED));
        socket.expect_set_so_timeout().times(1).returning(|_| Err(io::Error::other("socket exception")));
        socket.expect_read().never();

        let mut conn = bound(socket);
        assert!(matches!(conn.await_input(Timeout::of_millis(432)), Err(ConnectionError::Io { .. })));
    }

    #[test]
    fn test_await_input_keeps_timeout_when_it_cannot_be_queried() {
        let mut socket = socket();
        socket.expect_so_timeout().times(1).returning(|| Err(io::Error::other("socket exception")));
        socket.expect_set_so_timeout().never();
        socket.expect_read().never();

        let mut conn = bound(socket);
        assert!(matches!(conn.await_input(Timeout::of_millis(432)), Err(ConnectionError::Io { .. })));
    }

    #[test]
    fn test_stale_check_restores_timeout() {
        let mut socket = socket();
        socket.expect_so_timeout().times(1).returning(|| Ok(Timeout::of_millis(5000)));
        socket.expect_set_so_timeout().with(eq(STALE_CHECK_TIMEOUT)).times(1).returning(|_| Ok(()));
        socket.expect_set_so_timeout().with(eq(Timeout::of_millis(5000))).times(1).returning(|_| Ok(()));
        socket.expect_read().times(1).returning(|_| Err(io::Error::from(ErrorKind::WouldBlock)));

        let mut conn = bound(socket);
        assert!(!conn.is_stale());
    }

    #[test]
    fn test_send_content_chunked() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&written);

        let mut socket = socket();
        socket.expect_write().returning(move |buf| {
            sink.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        });
        socket.expect_flush().returning(|| Ok(()));

        let mut conn = bound(socket);
        let message = Response::builder().header(TRANSFER_ENCODING, "chunked").body(()).unwrap();
        let mut content = conn.send_entity(&message).unwrap();
        content.write_all(b"hello").unwrap();
        content.finish().unwrap();

        assert_eq!(&written.lock().unwrap()[..], b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn test_flush_requires_open_connection() {
        let mut conn = connection();
        assert!(matches!(conn.flush(), Err(ConnectionError::NotBound)));
    }

    #[test]
    fn test_round_trip_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 18];
            stream.read_exact(&mut request).unwrap();
            stream.write_all(b"7\r\nMozilla\r\n9\r\nDeveloper\r\n0\r\n\r\n").unwrap();
            request
        });

        let mut conn = HttpConnection::connect(addr, Http1Config::default()).unwrap();
        assert_eq!(conn.remote_addr(), Some(addr));

        let mut content = conn.send_content(PayloadSize::Length(18)).unwrap();
        content.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        content.finish().unwrap();

        let message = Response::builder().header(TRANSFER_ENCODING, "chunked").body(()).unwrap();
        let mut body = String::new();
        conn.receive_entity(&message).unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "MozillaDeveloper");

        assert_eq!(&server.join().unwrap(), b"GET / HTTP/1.1\r\n\r\n");
        assert!(!conn.await_input(Timeout::of_millis(1000)).unwrap());
        assert!(conn.is_stale());
        conn.close().unwrap();
    }
}
