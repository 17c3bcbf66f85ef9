//! A blocking HTTP/1.1 connection core
//!
//! This crate provides the transport layer beneath an HTTP/1.1 client or server: buffered
//! reading and writing over a stream endpoint, the three ways a message body can be delimited,
//! and a connection that binds once, closes once and can tell whether its peer is still there.
//! Parsing of message heads is left to the caller; the connection only needs a message's headers
//! to decide how its body is framed.
//!
//! # Features
//!
//! - Session input and output buffers shared by consecutive messages
//! - Content-Length delimited, chunked and close-delimited bodies
//! - Chunk trailers in both directions
//! - Temporary read timeouts that restore the previous value
//! - Stale connection detection
//! - Immediate and graceful close, each happening at most once
//!
//! # Example
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use http::header::CONTENT_LENGTH;
//! use micro_http_conn::config::Http1Config;
//! use micro_http_conn::connection::HttpConnection;
//! use micro_http_conn::protocol::{PayloadSize, Timeout};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = HttpConnection::connect("127.0.0.1:8080", Http1Config::default())?;
//!     connection.set_socket_timeout(Timeout::of_millis(5_000));
//!
//!     let mut request = connection.send_content(PayloadSize::Undefined)?;
//!     request.write_all(b"GET / HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n")?;
//!     request.finish()?;
//!
//!     // the caller parses the response head and hands over its headers
//!     let response = http::Response::builder().header(CONTENT_LENGTH, "12").body(())?;
//!     let mut body = String::new();
//!     connection.receive_entity(&response)?.read_to_string(&mut body)?;
//!
//!     if connection.is_stale() {
//!         connection.close()?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`connection`]: the connection state machine and entity creation
//! - [`io`]: endpoints, session buffers and body streams
//! - [`codec`]: body encoders and decoders
//! - [`protocol`]: messages, framing decisions, timeouts and errors
//! - [`config`]: buffer sizes and parsing limits
//!
//! ## Error Handling
//!
//! The crate uses custom error types that implement `std::error::Error`:
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ConnectionError`]: Lifecycle violations and endpoint failures
//! - [`protocol::ParseError`]: Malformed or truncated incoming bodies
//! - [`protocol::SendError`]: Outgoing body failures
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - Blocking I/O; one connection is driven by one thread at a time
//! - No TLS support
//! - Content codings are reported, never decoded

pub mod codec;
pub mod config;
pub mod connection;
pub mod io;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
