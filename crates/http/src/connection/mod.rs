//! HTTP/1.1 connection handling
//!
//! This module ties the session buffers, the body codecs and an [`Endpoint`](crate::io::Endpoint)
//! together into a connection with a bind/close lifecycle.
//!
//! # Components
//!
//! - [`HttpConnection`]: the connection itself, which:
//!   - Binds once to an endpoint and closes at most once
//!   - Reads and changes the endpoint's read timeout
//!   - Waits for input with a temporary timeout
//!   - Detects connections the peer has dropped
//!   - Opens incoming and outgoing body streams
//! - [`create_incoming_entity`]: builds an entity from explicit parts, for callers
//!   that own their buffer and source
//! - [`CloseMode`]: whether closing flushes pending output first

mod http_connection;
mod timeout_guard;

pub use http_connection::CloseMode;
pub use http_connection::HttpConnection;
pub use http_connection::create_incoming_entity;
