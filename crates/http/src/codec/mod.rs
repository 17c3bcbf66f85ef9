//! HTTP body codec module
//!
//! This module holds the framing state machines for message bodies. They are
//! pure `tokio_util::codec` decoders and encoders over `BytesMut`: the session
//! buffers own the socket I/O and hand their bytes to these codecs.
//!
//! # Example
//!
//! ```
//! use micro_http_conn::codec::body::PayloadDecoder;
//! use micro_http_conn::protocol::PayloadSize;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = PayloadDecoder::from(PayloadSize::Chunked);
//! let mut buffer = BytesMut::from(&b"5\r\nhello\r\n0\r\n\r\n"[..]);
//! let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(&chunk.as_bytes().unwrap()[..], b"hello");
//! ```
//!
//! # Features
//!
//! - Support for chunked transfer encoding with trailer fields
//! - Content-Length based payload handling
//! - Identity payloads delimited by end of stream
//! - State machine based processing

pub mod body;
