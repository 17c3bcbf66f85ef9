//! HTTP body handling module for processing message payloads
//!
//! This module provides functionality for encoding and decoding HTTP message bodies
//! using the three HTTP/1.1 framing strategies.
//!
//! # Components
//!
//! ## Decoders
//! - [`ChunkedDecoder`]: Handles chunked transfer encoded payloads, including trailers
//! - [`LengthDecoder`]: Processes fixed-length payloads
//! - [`IdentityDecoder`]: Passes bytes through until end of stream
//! - [`PayloadDecoder`]: Main decoder that coordinates different decoding strategies
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: Implements chunked transfer encoding
//! - [`LengthEncoder`]: Handles fixed-length payload encoding
//! - [`PayloadEncoder`]: Main encoder that manages different encoding strategies
//!
//! All of them work on a `BytesMut` and never touch the socket; the session
//! buffers in [`crate::io`] feed and drain them.

mod chunked_decoder;
mod chunked_encoder;
mod identity_decoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use identity_decoder::IdentityDecoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;
pub use payload_decoder::{PayloadDecoder, StreamKind};
pub use payload_encoder::{Fragment, PayloadEncoder};
