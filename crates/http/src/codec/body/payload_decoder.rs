//! Decoder implementation for HTTP message payloads.
//!
//! This module provides a unified decoder for the three ways a body can be delimited:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Identity payloads that end with the connection
//!
//! The framing decision made from the message head selects the variant.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::identity_decoder::IdentityDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::config::Http1Config;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};
use bytes::BytesMut;
use http::HeaderMap;
use tokio_util::codec::Decoder;

/// Which framing rule a body stream follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamKind {
    LengthDelimited,
    Chunked,
    Identity,
}

/// A unified decoder for handling HTTP message payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Decode payload until the source is exhausted
    Identity(IdentityDecoder),
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    ///
    /// # Arguments
    /// * `size` - The expected content length in bytes
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a PayloadDecoder for a body delimited by end of stream.
    pub fn identity() -> Self {
        Self { kind: Kind::Identity(IdentityDecoder::new()) }
    }

    /// Picks the decoder for a framing decision, applying the line and
    /// trailer limits of `config` to chunked bodies.
    pub fn from_payload_size(payload_size: PayloadSize, config: &Http1Config) -> Self {
        match payload_size {
            PayloadSize::Length(size) => Self::fix_length(size),
            PayloadSize::Chunked => Self {
                kind: Kind::Chunked(ChunkedDecoder::with_limits(config.max_line_length(), config.max_header_count())),
            },
            PayloadSize::Undefined => Self::identity(),
        }
    }

    pub fn stream_kind(&self) -> StreamKind {
        match &self.kind {
            Kind::Length(_) => StreamKind::LengthDelimited,
            Kind::Chunked(_) => StreamKind::Chunked,
            Kind::Identity(_) => StreamKind::Identity,
        }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder handles fixed-length payloads.
    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    /// Returns whether this decoder reads until end of stream.
    pub fn is_identity(&self) -> bool {
        matches!(self.kind, Kind::Identity(_))
    }

    /// Trailer fields of a finished chunked body.
    pub fn trailers(&self) -> Option<&HeaderMap> {
        match &self.kind {
            Kind::Chunked(decoder) => decoder.trailers(),
            Kind::Length(_) | Kind::Identity(_) => None,
        }
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        Self::from_payload_size(payload_size, &Http1Config::default())
    }
}

/// Delegates to the appropriate decoder based on the payload type.
impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::Identity(identity_decoder) => identity_decoder.decode(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode_eof(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode_eof(src),
            Kind::Identity(identity_decoder) => identity_decoder.decode_eof(src),
        }
    }
}
