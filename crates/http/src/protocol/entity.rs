//! The body of an incoming message together with its metadata.

use std::io::{self, Read};

use bytes::Bytes;
use http::HeaderMap;

use crate::codec::body::StreamKind;
use crate::io::ContentInputStream;
use crate::protocol::{ParseError, PayloadSize};

/// An incoming message body.
///
/// A chunked entity always reports a length of `-1`; a known length implies
/// the entity is not chunked. Content type and encoding are the header
/// values of the message, copied as they were received.
#[derive(Debug)]
pub struct IncomingEntity<'a, R: ?Sized> {
    content_length: i64,
    chunked: bool,
    content_type: Option<String>,
    content_encoding: Option<String>,
    content: ContentInputStream<'a, R>,
}

impl<'a, R: Read + ?Sized> IncomingEntity<'a, R> {
    pub(crate) fn new(
        payload_size: PayloadSize,
        content_type: Option<String>,
        content_encoding: Option<String>,
        content: ContentInputStream<'a, R>,
    ) -> Self {
        Self {
            content_length: payload_size.content_length(),
            chunked: payload_size.is_chunked(),
            content_type,
            content_encoding,
            content,
        }
    }

    /// The declared length, `-1` when unknown.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.content_encoding.as_deref()
    }

    /// The content type as a media type, if it parses as one.
    pub fn content_mime(&self) -> Option<mime::Mime> {
        self.content_type.as_deref()?.parse().ok()
    }

    pub fn kind(&self) -> StreamKind {
        self.content.kind()
    }

    pub fn content(&mut self) -> &mut ContentInputStream<'a, R> {
        &mut self.content
    }

    pub fn into_content(self) -> ContentInputStream<'a, R> {
        self.content
    }

    pub fn next_chunk(&mut self) -> Result<Option<Bytes>, ParseError> {
        self.content.next_chunk()
    }

    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.content.trailers()
    }

    /// Drains whatever is left of the body so the connection can read the
    /// next message.
    pub fn skip_body(&mut self) -> Result<u64, ParseError> {
        self.content.skip_body()
    }
}

impl<R: Read + ?Sized> Read for IncomingEntity<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}
