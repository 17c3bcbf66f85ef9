use bytes::{Buf, Bytes};
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, Request, Response};

/// Represents an item in the HTTP message payload stream.
///
/// This enum is used by the payload decoders to produce either data chunks
/// or signal the end of the payload stream (EOF), and by the payload encoders
/// to accept them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// The framing decision for one message body.
///
/// - Known length: exactly `n` bytes follow the head
/// - Chunked: the body uses chunked transfer coding
/// - Undefined: the body runs until the peer closes the connection
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Payload delimited by end of stream
    Undefined,
}

impl PayloadSize {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if the payload is delimited by end of stream
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, PayloadSize::Undefined)
    }

    /// The declared length, or `-1` when it is not known up front.
    #[inline]
    pub fn content_length(&self) -> i64 {
        match self {
            PayloadSize::Length(length) => i64::try_from(*length).unwrap_or(i64::MAX),
            PayloadSize::Chunked | PayloadSize::Undefined => -1,
        }
    }
}

impl<D: Buf> PayloadItem<D> {
    /// Returns true if this item represents the end of the payload stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    ///
    /// Returns None if this is an EOF marker
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the PayloadItem and returns the contained bytes if this is a Chunk
    ///
    /// Returns None if this is an EOF marker
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// Read access to the head of a request or response.
///
/// The connection only looks at the framing headers and copies the
/// content type and encoding, so anything holding a [`HeaderMap`] will do.
pub trait HttpMessage {
    fn headers(&self) -> &HeaderMap;

    fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers().get(name).and_then(|value| value.to_str().ok())
    }

    fn content_length_header(&self) -> Option<&str> {
        self.header_str(&CONTENT_LENGTH)
    }

    fn transfer_encoding_header(&self) -> Option<&str> {
        self.header_str(&TRANSFER_ENCODING)
    }

    fn content_type(&self) -> Option<&str> {
        self.header_str(&CONTENT_TYPE)
    }

    fn content_encoding(&self) -> Option<&str> {
        self.header_str(&CONTENT_ENCODING)
    }
}

impl HttpMessage for HeaderMap {
    fn headers(&self) -> &HeaderMap {
        self
    }
}

impl<T> HttpMessage for Request<T> {
    fn headers(&self) -> &HeaderMap {
        Request::headers(self)
    }
}

impl<T> HttpMessage for Response<T> {
    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }
}

impl HttpMessage for http::request::Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl HttpMessage for http::response::Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<M: HttpMessage + ?Sized> HttpMessage for &M {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }
}
