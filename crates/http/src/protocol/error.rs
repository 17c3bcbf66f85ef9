use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection error: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },

    #[error("parse error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

/// Errors raised by the connection state machine itself.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("connection is not bound")]
    NotBound,

    #[error("connection is closed")]
    Closed,

    #[error("connection is already bound")]
    AlreadyBound,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ConnectionError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },

    #[error("line length exceeds the limit {max_len}")]
    TooLongLine { max_len: usize },

    #[error("trailer number exceed the limit {max_num}")]
    TooManyTrailers { max_num: usize },

    #[error("invalid trailer: {reason}")]
    InvalidTrailer { reason: String },

    #[error("truncated chunk: {reason}")]
    TruncatedChunk { reason: String },

    #[error("premature end of Content-Length delimited message body (expected: {expected}; received: {received})")]
    PrematureEof { expected: u64, received: u64 },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("message head ended after {received} bytes")]
    TruncatedHead { received: usize },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported transfer encoding: {encoding}")]
    UnsupportedTransferEncoding { encoding: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn too_long_line(max_len: usize) -> Self {
        Self::TooLongLine { max_len }
    }

    pub fn too_many_trailers(max_num: usize) -> Self {
        Self::TooManyTrailers { max_num }
    }

    pub fn invalid_trailer<S: ToString>(str: S) -> Self {
        Self::InvalidTrailer { reason: str.to_string() }
    }

    pub fn truncated_chunk<S: ToString>(str: S) -> Self {
        Self::TruncatedChunk { reason: str.to_string() }
    }

    pub fn premature_eof(expected: u64, received: u64) -> Self {
        Self::PrematureEof { expected, received }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn truncated_head(received: usize) -> Self {
        Self::TruncatedHead { received }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(str: S) -> Self {
        Self::UnsupportedTransferEncoding { encoding: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the input ended before its framing said it would.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedChunk { .. } | Self::PrematureEof { .. } | Self::TruncatedHead { .. })
    }
}

/// Lets framed readers hand their errors through `std::io::Read`.
impl From<ParseError> for io::Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Io { source } => source,
            e if e.is_truncated() => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

impl From<SendError> for io::Error {
    fn from(e: SendError) -> Self {
        match e {
            SendError::Io { source } => source,
            e @ SendError::InvalidBody { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}
