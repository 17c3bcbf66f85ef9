//! Framed reading of an incoming message body.

use std::io::{self, Read};

use bytes::{Buf, Bytes};
use http::HeaderMap;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::{PayloadDecoder, StreamKind};
use crate::io::SessionInputBuffer;
use crate::protocol::{ParseError, PayloadItem};

/// A body stream bounded by its framing rule.
///
/// The stream shares the connection's input buffer: bytes beyond the end of
/// the body stay there for the next message. It is consumed once.
#[derive(Debug)]
pub struct ContentInputStream<'a, R: ?Sized> {
    decoder: PayloadDecoder,
    buffer: &'a mut SessionInputBuffer,
    source: &'a mut R,
    pending: Bytes,
    eof: bool,
}

impl<'a, R: Read + ?Sized> ContentInputStream<'a, R> {
    pub fn new(decoder: PayloadDecoder, buffer: &'a mut SessionInputBuffer, source: &'a mut R) -> Self {
        Self { decoder, buffer, source, pending: Bytes::new(), eof: false }
    }

    pub fn kind(&self) -> StreamKind {
        self.decoder.stream_kind()
    }

    /// True once the body's end has been reached.
    pub fn is_eof(&self) -> bool {
        self.eof && self.pending.is_empty()
    }

    /// Trailer fields of a chunked body, available after its end.
    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.decoder.trailers()
    }

    /// Returns the next piece of the body, or `None` at its end.
    ///
    /// Reads from the source only when the buffered bytes do not complete a
    /// piece.
    pub fn next_chunk(&mut self) -> Result<Option<Bytes>, ParseError> {
        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }

        loop {
            if self.eof {
                return Ok(None);
            }

            let item = match self.decoder.decode(self.buffer.bytes_mut())? {
                Some(item) => item,
                None => {
                    if self.buffer.fill(self.source)? > 0 {
                        continue;
                    }
                    trace!(kind = ?self.kind(), "source reached end of stream");
                    self.decoder.decode_eof(self.buffer.bytes_mut())?.unwrap_or(PayloadItem::Eof)
                }
            };

            match item {
                PayloadItem::Chunk(bytes) if bytes.is_empty() => {}
                PayloadItem::Chunk(bytes) => return Ok(Some(bytes)),
                PayloadItem::Eof => self.eof = true,
            }
        }
    }

    /// Reads and drops the rest of the body, returning how many bytes were skipped.
    pub fn skip_body(&mut self) -> Result<u64, ParseError> {
        let mut skipped = 0;
        while let Some(bytes) = self.next_chunk()? {
            skipped += bytes.len() as u64;
        }
        trace!(skipped, "skipped remaining body");
        Ok(skipped)
    }
}

impl<R: Read + ?Sized> Read for ContentInputStream<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pending.is_empty() {
            match self.next_chunk()? {
                Some(bytes) => self.pending = bytes,
                None => return Ok(0),
            }
        }

        let len = buf.len().min(self.pending.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.advance(len);
        Ok(len)
    }
}
