//! Framed writing of an outgoing message body.

use std::io::{self, Write};

use bytes::BytesMut;
use http::HeaderMap;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::body::{PayloadEncoder, StreamKind};
use crate::io::SessionOutputBuffer;
use crate::protocol::{PayloadItem, SendError};

/// A body sink that applies the message's framing.
///
/// Chunked bodies collect writes up to the chunk size hint so small writes do
/// not turn into tiny chunks. [`finish`](Self::finish) must be called to
/// complete the framing; dropping the stream leaves the body unterminated.
#[derive(Debug)]
pub struct OutgoingContent<'a, W: ?Sized> {
    encoder: PayloadEncoder,
    buffer: &'a mut SessionOutputBuffer,
    sink: &'a mut W,
    cache: BytesMut,
    chunk_size: usize,
}

impl<'a, W: Write + ?Sized> OutgoingContent<'a, W> {
    pub fn new(encoder: PayloadEncoder, buffer: &'a mut SessionOutputBuffer, sink: &'a mut W, chunk_size: usize) -> Self {
        let chunk_size = if encoder.stream_kind() == StreamKind::Chunked { chunk_size } else { 0 };
        Self { encoder, buffer, sink, cache: BytesMut::with_capacity(chunk_size), chunk_size }
    }

    pub fn kind(&self) -> StreamKind {
        self.encoder.stream_kind()
    }

    /// Trailer fields for a chunked body; ignored by the other framings.
    pub fn set_trailers(&mut self, trailers: HeaderMap) {
        self.encoder.set_trailers(trailers);
    }

    /// Writes any cached bytes and the end of the body, then flushes the sink.
    pub fn finish(mut self) -> Result<(), SendError> {
        self.flush_cache()?;
        self.encoder.encode(PayloadItem::<&[u8]>::Eof, self.buffer.bytes_mut())?;
        self.buffer.flush(self.sink)?;
        trace!(kind = ?self.kind(), "finished outgoing content");
        Ok(())
    }

    /// Frames `bytes` and hands the data to the output buffer, which sends
    /// fragments above its size hint straight to the sink.
    fn write_fragment(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        let fragment = self.encoder.begin_fragment(bytes.len(), self.buffer.bytes_mut())?;
        self.buffer.write(&bytes[..fragment.len], self.sink)?;
        self.buffer.write(fragment.suffix, self.sink)?;
        Ok(())
    }

    fn flush_cache(&mut self) -> Result<(), SendError> {
        if self.cache.is_empty() {
            return Ok(());
        }
        let cache = self.cache.split();
        self.write_fragment(&cache)
    }
}

impl<W: Write + ?Sized> Write for OutgoingContent<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.chunk_size == 0 {
            self.write_fragment(buf)?;
            return Ok(buf.len());
        }

        if self.cache.len() + buf.len() < self.chunk_size {
            self.cache.extend_from_slice(buf);
            return Ok(buf.len());
        }

        self.flush_cache()?;
        if buf.len() < self.chunk_size {
            self.cache.extend_from_slice(buf);
        } else {
            self.write_fragment(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_cache()?;
        self.buffer.flush(self.sink)
    }
}
