//! Encoder for chunked transfer coding.
//!
//! Every non-empty chunk is written as `<hex size>\r\n<data>\r\n`; the end of the
//! body is the zero chunk, the optional trailer fields and an empty line.

use crate::ensure;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use http::HeaderMap;
use std::io::Write;

use tokio_util::codec::Encoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
    trailers: Option<HeaderMap>,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, send_size: 0, trailers: None }
    }

    /// Trailer fields written after the zero chunk.
    pub fn set_trailers(&mut self, trailers: HeaderMap) {
        self.trailers = Some(trailers);
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Starts a chunk of `len` data bytes by writing its size line.
    ///
    /// Returns `false` for an empty chunk, which is skipped: it would read as
    /// the last-chunk marker. The data and a CRLF must follow.
    pub fn begin_chunk(&mut self, len: usize, dst: &mut BytesMut) -> Result<bool, SendError> {
        ensure!(!self.eof, SendError::invalid_body("chunked body already finished"));
        if len == 0 {
            return Ok(false);
        }
        write!(helper::Writer(dst), "{len:X}\r\n")?;
        self.send_size += len;
        Ok(true)
    }

    /// Bytes of chunk data written so far, framing excluded.
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Err(SendError::invalid_body("chunked body already finished"));
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if !self.begin_chunk(bytes.remaining(), dst)? {
                    return Ok(());
                }
                dst.reserve(bytes.remaining() + 2);
                dst.put(bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n");
                if let Some(trailers) = self.trailers.take() {
                    for (name, value) in &trailers {
                        dst.extend_from_slice(name.as_str().as_bytes());
                        dst.extend_from_slice(b": ");
                        dst.extend_from_slice(value.as_bytes());
                        dst.extend_from_slice(b"\r\n");
                    }
                }
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
