//! Buffered reading from a byte source.
//!
//! [`SessionInputBuffer`] keeps whatever the last socket read returned until the
//! body decoders consume it. It never reads unless asked to, so a caller can ask
//! whether bytes are already waiting without any I/O.

use std::io::{self, ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Outcome of a single bounded look at the source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Peek {
    /// This many bytes are buffered and ready to be consumed
    Data(usize),
    /// The source reported end of stream
    EndOfStream,
    /// The source timed out before producing anything
    WouldBlock,
}

#[derive(Debug)]
pub struct SessionInputBuffer {
    buffer: BytesMut,
    buffer_size: usize,
}

impl SessionInputBuffer {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(buffer_size), buffer_size }
    }

    /// True iff unread bytes remain; never touches the source.
    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Size of a single read from the source.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Reads once from `source`, appending what it returns.
    ///
    /// Returns the number of bytes obtained; `0` means end of stream.
    pub fn fill<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        let start = self.buffer.len();
        self.buffer.resize(start + self.buffer_size, 0);

        loop {
            match source.read(&mut self.buffer[start..]) {
                Ok(n) => {
                    self.buffer.truncate(start + n);
                    trace!(len = n, buffered = self.buffer.len(), "filled input buffer");
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// Makes sure bytes are buffered, reading at most once from `source`.
    ///
    /// Timeouts are a result rather than an error; any other I/O failure is
    /// returned as is.
    pub fn peek<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<Peek> {
        if self.has_buffered_data() {
            return Ok(Peek::Data(self.buffer.len()));
        }

        match self.fill(source) {
            Ok(0) => Ok(Peek::EndOfStream),
            Ok(n) => Ok(Peek::Data(n)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(Peek::WouldBlock),
            Err(e) => Err(e),
        }
    }

    /// Copies buffered bytes into `dst`, filling from `source` first when empty.
    ///
    /// Returns `0` at end of stream.
    pub fn read<R: Read + ?Sized>(&mut self, dst: &mut [u8], source: &mut R) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        if !self.has_buffered_data() && self.fill(source)? == 0 {
            return Ok(0);
        }

        let len = dst.len().min(self.buffer.len());
        dst[..len].copy_from_slice(&self.buffer[..len]);
        self.buffer.advance(len);
        Ok(len)
    }

    /// Takes a message head, up to and including the empty line that ends it.
    ///
    /// Fills from `source` until the head is complete. Returns `None` when the
    /// source ends before any byte arrives, which is how a peer closes an idle
    /// connection.
    pub fn read_head<R: Read + ?Sized>(&mut self, source: &mut R, max_size: usize) -> Result<Option<Bytes>, ParseError> {
        let mut searched = 0;
        loop {
            if let Some(pos) = self.buffer[searched..].windows(4).position(|w| w == b"\r\n\r\n") {
                let end = searched + pos + 4;
                ensure!(end <= max_size, ParseError::too_large_header(end, max_size));
                return Ok(Some(self.buffer.split_to(end).freeze()));
            }

            ensure!(self.buffer.len() <= max_size, ParseError::too_large_header(self.buffer.len(), max_size));
            searched = self.buffer.len().saturating_sub(3);

            if self.fill(source)? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::truncated_head(self.buffer.len()));
            }
        }
    }

    /// Drops every buffered byte.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}
