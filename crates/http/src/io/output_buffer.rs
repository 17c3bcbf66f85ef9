//! Buffered writing to a byte sink.

use std::io::{self, Write};

use bytes::BytesMut;
use tracing::trace;

/// Collects small writes and hands them to the sink in one go.
///
/// Writes larger than the fragment size hint go straight to the sink after
/// any pending bytes.
#[derive(Debug)]
pub struct SessionOutputBuffer {
    buffer: BytesMut,
    buffer_size: usize,
    fragment_size_hint: usize,
}

impl SessionOutputBuffer {
    pub fn new(buffer_size: usize, fragment_size_hint: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(buffer_size), buffer_size, fragment_size_hint: fragment_size_hint.min(buffer_size) }
    }

    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Appends `bytes`, flushing first when they don't fit.
    ///
    /// Writes larger than the fragment size hint flush the pending bytes and
    /// then go to the sink directly.
    pub fn write<W: Write + ?Sized>(&mut self, bytes: &[u8], sink: &mut W) -> io::Result<()> {
        if bytes.len() > self.fragment_size_hint {
            self.flush_buffer(sink)?;
            return sink.write_all(bytes);
        }

        if bytes.len() > self.buffer_size.saturating_sub(self.buffer.len()) {
            self.flush_buffer(sink)?;
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes pending bytes to the sink; does nothing when there are none.
    pub fn flush_buffer<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        sink.write_all(&self.buffer)?;
        trace!(len = self.buffer.len(), "flushed output buffer");
        self.buffer.clear();
        Ok(())
    }

    /// [`flush_buffer`](Self::flush_buffer) followed by a flush of the sink.
    pub fn flush<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        self.flush_buffer(sink)?;
        sink.flush()
    }

    /// Drops pending bytes without writing them.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}
