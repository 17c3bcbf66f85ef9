use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// Writes at most the declared number of body bytes; the excess is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    pub fn is_finish(&self) -> bool {
        self.length == 0
    }

    pub fn remaining(&self) -> u64 {
        self.length
    }

    /// Takes up to `len` bytes of body, returning how many of them fit the
    /// declared length.
    pub fn admit(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        if self.length == 0 {
            warn!(len, "encode payload_item but no need to encode anymore");
            return 0;
        }
        let admitted = usize::try_from(self.length).map_or(len, |remaining| remaining.min(len));
        if admitted < len {
            warn!(declared = self.length, dropped = len - admitted, "payload exceeds content-length");
        }
        self.length -= admitted as u64;
        admitted
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                let len = self.admit(bytes.remaining());
                dst.put(bytes.take(len));
                Ok(())
            }
            PayloadItem::Eof => Ok(()),
        }
    }
}
