use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::codec::body::payload_decoder::StreamKind;
use crate::protocol::{PayloadItem, PayloadSize, SendError};
use bytes::{Buf, BufMut, BytesMut};
use http::HeaderMap;

use tokio_util::codec::Encoder;

/// How one fragment of body data is framed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Number of data bytes that belong to the body
    pub len: usize,
    /// Bytes to write right after the data
    pub suffix: &'static [u8],
}

/// encode payload for an outgoing message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// raw payload, ended by closing the connection
    Identity { eof: bool },
}

impl PayloadEncoder {
    /// create a chunked `PayloadEncoder`
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    /// create a fixed length `PayloadEncoder`
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    /// create an identity `PayloadEncoder`
    pub fn identity() -> Self {
        Self { kind: Kind::Identity { eof: false } }
    }

    pub fn stream_kind(&self) -> StreamKind {
        match &self.kind {
            Kind::Length(_) => StreamKind::LengthDelimited,
            Kind::Chunked(_) => StreamKind::Chunked,
            Kind::Identity { .. } => StreamKind::Identity,
        }
    }

    /// Trailers only have a place in chunked bodies; other framings ignore them.
    pub fn set_trailers(&mut self, trailers: HeaderMap) {
        if let Kind::Chunked(encoder) = &mut self.kind {
            encoder.set_trailers(trailers);
        }
    }

    /// Frames `len` bytes of body data that the caller writes itself.
    ///
    /// Any prefix, the chunk size line, goes to `dst`. The first `len` bytes of
    /// the returned fragment and then its suffix must follow in that order.
    pub fn begin_fragment(&mut self, len: usize, dst: &mut BytesMut) -> Result<Fragment, SendError> {
        let fragment = match &mut self.kind {
            Kind::Length(encoder) => Fragment { len: encoder.admit(len), suffix: b"" },
            Kind::Chunked(encoder) => {
                if encoder.begin_chunk(len, dst)? {
                    Fragment { len, suffix: b"\r\n" }
                } else {
                    Fragment { len: 0, suffix: b"" }
                }
            }
            Kind::Identity { .. } => Fragment { len, suffix: b"" },
        };
        Ok(fragment)
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::Identity { eof } => *eof,
        }
    }
}

impl From<PayloadSize> for PayloadEncoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadEncoder::fix_length(size),
            PayloadSize::Chunked => PayloadEncoder::chunked(),
            PayloadSize::Undefined => PayloadEncoder::identity(),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::Identity { eof } => {
                match item {
                    PayloadItem::Chunk(bytes) => dst.put(bytes),
                    PayloadItem::Eof => *eof = true,
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn identity_writes_every_segment() {
        let mut encoder = PayloadEncoder::identity();
        let mut dst = BytesMut::new();

        let data = Bytes::from_static(b"raw ").chain(Bytes::from_static(b"bytes"));
        encoder.encode(PayloadItem::Chunk(data), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert_eq!(&dst[..], b"raw bytes");
        assert!(encoder.is_finish());
    }

    #[test]
    fn fragments_follow_the_framing() {
        let mut dst = BytesMut::new();

        let mut chunked = PayloadEncoder::chunked();
        assert_eq!(chunked.begin_fragment(26, &mut dst).unwrap(), Fragment { len: 26, suffix: b"\r\n" });
        assert_eq!(&dst[..], b"1A\r\n");
        dst.clear();
        assert_eq!(chunked.begin_fragment(0, &mut dst).unwrap(), Fragment { len: 0, suffix: b"" });
        assert!(dst.is_empty());

        let mut length = PayloadEncoder::fix_length(10);
        assert_eq!(length.begin_fragment(6, &mut dst).unwrap().len, 6);
        assert_eq!(length.begin_fragment(6, &mut dst).unwrap().len, 4);
        assert!(length.is_finish());
        assert!(dst.is_empty());
    }
}
