//! Decoder for bodies that run until the peer closes the connection.

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Passes every buffered byte through; only the end of the source ends the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityDecoder {
    eof: bool,
}

impl IdentityDecoder {
    pub fn new() -> Self {
        Self { eof: false }
    }
}

impl Decoder for IdentityDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.eof {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        Ok(Some(PayloadItem::Chunk(src.split().freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        self.eof = true;
        Ok(Some(PayloadItem::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_everything_until_eof() {
        let mut buffer = BytesMut::from(&b"some bytes"[..]);
        let mut decoder = IdentityDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&item.as_bytes().unwrap()[..], b"some bytes");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_eof());
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
