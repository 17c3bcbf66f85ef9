//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides functionality to decode HTTP messages that use chunked transfer encoding
//! as specified in [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112.html#name-chunked-transfer-coding).
//!
//! The chunked encoding allows the sender to transmit message data in a series of chunks,
//! indicating the size of each chunk before its data. The last chunk may be followed by
//! trailer fields, which the decoder collects into a [`HeaderMap`].

use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::task::Poll;
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk indicates the end of the message
/// - Trailer fields and an empty line close the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    size_digits: usize,
    line_len: usize,
    max_line_length: Option<usize>,
    max_header_count: Option<usize>,
    trailer_lines: usize,
    trailer_buf: BytesMut,
    trailers: Option<HeaderMap>,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder without line or trailer limits.
    ///
    /// The decoder starts in the Size state, ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    pub fn with_limits(max_line_length: Option<usize>, max_header_count: Option<usize>) -> Self {
        Self {
            state: Size,
            remaining_size: 0,
            size_digits: 0,
            line_len: 0,
            max_line_length,
            max_header_count,
            trailer_lines: 0,
            trailer_buf: BytesMut::new(),
            trailers: None,
        }
    }

    /// Whether the terminating chunk and trailer section have been read.
    pub fn is_finished(&self) -> bool {
        self.state == End
    }

    /// Trailer fields, present once the decoder finished and the sender sent any.
    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Handle whitespace after size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Read optional trailer fields
    Trailer,
    /// Read LF after trailer
    TrailerLf,
    /// Read final CR
    EndCr,
    /// Read final LF
    EndLf,
    /// Final state after reading last chunk
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes chunked transfer encoded data from the input buffer.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when a chunk is successfully decoded
    /// - `Ok(Some(PayloadItem::Eof))` when the final chunk is processed
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if the chunked encoding is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            let mut buf = None;

            self.state = match self.step(src, &mut buf) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = buf {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }

    /// The source is exhausted: whatever is buffered is decoded, and a body that
    /// has not reached its terminating chunk is reported as truncated.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::truncated_chunk(format!("end of stream while in {:?} state", self.state))),
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.len() > 0 {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

impl ChunkedDecoder {
    /// Processes the next step in the chunked decoding state machine.
    ///
    /// # Returns
    /// The next state in the decoding process or an error if invalid encoding is detected
    fn step(&mut self, src: &mut BytesMut, buf: &mut Option<Bytes>) -> Poll<Result<ChunkedState, ParseError>> {
        match self.state {
            Size => self.read_size(src),
            SizeLws => self.read_size_lws(src),
            Extension => self.read_extension(src),
            SizeLf => self.read_size_lf(src),
            Body => self.read_body(src, buf),
            BodyCr => Self::read_body_cr(src),
            BodyLf => Self::read_body_lf(src),
            Trailer => self.read_trailer(src),
            TrailerLf => self.read_trailer_lf(src),
            EndCr => self.read_end_cr(src),
            EndLf => self.read_end_lf(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Counts one more byte of the current line against the configured limit.
    fn count_line_byte(&mut self) -> Result<(), ParseError> {
        self.line_len += 1;
        if let Some(max_len) = self.max_line_length {
            ensure!(self.line_len <= max_len, ParseError::too_long_line(max_len));
        }
        Ok(())
    }

    /// Reads and parses the chunk size in hexadecimal format.
    ///
    /// # State Transitions
    /// - On hex digit (0-9, a-f, A-F): Stay in Size state to read more digits
    /// - On whitespace (tab/space): Transition to SizeLws state
    /// - On semicolon: Transition to Extension state to handle chunk extensions
    /// - On CR: Transition to SizeLf state to finish size line
    /// - On invalid character, or a delimiter before any digit: Return error
    fn read_size(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        macro_rules! or_overflow {
            ($e:expr) => {
                match $e {
                    Some(val) => val,
                    None => return Poll::Ready(Err(ParseError::invalid_chunk("invalid overflow chunked length"))),
                }
            };
        }

        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte() {
            return Poll::Ready(Err(e));
        }

        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b + 10 - b'a',
            b'A'..=b'F' => b + 10 - b'A',
            b'\t' | b' ' | b';' | b'\r' if self.size_digits == 0 => {
                return Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size line: missing size")));
            }
            b'\t' | b' ' => return Poll::Ready(Ok(SizeLws)),
            b';' => return Poll::Ready(Ok(Extension)),
            b'\r' => return Poll::Ready(Ok(SizeLf)),
            _ => return Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size line: Invalid Size"))),
        };

        self.remaining_size = or_overflow!(self.remaining_size.checked_mul(16));
        self.remaining_size = or_overflow!(self.remaining_size.checked_add(u64::from(digit)));
        self.size_digits += 1;

        Poll::Ready(Ok(Size))
    }

    /// Processes linear whitespace (LWS) after the chunk size.
    ///
    /// State transitions:
    /// - On tab/space: Stay in SizeLws state to handle more whitespace
    /// - On semicolon: Move to Extension state to process chunk extensions
    /// - On CR: Move to SizeLf state to finish size line
    /// - On invalid char: Return error
    fn read_size_lws(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte() {
            return Poll::Ready(Err(e));
        }
        match b {
            // LWS can follow the chunk size, but no more digits can come
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size linear white space"))),
        }
    }

    /// Skips chunk extensions, which end at the next CRLF.
    ///
    /// A plain LF inside an extension is rejected.
    fn read_extension(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte() {
            return Poll::Ready(Err(e));
        }
        match b {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk extension contains newline"))),
            _ => Poll::Ready(Ok(Extension)), // no supported extensions
        }
    }

    /// Validates the LF byte after the chunk size line.
    ///
    /// # State Transitions
    /// - On LF with size 0: Move to EndCr state for trailers or final CRLF
    /// - On LF with size > 0: Move to Body state to read chunk data
    /// - On any other byte: Return error
    fn read_size_lf(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                self.line_len = 0;
                self.size_digits = 0;
                if self.remaining_size == 0 {
                    Poll::Ready(Ok(EndCr))
                } else {
                    trace!(size = self.remaining_size, "read chunk size");
                    Poll::Ready(Ok(Body))
                }
            }

            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size LF"))),
        }
    }

    /// Reads the actual chunk data bytes.
    ///
    /// # State Transitions
    /// - On empty input: Stay in Body state
    /// - After reading data with remaining size > 0: Stay in Body state
    /// - After reading data with remaining size = 0: Move to BodyCr state
    fn read_body(&mut self, src: &mut BytesMut, buf: &mut Option<Bytes>) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Ready(Ok(Body));
        }

        if self.remaining_size == 0 {
            return Poll::Ready(Ok(BodyCr));
        }

        // cap remaining bytes at the max capacity of usize
        let remaining = usize::try_from(self.remaining_size).unwrap_or(usize::MAX);

        let read_size = std::cmp::min(remaining, src.len());

        self.remaining_size -= read_size as u64;
        let bytes = src.split_to(read_size).freeze();
        *buf = Some(bytes);

        if self.remaining_size > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyCr)) }
    }

    /// Validates the CR byte after chunk data.
    fn read_body_cr(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk body CR"))),
        }
    }

    /// Validates the LF byte after chunk data, then goes back to reading a size line.
    fn read_body_lf(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(Size)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk body LF"))),
        }
    }

    /// Collects a trailer field line up to its CR.
    fn read_trailer(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(TrailerLf)),
            b => self.push_trailer_byte(b),
        }
    }

    /// Validates the LF byte after a trailer field and counts the field.
    fn read_trailer_lf(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                self.trailer_buf.extend_from_slice(b"\r\n");
                self.trailer_lines += 1;
                self.line_len = 0;
                if let Some(max_num) = self.max_header_count
                    && self.trailer_lines > max_num
                {
                    return Poll::Ready(Err(ParseError::too_many_trailers(max_num)));
                }
                Poll::Ready(Ok(EndCr))
            }
            _ => Poll::Ready(Err(ParseError::invalid_trailer("invalid trailer end LF"))),
        }
    }

    /// Either the final CR or the first byte of another trailer field.
    fn read_end_cr(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(EndLf)),
            b => self.push_trailer_byte(b),
        }
    }

    /// Validates the final LF byte and parses any collected trailer fields.
    fn read_end_lf(&mut self, src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                if !self.trailer_buf.is_empty() {
                    match parse_trailers(&self.trailer_buf, self.trailer_lines) {
                        Ok(trailers) => self.trailers = Some(trailers),
                        Err(e) => return Poll::Ready(Err(e)),
                    }
                    self.trailer_buf.clear();
                }
                Poll::Ready(Ok(End))
            }
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk end LF"))),
        }
    }

    fn push_trailer_byte(&mut self, b: u8) -> Poll<Result<ChunkedState, ParseError>> {
        if let Err(e) = self.count_line_byte() {
            return Poll::Ready(Err(e));
        }
        self.trailer_buf.extend_from_slice(&[b]);
        Poll::Ready(Ok(Trailer))
    }
}

/// Parses `name: value\r\n` lines collected from the trailer section.
fn parse_trailers(raw: &[u8], line_count: usize) -> Result<HeaderMap, ParseError> {
    let mut block = Vec::with_capacity(raw.len() + 2);
    block.extend_from_slice(raw);
    block.extend_from_slice(b"\r\n");

    let mut headers = vec![httparse::EMPTY_HEADER; line_count];
    let parsed = match httparse::parse_headers(&block, &mut headers) {
        Ok(httparse::Status::Complete((_, parsed))) => parsed,
        Ok(httparse::Status::Partial) => return Err(ParseError::invalid_trailer("incomplete trailer section")),
        Err(e) => return Err(ParseError::invalid_trailer(e)),
    };

    let mut trailers = HeaderMap::with_capacity(parsed.len());
    for header in parsed {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_trailer)?;
        let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_trailer)?;
        trailers.append(name, value);
    }
    Ok(trailers)
}
