//! Content length strategies for incoming and outgoing messages.
//!
//! A strategy looks at the framing headers of a message head and decides how its
//! body is delimited, following
//! [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length).

use http::HeaderValue;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tracing::trace;

use crate::ensure;
use crate::protocol::{HttpMessage, ParseError, PayloadSize};

/// Maps the framing headers of a message to a [`PayloadSize`].
pub trait ContentLengthStrategy {
    fn determine_length(&self, message: &dyn HttpMessage) -> Result<PayloadSize, ParseError>;
}

/// The standard HTTP/1.1 rules.
///
/// - `Transfer-Encoding` wins over `Content-Length`; `chunked` must be the final coding
/// - `Content-Length` values must all agree and be plain decimal digits
/// - with neither header the body runs until the connection is closed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultContentLengthStrategy;

impl ContentLengthStrategy for DefaultContentLengthStrategy {
    fn determine_length(&self, message: &dyn HttpMessage) -> Result<PayloadSize, ParseError> {
        let headers = message.headers();

        // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
        if let Some(last_te) = headers.get_all(TRANSFER_ENCODING).iter().next_back() {
            if is_chunked(last_te) {
                trace!("transfer-encoding chunked wins");
                return Ok(PayloadSize::Chunked);
            }
            let encoding = String::from_utf8_lossy(last_te.as_bytes());
            return Err(ParseError::unsupported_transfer_encoding(encoding));
        }

        let mut length = None;
        for value in &headers.get_all(CONTENT_LENGTH) {
            let parsed = parse_content_length(value)?;
            if let Some(previous) = length {
                ensure!(
                    previous == parsed,
                    ParseError::invalid_content_length(format!("multiple content-length values {previous} and {parsed}"))
                );
            }
            length = Some(parsed);
        }

        Ok(length.map_or(PayloadSize::Undefined, PayloadSize::Length))
    }
}

fn parse_content_length(value: &HeaderValue) -> Result<u64, ParseError> {
    let cl_str = value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?.trim();

    ensure!(
        !cl_str.is_empty() && cl_str.bytes().all(|b| b.is_ascii_digit()),
        ParseError::invalid_content_length(format!("value {cl_str} is not a non-negative integer"))
    );

    cl_str.parse::<u64>().map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: &HeaderValue) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    header_value
        .as_bytes()
        .rsplit(|b| *b == b',')
        .next()
        .is_some_and(|bytes| bytes.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}
