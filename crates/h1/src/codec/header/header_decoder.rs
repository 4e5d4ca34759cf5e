//! HTTP header decoder implementation for parsing HTTP request heads
//!
//! This module turns the raw bytes of a request head into a [`RequestHeader`]
//! and the [`PayloadSize`] of the body that follows.
//!
//! # Implementation Details
//!
//! The decoder works in multiple stages:
//!
//! 1. Find the complete head with [`HeadScanner`], enforcing the header size limit
//! 2. Parse the request line, an HTTP/2 request line (the connection preface
//!    included) is left in the buffer untouched
//! 3. Parse the header fields without copying their values
//! 4. Validate `Content-Length` and `Transfer-Encoding` and pick the body framing
//! 5. Resolve the request target against the `Host` header

use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, Request, Version};
use tokio_util::codec::Decoder;
use tracing::trace;

use super::field_parser::{FieldSection, parse_fields};
use super::head_scanner::HeadScanner;
use super::request_line::{HTTP2_PREFACE_LINE, RequestLine, resolve_target};
use crate::config::{ConnectionInfo, HttpOptions};
use crate::protocol::{ParseError, PayloadSize, RequestHeader, RequestTarget};
use crate::utils::{ensure, find_crlf};

/// What the [`HeaderDecoder`] found at the start of the buffer.
#[derive(Debug)]
pub enum DecodedHead {
    /// A complete HTTP/1.x request head and the framing of its body
    Request(RequestHeader, PayloadSize),
    /// The HTTP/2 connection preface or another HTTP/2 request line, nothing
    /// was consumed from the buffer
    Http2Preface,
}

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
#[derive(Debug)]
pub struct HeaderDecoder {
    scanner: HeadScanner,
    normalize_method_case: bool,
    info: ConnectionInfo,
}

impl HeaderDecoder {
    pub fn new(options: &HttpOptions, info: ConnectionInfo) -> Self {
        Self { scanner: HeadScanner::new(options.max_header_size()), normalize_method_case: options.normalize_method_case(), info }
    }
}

impl Decoder for HeaderDecoder {
    type Item = DecodedHead;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(head_length) = self.scanner.scan(src)? else {
            return Ok(None);
        };

        let line_end = find_crlf(&src[..head_length]).ok_or_else(|| ParseError::invalid_request_line("missing CRLF"))?;
        let line = RequestLine::parse(&src[..line_end])?;
        // the preface and any other HTTP/2 request go to the HTTP/2 engine as they are
        if line.version == Version::HTTP_2 {
            trace!(preface = src.starts_with(HTTP2_PREFACE_LINE), "found http/2 request line");
            return Ok(Some(DecodedHead::Http2Preface));
        }
        let method = line.method(self.normalize_method_case)?;
        let (target, version) = (line.target.to_owned(), line.version);

        let head = src.split_to(head_length).freeze();
        let mut headers = HeaderMap::new();
        parse_fields(&head.slice(line_end + 2..), FieldSection::Header, &mut headers)?;

        let payload_size = parse_payload(&headers)?;

        let host = headers.get(HOST).map(|host| host.to_str().map(str::trim)).transpose().map_err(|_| ParseError::InvalidHost)?;
        let host = host.filter(|host| !host.is_empty()).ok_or(ParseError::InvalidHost)?;
        let uri = resolve_target(&target, host, &self.info)?;

        let mut request = Request::new(());
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;
        *request.headers_mut() = headers;
        request.extensions_mut().insert(RequestTarget::new(target));

        trace!(method = %request.method(), uri = %request.uri(), ?payload_size, "decoded request head");
        Ok(Some(DecodedHead::Request(RequestHeader::from(request), payload_size)))
    }
}

/// Determines the body framing of a request from its headers.
///
/// Only `chunked` and `identity` transfer codings are understood, `chunked`
/// wins over `Content-Length`. A request with neither has no body.
fn parse_payload(headers: &HeaderMap) -> Result<PayloadSize, ParseError> {
    let chunked = match headers.get(TRANSFER_ENCODING) {
        None => false,
        Some(value) => {
            let coding = value.as_bytes().trim_ascii();
            if coding.eq_ignore_ascii_case(b"chunked") {
                true
            } else if coding.eq_ignore_ascii_case(b"identity") {
                false
            } else {
                return Err(ParseError::unsupported_transfer_encoding(String::from_utf8_lossy(coding)));
            }
        }
    };

    let length = headers.get(CONTENT_LENGTH).map(|value| parse_content_length(value.as_bytes())).transpose()?;

    Ok(match (chunked, length) {
        (true, _) => PayloadSize::Chunked,
        (false, None | Some(0)) => PayloadSize::Empty,
        (false, Some(length)) => PayloadSize::Length(length),
    })
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    let well_formed = match value {
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    ensure!(
        well_formed,
        ParseError::invalid_content_length(format!("value {} is not a decimal number", String::from_utf8_lossy(value)))
    );

    std::str::from_utf8(value)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or_else(|| ParseError::invalid_content_length("value overflows u64"))
}
