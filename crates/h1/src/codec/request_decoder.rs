//! HTTP request decoder module
//!
//! This module provides functionality for decoding HTTP requests using a streaming approach.
//! It handles both head parsing and payload decoding through a state machine pattern.
//!
//! # Components
//!
//! - [`RequestDecoder`]: Main decoder that coordinates head and payload parsing
//! - Head parsing: Uses [`HeaderDecoder`] for parsing request heads
//! - Payload handling: Uses [`PayloadDecoder`] for handling request bodies if any
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::RequestDecoder;
//! use micro_h1::protocol::{Message, PayloadItem, PayloadSize};
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\n\r\nhi");
//!
//! let Some(Message::Header((header, payload_size))) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(header.uri().path(), "/echo");
//! assert_eq!(payload_size, PayloadSize::Length(2));
//!
//! let Some(Message::Payload(PayloadItem::Chunk(bytes))) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(&bytes[..], b"hi");
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{DecodedHead, HeaderDecoder};
use crate::config::{ConnectionInfo, HttpOptions};
use crate::protocol::body::BodyLimit;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

/// A decoder for HTTP requests that handles both heads and payload
///
/// The decoder operates in two phases:
/// 1. Head parsing: Decodes the request head using [`HeaderDecoder`]
/// 2. Payload parsing: If present, decodes the request body using [`PayloadDecoder`]
///
/// # State Machine
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing heads
/// - `Some(PayloadDecoder)`: Currently parsing payload
///
/// When the buffer starts with the HTTP/2 connection preface the decoder yields
/// [`Message::Http2Preface`] and leaves the buffer untouched.
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    body_limit: Option<BodyLimit>,
    options: HttpOptions,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &HttpOptions, info: ConnectionInfo) -> Self {
        Self {
            header_decoder: HeaderDecoder::new(options, info),
            payload_decoder: None,
            body_limit: None,
            options: options.clone(),
        }
    }

    /// The body limit of the request whose body is being decoded.
    pub fn body_limit(&self) -> Option<BodyLimit> {
        self.body_limit.clone()
    }

    /// Returns true while a request body is being decoded.
    pub fn is_decoding_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_options(&HttpOptions::default(), ConnectionInfo::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, PayloadSize)>;
    type Error = ParseError;

    /// Attempts to decode an HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: Successfully decoded a request head
    /// - `Ok(Some(Message::Payload(_)))`: Successfully decoded a payload item
    /// - `Ok(Some(Message::Http2Preface))`: The peer speaks HTTP/2 with prior knowledge
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // parse payload if have payload_decoder
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ (PayloadItem::Chunk(_) | PayloadItem::Trailers(_))) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // no need payload decoder in this request now
                    self.payload_decoder.take();
                    self.body_limit.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        // parse request
        let message = match self.header_decoder.decode(src)? {
            Some(DecodedHead::Request(header, payload_size)) => {
                let limit = BodyLimit::new(self.options.max_body_size());
                self.payload_decoder = PayloadDecoder::new(payload_size, limit.clone(), &self.options);
                self.body_limit = self.payload_decoder.as_ref().map(|_| limit);
                Some(Message::Header((header, payload_size)))
            }
            Some(DecodedHead::Http2Preface) => Some(Message::Http2Preface),
            None => None,
        };

        Ok(message)
    }

    /// A connection closing in the middle of a request is reported as a
    /// disconnect, a connection closing between requests ends the stream.
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(message) => Ok(Some(message)),
            None if buf.is_empty() && self.payload_decoder.is_none() => Ok(None),
            None => {
                trace!(buffered = buf.len(), "connection closed in the middle of a request");
                Err(ParseError::ClientDisconnected)
            }
        }
    }
}
