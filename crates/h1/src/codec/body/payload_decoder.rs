//! Decoder implementation for HTTP request payloads.
//!
//! This module provides a unified decoder for the two kinds of request bodies:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//!
//! Requests without a body never get a payload decoder.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::config::HttpOptions;
use crate::protocol::body::BodyLimit;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A unified decoder for handling HTTP request payloads.
#[derive(Debug)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),
}

impl PayloadDecoder {
    /// Creates the decoder for a request body, `None` if the request has no body.
    pub fn new(payload_size: PayloadSize, limit: BodyLimit, options: &HttpOptions) -> Option<Self> {
        let kind = match payload_size {
            PayloadSize::Length(length) => Kind::Length(LengthDecoder::new(length, limit, options.io_granularity())),
            PayloadSize::Chunked => {
                Kind::Chunked(ChunkedDecoder::new(limit, options.io_granularity(), options.max_header_size()))
            }
            PayloadSize::Empty | PayloadSize::CloseDelimited => return None,
        };
        Some(Self { kind })
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src),
            Kind::Chunked(decoder) => decoder.decode(src),
        }
    }
}
