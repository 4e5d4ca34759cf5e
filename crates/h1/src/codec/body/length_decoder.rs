//! Decoder implementation for HTTP messages with Content-Length header.
//!
//! This module provides functionality to decode HTTP messages where the payload size
//! is specified by the Content-Length header, as defined in
//! [RFC 9112 Section 6.2](https://www.rfc-editor.org/rfc/rfc9112#section-6.2).

use std::cmp;

use crate::protocol::body::BodyLimit;
use crate::protocol::{ParseError, PayloadItem};
use crate::utils::ensure;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

/// A decoder for handling HTTP messages with a known content length.
///
/// Segments are emitted once `granularity` bytes are buffered, or once the
/// rest of the body is buffered, so no segment is longer than `granularity`.
#[derive(Debug, Clone)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
    limit: BodyLimit,
    granularity: usize,
    checked: bool,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder instance.
    ///
    /// The declared length is compared with `limit` when decoding starts, so a
    /// handler may still raise the limit after it received the request head.
    pub fn new(length: u64, limit: BodyLimit, granularity: usize) -> Self {
        Self { length, limit, granularity: granularity.max(1), checked: false }
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes bytes from the input buffer according to the content length.
    ///
    /// # Returns
    /// * `Ok(Some(PayloadItem::Eof))` when all bytes have been read
    /// * `Ok(Some(PayloadItem::Chunk(bytes)))` when a segment is decoded
    /// * `Ok(None)` when more data is needed
    /// * `Err(ParseError)` if the declared length exceeds the body limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !self.checked {
            let max_size = self.limit.get();
            ensure!(self.length <= max_size, ParseError::too_large_payload(max_size));
            self.checked = true;
        }

        if self.length == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        let wanted = cmp::min(self.length, self.granularity as u64) as usize;
        if src.len() < wanted {
            return Ok(None);
        }

        let bytes = src.split_to(wanted).freeze();
        self.length -= bytes.len() as u64;
        trace!(len = bytes.len(), remaining = self.length, "read length bytes");
        Ok(Some(PayloadItem::Chunk(bytes)))
    }
}
