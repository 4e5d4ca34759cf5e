//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides functionality to decode HTTP messages that use chunked transfer encoding
//! as specified in [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Chunk data is gathered and handed out in segments of `granularity` bytes, independent
//! of how the sender sized its chunks. The cumulative size is checked against the
//! [`BodyLimit`] of the request: a chunk crossing the limit is only read up to the limit,
//! the bytes read so far are handed out, and then the decoder fails.

use std::cmp;

use crate::codec::header::{FieldSection, parse_fields};
use crate::protocol::body::BodyLimit;
use crate::protocol::{ParseError, PayloadItem};
use crate::utils::{ensure, find_crlf, find_subslice};
use bytes::{Buf, BytesMut};
use http::HeaderMap;
use http::header::{CONTENT_LENGTH, TRAILER, TRANSFER_ENCODING};
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

/// Longest accepted chunk size line, CRLF excluded
const MAX_SIZE_LINE: usize = 10;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal, followed by CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk starts the optional trailer section closed by an empty line
///
/// Chunk extensions are not accepted.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    /// Chunk data bytes read so far
    body_size: u64,
    /// Declared bytes of the current chunk that lie beyond the body limit
    over_limit: u64,
    pending: BytesMut,
    trailers: Option<HeaderMap>,
    limit: BodyLimit,
    granularity: usize,
    max_trailer_size: usize,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder instance.
    ///
    /// The decoder starts in the Size state, ready to read the size of the first chunk.
    pub fn new(limit: BodyLimit, granularity: usize, max_trailer_size: usize) -> Self {
        Self {
            state: Size,
            body_size: 0,
            over_limit: 0,
            pending: BytesMut::new(),
            trailers: None,
            limit,
            granularity: granularity.max(1),
            max_trailer_size,
        }
    }

    fn take_pending(&mut self, max_len: usize) -> PayloadItem {
        let len = cmp::min(max_len, self.pending.len());
        let bytes = self.pending.split_to(len).freeze();
        trace!(len = bytes.len(), "read chunked bytes");
        PayloadItem::Chunk(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line
    Size,
    /// Read chunk data, with the bytes left to read in this chunk
    Data(u64),
    /// Read CRLF after chunk data
    DataCrlf,
    /// Read what follows the last chunk: CRLF or trailer fields
    LastChunk,
    /// Read the trailer section
    Trailers,
    /// The body limit was reached, hand out pending bytes then fail
    Exceeded,
    /// Hand out pending bytes and trailers, then EOF
    Done,
    /// Final state after the body was completely read
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes chunked transfer encoded data from the input buffer.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when a segment of body data is ready
    /// - `Ok(Some(PayloadItem::Trailers(headers)))` once, for a non empty trailer section
    /// - `Ok(Some(PayloadItem::Eof))` when the final chunk is processed
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if the chunked encoding is invalid or the body is too large
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.pending.len() >= self.granularity {
                return Ok(Some(self.take_pending(self.granularity)));
            }

            let next_state = match self.state {
                Size => self.read_size(src)?,
                Data(remaining) => self.read_data(src, remaining),
                DataCrlf => read_data_crlf(src)?,
                LastChunk => read_last_chunk(src),
                Trailers => self.read_trailers(src)?,
                Exceeded => {
                    if !self.pending.is_empty() {
                        return Ok(Some(self.take_pending(self.granularity)));
                    }
                    return Err(ParseError::too_large_payload(self.limit.get()));
                }
                Done => {
                    if !self.pending.is_empty() {
                        return Ok(Some(self.take_pending(self.granularity)));
                    }
                    if let Some(trailers) = self.trailers.take() {
                        return Ok(Some(PayloadItem::Trailers(trailers)));
                    }
                    Some(End)
                }
                End => {
                    trace!(body_size = self.body_size, "finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }
            };

            match next_state {
                Some(state) => self.state = state,
                None => return Ok(None),
            }
        }
    }
}

impl ChunkedDecoder {
    /// Reads a chunk size line, a line longer than [`MAX_SIZE_LINE`] is rejected
    /// as soon as enough bytes are buffered to tell.
    fn read_size(&mut self, src: &mut BytesMut) -> Result<Option<ChunkedState>, ParseError> {
        let window = &src[..cmp::min(src.len(), MAX_SIZE_LINE + 2)];
        let Some(line_end) = find_crlf(window) else {
            ensure!(src.len() < MAX_SIZE_LINE + 2, ParseError::invalid_chunk_size_line("chunk size too long"));
            return Ok(None);
        };

        let size = parse_chunk_size(&src[..line_end])?;
        src.advance(line_end + 2);
        if size == 0 {
            return Ok(Some(LastChunk));
        }

        let budget = self.limit.get().saturating_sub(self.body_size);
        if size <= budget {
            Ok(Some(Data(size)))
        } else {
            trace!(size, budget, "chunk crosses the body limit");
            self.over_limit = size - budget;
            Ok(Some(Data(budget)))
        }
    }

    fn read_data(&mut self, src: &mut BytesMut, remaining: u64) -> Option<ChunkedState> {
        if remaining == 0 {
            return Some(self.after_chunk_data());
        }
        if src.is_empty() {
            return None;
        }

        let len = cmp::min(remaining, src.len() as u64) as usize;
        self.pending.unsplit(src.split_to(len));
        self.body_size += len as u64;
        Some(Data(remaining - len as u64))
    }

    /// The part of the chunk below the limit is read, the limit is looked up
    /// again since the handler may have raised it meanwhile.
    fn after_chunk_data(&mut self) -> ChunkedState {
        if self.over_limit == 0 {
            return DataCrlf;
        }

        let budget = self.limit.get().saturating_sub(self.body_size);
        if budget == 0 {
            return Exceeded;
        }

        let next = cmp::min(budget, self.over_limit);
        self.over_limit -= next;
        Data(next)
    }

    fn read_trailers(&mut self, src: &mut BytesMut) -> Result<Option<ChunkedState>, ParseError> {
        let Some(position) = find_subslice(src, b"\r\n\r\n") else {
            let least_size = src.len().saturating_sub(1);
            ensure!(least_size <= self.max_trailer_size, ParseError::too_large_trailer(least_size, self.max_trailer_size));
            return Ok(None);
        };

        let trailer_size = position + 2;
        ensure!(trailer_size <= self.max_trailer_size, ParseError::too_large_trailer(trailer_size, self.max_trailer_size));

        let block = src.split_to(position + 4).freeze();
        let mut trailers = HeaderMap::new();
        parse_fields(&block, FieldSection::Trailer, &mut trailers)?;

        // framing fields are not allowed to come in late
        trailers.remove(TRANSFER_ENCODING);
        trailers.remove(CONTENT_LENGTH);
        trailers.remove(TRAILER);

        if !trailers.is_empty() {
            self.trailers = Some(trailers);
        }
        Ok(Some(Done))
    }
}

fn read_data_crlf(src: &mut BytesMut) -> Result<Option<ChunkedState>, ParseError> {
    if src.len() < 2 {
        return Ok(None);
    }
    ensure!(&src[..2] == b"\r\n", ParseError::InvalidChunkTerminator);
    src.advance(2);
    Ok(Some(Size))
}

fn read_last_chunk(src: &mut BytesMut) -> Option<ChunkedState> {
    if src.len() < 2 {
        return None;
    }
    if &src[..2] == b"\r\n" {
        src.advance(2);
        Some(Done)
    } else {
        Some(Trailers)
    }
}

/// Parses a hexadecimal chunk size, leading zeros are allowed before a
/// non-zero size but the zero size must be written as a single `0`.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    ensure!(
        !line.is_empty() && line.iter().all(u8::is_ascii_hexdigit),
        ParseError::invalid_hex_chunk_size(String::from_utf8_lossy(line))
    );

    let digits = match line.iter().position(|&b| b != b'0') {
        Some(start) => &line[start..],
        None => {
            ensure!(line.len() == 1, ParseError::invalid_hex_chunk_size(String::from_utf8_lossy(line)));
            return Ok(0);
        }
    };

    // at most MAX_SIZE_LINE hex digits, so the size always fits
    Ok(digits.iter().fold(0u64, |size, &b| (size << 4) | u64::from(hex_value(b))))
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
