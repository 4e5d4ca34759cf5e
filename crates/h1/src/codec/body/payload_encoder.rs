use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};
use bytes::{Buf, BufMut, BytesMut};

use tokio_util::codec::Encoder;

/// encode payload for response body
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

    /// raw payload delimited by closing the connection
    Raw { eof: bool },

    /// no body on the wire, data is consumed and discarded
    NoBody { eof: bool },
}

impl PayloadEncoder {
    /// create an empty `PayloadEncoder`
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody { eof: false } }
    }

    /// create a chunked `PayloadEncoder`
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    /// create a fixed length `PayloadEncoder`
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    /// create a close-delimited `PayloadEncoder`
    pub fn close_delimited() -> Self {
        Self { kind: Kind::Raw { eof: false } }
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::Raw { eof } | Kind::NoBody { eof } => *eof,
        }
    }
}

impl From<PayloadSize> for PayloadEncoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadEncoder::fix_length(size),
            PayloadSize::Chunked => PayloadEncoder::chunked(),
            PayloadSize::Empty => PayloadEncoder::empty(),
            PayloadSize::CloseDelimited => PayloadEncoder::close_delimited(),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::Raw { eof } => {
                match item {
                    PayloadItem::Chunk(bytes) => dst.put(bytes),
                    PayloadItem::Trailers(_) => {}
                    PayloadItem::Eof => *eof = true,
                }
                Ok(())
            }
            Kind::NoBody { eof } => {
                *eof |= item.is_eof();
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
    fn no_body_discards_data() {
        let mut encoder = PayloadEncoder::from(PayloadSize::Empty);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello")), &mut dst).unwrap();
        assert!(!encoder.is_finish());
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert!(encoder.is_finish());
        assert!(dst.is_empty());
    }

    #[test]
    fn raw_body_passes_through() {
        let mut encoder = PayloadEncoder::from(PayloadSize::CloseDelimited);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello ")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"world")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert_eq!(&dst[..], b"hello world");
        assert!(encoder.is_finish());
    }
}
