use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadSize, ResponseHead, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

/// Encodes a response head followed by its payload items.
///
/// The [`PayloadSize`] given with the head selects the body framing, it has to
/// agree with the framing headers of the head.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Buf> Encoder<Message<(ResponseHead, PayloadSize), D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, PayloadSize), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(SendError::invalid_head("expect payload item but receive response head"));
                }

                self.payload_encoder = Some(payload_size.into());
                self.header_encoder.encode(head, dst)
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect response header but receive payload item");
                    return Err(SendError::invalid_body("expect response header but receive payload item"));
                };

                let result = payload_encoder.encode(payload_item, dst);

                if payload_encoder.is_finish() {
                    self.payload_encoder.take();
                }

                result
            }

            Message::Http2Preface => Err(SendError::invalid_head("the http/2 preface is not a response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PayloadItem;
    use bytes::Bytes;
    use http::Response;

    #[test]
    fn encode_chunked_response() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();
        let head = Response::builder().header("transfer-encoding", "chunked").body(()).unwrap();

        encoder.encode(Message::<_, Bytes>::Header((head, PayloadSize::Chunked)), &mut dst).unwrap();
        encoder.encode(Message::<(ResponseHead, PayloadSize), _>::Payload(PayloadItem::Chunk(Bytes::from_static(b"hi"))), &mut dst).unwrap();
        encoder.encode(Message::<(ResponseHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n2\r\nhi\r\n0\r\n\r\n");
    }

    #[test]
    fn payload_before_head() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();
        let result = encoder.encode(Message::<(ResponseHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst);
        assert!(result.is_err());
    }

    #[test]
    fn discard_body_of_bodiless_response() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();
        let head = Response::builder().header("content-length", "5").body(()).unwrap();

        encoder.encode(Message::<_, Bytes>::Header((head, PayloadSize::Empty)), &mut dst).unwrap();
        let head_len = dst.len();
        encoder.encode(Message::<(ResponseHead, PayloadSize), _>::Payload(PayloadItem::Chunk(Bytes::from_static(b"hello"))), &mut dst).unwrap();
        encoder.encode(Message::<(ResponseHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(dst.len(), head_len);
    }
}
