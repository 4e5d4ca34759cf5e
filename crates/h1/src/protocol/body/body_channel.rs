use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};
use futures::{SinkExt, Stream, StreamExt, channel::mpsc};
use http_body::SizeHint;
use tracing::{error, trace};

/// Pumps the payload items of one request from the connection into the body channel.
pub(crate) struct BodySender<'conn, S> {
    payload_stream: &'conn mut S,
    data_sender: mpsc::Sender<Result<PayloadItem, ParseError>>,
    eof: bool,
}

impl<'conn, S> BodySender<'conn, S>
where
    S: Stream<Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>> + Unpin,
{
    pub(crate) fn new(payload_stream: &'conn mut S, data_sender: mpsc::Sender<Result<PayloadItem, ParseError>>) -> Self {
        Self { payload_stream, data_sender, eof: false }
    }

    /// Streams payload items to the body until EOF.
    ///
    /// If the receiving body is dropped, the rest of the payload is drained.
    /// A decoding error is delivered to the body and returned.
    pub(crate) async fn send_body(&mut self) -> Result<(), ParseError> {
        while !self.eof {
            match self.read_data().await {
                Ok(payload_item) => {
                    self.eof = payload_item.is_eof();
                    if self.data_sender.send(Ok(payload_item)).await.is_err() {
                        trace!("request body dropped by handler, drain the rest");
                        return self.skip_body().await;
                    }
                }

                Err(e) => {
                    error!("failed to read data from body stream, {}", e);
                    self.eof = true;
                    // a fresh sender always owns one slot, so this never waits on a full channel
                    if self.data_sender.clone().try_send(Err(e.clone())).is_err() {
                        trace!("request body dropped before the error was delivered");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Reads and discards the rest of the payload.
    pub(crate) async fn skip_body(&mut self) -> Result<(), ParseError> {
        let mut skipped = 0usize;
        while !self.eof {
            match self.read_data().await {
                Ok(PayloadItem::Chunk(bytes)) => skipped += bytes.len(),
                Ok(PayloadItem::Trailers(_)) => {}
                Ok(PayloadItem::Eof) => self.eof = true,
                Err(e) => {
                    self.eof = true;
                    return Err(e);
                }
            }
        }
        if skipped > 0 {
            trace!(skipped, "skipped unread request body");
        }
        Ok(())
    }

    async fn read_data(&mut self) -> Result<PayloadItem, ParseError> {
        match self.payload_stream.next().await {
            Some(Ok(Message::Payload(payload_item))) => Ok(payload_item),
            Some(Ok(Message::Header(_) | Message::Http2Preface)) => {
                error!("should not receive header in BodySender");
                Err(ParseError::invalid_body("should not receive header in BodySender"))
            }
            Some(Err(e)) => Err(e),
            None => Err(ParseError::ClientDisconnected),
        }
    }
}

impl From<PayloadSize> for SizeHint {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked | PayloadSize::CloseDelimited => SizeHint::new(),
        }
    }
}
