use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use http_body::{Body, Frame, SizeHint};

use super::{BodyLimit, BodySender};
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};

/// The body of a request, as seen by a handler.
///
/// Data frames carry body segments in arrival order, a chunked body may end
/// with a trailers frame. A request without a body is an empty `ReqBody`.
///
/// A decoding failure, for example a body over the size limit, is yielded as
/// the last item of the stream after every segment decoded before it.
#[derive(Debug)]
pub struct ReqBody {
    kind: Kind,
    payload_size: PayloadSize,
    limit: Option<BodyLimit>,
}

#[derive(Debug)]
enum Kind {
    Empty,
    Channel { receiver: mpsc::Receiver<Result<PayloadItem, ParseError>>, finished: bool },
}

impl ReqBody {
    /// A body with no data, used for requests without `Content-Length` or chunked framing.
    pub fn empty() -> Self {
        Self { kind: Kind::Empty, payload_size: PayloadSize::Empty, limit: None }
    }

    /// Creates the body streaming channel for one request.
    ///
    /// The returned [`BodySender`] borrows the connection's frame stream and
    /// must be driven by the connection while the handler consumes the body.
    pub(crate) fn body_channel<S>(
        payload_stream: &mut S,
        payload_size: PayloadSize,
        limit: BodyLimit,
        capacity: usize,
    ) -> (ReqBody, BodySender<'_, S>)
    where
        S: Stream<Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>> + Unpin,
    {
        let (data_sender, receiver) = mpsc::channel(capacity);
        let req_body = ReqBody { kind: Kind::Channel { receiver, finished: false }, payload_size, limit: Some(limit) };
        (req_body, BodySender::new(payload_stream, data_sender))
    }

    /// Raises the maximum body size accepted for this request.
    ///
    /// Only bytes not decoded yet are affected. Bodies of a known length are
    /// checked once, before their first segment is decoded.
    pub fn raise_max_body_size(&self, size: u64) {
        if let Some(limit) = &self.limit {
            limit.raise(size);
        }
    }

    /// The current maximum body size, `None` for a request without a body.
    pub fn max_body_size(&self) -> Option<u64> {
        self.limit.as_ref().map(BodyLimit::get)
    }
}

impl Default for ReqBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let Kind::Channel { receiver, finished } = &mut this.kind else {
            return Poll::Ready(None);
        };

        if *finished {
            return Poll::Ready(None);
        }

        match receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(PayloadItem::Chunk(bytes)))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Poll::Ready(Some(Ok(PayloadItem::Trailers(trailers)))) => Poll::Ready(Some(Ok(Frame::trailers(trailers)))),
            Poll::Ready(Some(Ok(PayloadItem::Eof))) => {
                *finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                *finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                *finished = true;
                Poll::Ready(Some(Err(ParseError::ClientDisconnected)))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Channel { finished, .. } => *finished,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self.kind {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Channel { .. } => self.payload_size.into(),
        }
    }
}
