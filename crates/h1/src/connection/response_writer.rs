use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, UPGRADE};
use http::{HeaderValue, Method, Response, StatusCode, Version};
use http_body::Body;
use http_body_util::{BodyExt, Empty};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{error, trace};

use super::policy::{ConnectionPolicy, Framing, is_bodiless};
use super::state::ConnectionState;
use crate::codec::ResponseEncoder;
use crate::config::HttpOptions;
use crate::protocol::date::http_date;
use crate::protocol::{Message, PayloadItem, PayloadSize, RequestHeader, ResponseHead, SendError};

type ResponseMessage<D> = Message<(ResponseHead, PayloadSize), D>;

const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// What the writer needs to know about the request a response answers.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    version: Version,
    is_head: bool,
    connection: Vec<HeaderValue>,
}

impl ResponseContext {
    pub fn from_request(header: &RequestHeader) -> Self {
        Self {
            version: header.version(),
            is_head: header.method() == Method::HEAD,
            connection: header.headers().get_all(CONNECTION).iter().cloned().collect(),
        }
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }
}

/// Used when no request could be parsed, the response is written as HTTP/1.0.
impl Default for ResponseContext {
    fn default() -> Self {
        Self { version: Version::HTTP_10, is_head: false, connection: Vec::new() }
    }
}

/// Writes responses of one connection.
///
/// Output is collected in a buffer and handed to the transport once it
/// reaches the flush threshold, and at the end of every response.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    flush_threshold: usize,
    policy: ConnectionPolicy,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, options: &HttpOptions) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(options.output_buffer_size()),
            encoder: ResponseEncoder::new(),
            flush_threshold: options.output_buffer_size(),
            policy: ConnectionPolicy::new(options.connection_timeout()),
        }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Gives the transport back, buffered output must be flushed before.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes `response` and returns whether the connection has to be closed after it.
    ///
    /// Framing follows an explicit `Content-Length` only. Without one an HTTP/1.1
    /// response is chunked and an HTTP/1.0 response is delimited by the close.
    /// The body of a response to a `HEAD` request is consumed but not written.
    pub async fn send_response<B>(
        &mut self,
        response: Response<B>,
        context: &ResponseContext,
        state: &mut ConnectionState,
    ) -> Result<bool, SendError>
    where
        B: Body + Unpin,
        B::Error: Display,
    {
        if state.is_write_closed() {
            return Err(SendError::WriteClosed);
        }

        let (parts, mut body) = response.into_parts();
        let mut head = ResponseHead::from_parts(parts, ());
        *head.version_mut() = context.version;

        let framing =
            self.policy.apply(&mut head, context.version, &context.connection, state.remaining_requests(), http_date());
        let payload_size = payload_size(&head, framing, context.is_head)?;
        trace!(status = head.status().as_u16(), ?payload_size, should_close = framing.should_close, "write response");

        self.encoder.encode(ResponseMessage::<B::Data>::Header((head, payload_size)), &mut self.buffer)?;

        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    let payload_item = match frame.into_data() {
                        Ok(data) => PayloadItem::Chunk(data),
                        Err(frame) => match frame.into_trailers() {
                            Ok(trailers) => PayloadItem::Trailers(trailers),
                            Err(_unknown) => continue,
                        },
                    };

                    self.encoder.encode(ResponseMessage::Payload(payload_item), &mut self.buffer)?;
                    if self.buffer.len() >= self.flush_threshold {
                        self.flush(state).await?;
                    }
                }
                Some(Err(e)) => {
                    error!("resolve response body error, cause: {}", e);
                    return Err(SendError::invalid_body(format!("resolve response body error: {e}")));
                }
                None => break,
            }
        }

        self.encoder.encode(ResponseMessage::<B::Data>::Payload(PayloadItem::Eof), &mut self.buffer)?;
        self.flush(state).await?;
        state.response_finished();

        Ok(framing.should_close)
    }

    /// Writes the interim `100 Continue` response.
    pub async fn write_continue(&mut self, state: &mut ConnectionState) -> Result<(), SendError> {
        self.buffer.extend_from_slice(CONTINUE_RESPONSE);
        self.flush(state).await
    }

    /// Writes the `101 Switching Protocols` response accepting an h2c upgrade.
    pub async fn write_switching_protocols(&mut self, state: &mut ConnectionState) -> Result<(), SendError> {
        let mut head = ResponseHead::new(());
        *head.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        head.headers_mut().insert(CONNECTION, HeaderValue::from_static("upgrade"));
        head.headers_mut().insert(UPGRADE, HeaderValue::from_static("h2c"));

        // informational, only the date is added
        self.policy.apply(&mut head, Version::HTTP_11, std::iter::empty(), state.remaining_requests(), http_date());

        self.encoder.encode(ResponseMessage::<Bytes>::Header((head, PayloadSize::Empty)), &mut self.buffer)?;
        self.encoder.encode(ResponseMessage::<Bytes>::Payload(PayloadItem::Eof), &mut self.buffer)?;
        self.flush(state).await
    }

    /// Hands the buffered output to the transport.
    ///
    /// Once a write failed the write side counts as closed, and nothing more is buffered.
    pub async fn flush(&mut self, state: &mut ConnectionState) -> Result<(), SendError> {
        if state.is_write_closed() {
            self.buffer.clear();
            return Err(SendError::WriteClosed);
        }

        if self.buffer.is_empty() {
            return Ok(());
        }

        let written = match self.writer.write_all(&self.buffer).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        self.buffer.clear();

        if let Err(e) = written {
            error!("failed to write response, cause: {}", e);
            state.mark_write_closed();
            return Err(SendError::io(e));
        }
        Ok(())
    }

    pub async fn shutdown(&mut self, state: &mut ConnectionState) -> Result<(), SendError> {
        if state.is_write_closed() {
            return Ok(());
        }
        state.mark_write_closed();
        self.writer.shutdown().await.map_err(SendError::io)
    }
}

fn payload_size(head: &ResponseHead, framing: Framing, is_head: bool) -> Result<PayloadSize, SendError> {
    if is_head || is_bodiless(head.status()) {
        return Ok(PayloadSize::Empty);
    }

    if framing.chunked {
        return Ok(PayloadSize::Chunked);
    }

    match head.headers().get(CONTENT_LENGTH) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|length| length.trim().parse::<u64>().ok())
            .map(PayloadSize::Length)
            .ok_or_else(|| SendError::invalid_head(format!("invalid content-length {value:?}"))),
        None => Ok(PayloadSize::CloseDelimited),
    }
}

/// A bodiless response closing the connection, answers requests that failed to parse.
pub fn build_error_response(status_code: StatusCode) -> Response<Empty<Bytes>> {
    let mut response = Response::new(Empty::<Bytes>::new());
    *response.status_mut() = status_code;
    response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
    response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionInfo;
    use http::HeaderMap;
    use http_body_util::{Full, StreamBody};
    use std::convert::Infallible;

    fn state(max_requests: u64) -> ConnectionState {
        ConnectionState::new(ConnectionInfo::default(), max_requests)
    }

    fn context(version: Version, is_head: bool) -> ResponseContext {
        ResponseContext { version, is_head, connection: Vec::new() }
    }

    /// Drops the `date` line, its value depends on the clock.
    fn without_date(written: &[u8]) -> String {
        let text = String::from_utf8(written.to_vec()).unwrap();
        text.split_inclusive("\r\n").filter(|line| !line.starts_with("date: ")).collect()
    }

    async fn write<B>(response: Response<B>, context: &ResponseContext, state: &mut ConnectionState) -> (bool, String)
    where
        B: Body + Unpin,
        B::Error: Display,
    {
        let mut writer = ResponseWriter::new(Vec::new(), &HttpOptions::default());
        let should_close = writer.send_response(response, context, state).await.unwrap();
        (should_close, without_date(&writer.into_inner()))
    }

    #[tokio::test]
    async fn empty_response_is_chunked() {
        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let (should_close, written) =
            write(Response::new(Empty::<Bytes>::new()), &context(Version::HTTP_11, false), &mut state).await;

        assert!(!should_close);
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6\r\ntransfer-encoding: chunked\r\n\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn explicit_content_length_is_kept() {
        let mut response = Response::new(Full::new(Bytes::from_static(b"hello")));
        response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("5"));

        let mut state = state(10);
        let (should_close, written) = write(response, &context(Version::HTTP_11, false), &mut state).await;

        assert!(!should_close);
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=9\r\n\r\nhello"
        );
        assert_eq!(state.remaining_requests(), 9);
    }

    #[tokio::test]
    async fn streaming_body_is_chunked_with_trailers() {
        let mut trailers = HeaderMap::new();
        trailers.insert("x-checksum", HeaderValue::from_static("abc"));
        let frames = futures::stream::iter(vec![
            Ok::<_, Infallible>(http_body::Frame::data(Bytes::from_static(b"Wiki"))),
            Ok(http_body::Frame::data(Bytes::from_static(b"pedia"))),
            Ok(http_body::Frame::trailers(trailers)),
        ]);

        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let (should_close, written) =
            write(Response::new(StreamBody::new(frames)), &context(Version::HTTP_11, false), &mut state).await;

        assert!(!should_close);
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6\r\ntransfer-encoding: chunked\r\n\r\n\
             4\r\nWiki\r\n5\r\npedia\r\n0\r\nx-checksum: abc\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn streaming_body_on_http10_is_close_delimited() {
        let frames = futures::stream::iter(vec![Ok::<_, Infallible>(http_body::Frame::data(Bytes::from_static(b"raw")))]);

        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let (should_close, written) =
            write(Response::new(StreamBody::new(frames)), &context(Version::HTTP_10, false), &mut state).await;

        assert!(should_close);
        assert_eq!(written, "HTTP/1.0 200 OK\r\nconnection: close\r\n\r\nraw");
    }

    #[tokio::test]
    async fn head_response_discards_body() {
        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let (_, written) =
            write(Response::new(Full::new(Bytes::from_static(b"hello"))), &context(Version::HTTP_11, true), &mut state)
                .await;

        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6\r\ntransfer-encoding: chunked\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn last_permitted_response_closes() {
        let mut state = state(1);
        let (should_close, written) =
            write(Response::new(Empty::<Bytes>::new()), &context(Version::HTTP_11, false), &mut state).await;

        assert!(should_close);
        assert!(written.contains("connection: close\r\n"));
        assert!(state.is_exhausted());
    }

    #[tokio::test]
    async fn short_body_is_an_error() {
        let mut response = Response::new(Full::new(Bytes::from_static(b"abc")));
        response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from_static("10"));

        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let mut writer = ResponseWriter::new(Vec::new(), &HttpOptions::default());
        let result = writer.send_response(response, &context(Version::HTTP_11, false), &mut state).await;
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        state.mark_write_closed();
        let mut writer = ResponseWriter::new(Vec::new(), &HttpOptions::default());
        let result = writer.send_response(Response::new(Empty::<Bytes>::new()), &context(Version::HTTP_11, false), &mut state).await;
        assert!(matches!(result, Err(SendError::WriteClosed)));
        assert!(writer.into_inner().is_empty());
    }

    #[tokio::test]
    async fn continue_and_switching_protocols() {
        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let mut writer = ResponseWriter::new(Vec::new(), &HttpOptions::default());
        writer.write_continue(&mut state).await.unwrap();
        writer.write_switching_protocols(&mut state).await.unwrap();

        assert_eq!(
            without_date(&writer.into_inner()),
            "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 101 Switching Protocols\r\nconnection: upgrade\r\nupgrade: h2c\r\n\r\n"
        );
    }

    #[test]
    fn error_response_closes() {
        let response = build_error_response(StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONNECTION], "close");
        assert_eq!(response.headers()[CONTENT_LENGTH], "0");
    }

    #[tokio::test]
    async fn known_body_size_does_not_set_content_length() {
        let mut state = state(HttpOptions::UNBOUNDED_REQUESTS);
        let (_, written) =
            write(Response::new(Full::new(Bytes::from_static(b"hello"))), &context(Version::HTTP_11, false), &mut state)
                .await;

        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6\r\ntransfer-encoding: chunked\r\n\r\n\
             5\r\nhello\r\n0\r\n\r\n"
        );
    }
}
