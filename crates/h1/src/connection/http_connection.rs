use std::fmt::Display;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::{HeaderMap, Response, StatusCode};
use http_body::Body;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio_util::codec::FramedRead;
use tracing::{error, info, warn};

use super::response_writer::{ResponseContext, ResponseWriter, build_error_response};
use super::state::ConnectionState;
use super::upgrade::{HandoffMode, Http2Engine, Http2Handoff, Served, UpgradedRequest, negotiate_h2c};
use crate::codec::RequestDecoder;
use crate::config::{ConnectionInfo, HttpOptions};
use crate::handler::Handler;
use crate::protocol::body::{BodyLimit, ReqBody};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RequestHeader};

/// An HTTP/1.x connection that manages request processing and response streaming
///
/// `HttpConnection` handles the full lifecycle of an HTTP connection, including:
/// - Reading and decoding requests
/// - Streaming request bodies to the handler while it runs
/// - Handling expect-continue mechanism
/// - Writing responses with keep-alive bookkeeping
/// - Handing the connection over to an HTTP/2 engine
///
/// Requests are served one at a time: the next request is decoded only after
/// the response to the current one has been written.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: ResponseWriter<W>,
    state: ConnectionState,
    options: Arc<HttpOptions>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_options(reader, writer, Arc::new(HttpOptions::default()), ConnectionInfo::default())
    }

    pub fn with_options(reader: R, writer: W, options: Arc<HttpOptions>, info: ConnectionInfo) -> Self {
        let decoder = RequestDecoder::with_options(&options, info);
        Self {
            framed_read: FramedRead::with_capacity(reader, decoder, options.io_granularity()),
            writer: ResponseWriter::new(writer, &options),
            state: ConnectionState::new(info, options.max_requests_per_connection()),
            options,
        }
    }

    #[inline]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Serves requests until the connection closes or switches to HTTP/2.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<Served<R, W>, HttpError>
    where
        H: Handler,
        H::RespBody: Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            if self.state.is_exhausted() {
                info!("request budget used up, close the connection");
                return self.close().await;
            }

            match self.framed_read.next().await {
                Some(Ok(Message::Header((header, payload_size)))) => {
                    if let Some(settings) = negotiate_h2c(&header) {
                        return self.upgrade_h2c(header, payload_size, settings).await;
                    }

                    if self.do_process(header, payload_size, &handler).await? {
                        return self.close().await;
                    }
                }

                Some(Ok(Message::Http2Preface)) => {
                    info!("receive http/2 connection preface, hand over the connection");
                    return Ok(self.handoff(HandoffMode::PriorKnowledge));
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("receive body without a request head");
                    let e = ParseError::invalid_body("need header while receive body");
                    self.send_error_response(e.status_code(), &ResponseContext::default()).await;
                    return Err(e.into());
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    self.send_error_response(e.status_code(), &ResponseContext::default()).await;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(Served::Closed);
                }
            }
        }
    }

    /// Runs one request through the handler and writes its response.
    ///
    /// Returns whether the connection has to be closed afterwards.
    async fn do_process<H>(
        &mut self,
        header: RequestHeader,
        payload_size: PayloadSize,
        handler: &Arc<H>,
    ) -> Result<bool, HttpError>
    where
        H: Handler,
        H::RespBody: Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let context = ResponseContext::from_request(&header);
        self.state.request_started();

        if header.expects_continue() {
            self.writer.write_continue(&mut self.state).await?;
            info!("receive expect request header, sent continue response");
        }

        if payload_size.is_empty() {
            let response_result = handler.call(header.body(ReqBody::empty())).await;
            return self.send_response(response_result, &context).await;
        }

        let limit = self
            .framed_read
            .decoder()
            .body_limit()
            .unwrap_or_else(|| BodyLimit::new(self.options.max_body_size()));
        let capacity = self.options.body_channel_capacity();
        let (req_body, mut body_sender) = ReqBody::body_channel(&mut self.framed_read, payload_size, limit, capacity);

        let request = header.body(req_body);

        // The handler runs while the body is streamed to it: it may wait for
        // body data the sender has not delivered yet, and it may return
        // without reading the body at all.
        let (response_result, body_result) = {
            tokio::pin! {
                let request_handle_future = handler.call(request);
                let body_sender_future = body_sender.send_body();
            }

            let mut body_result = None;
            let response_result = loop {
                select! {
                    biased;
                    response = &mut request_handle_future => break response,
                    result = &mut body_sender_future, if body_result.is_none() => body_result = Some(result),
                }
            };
            (response_result, body_result)
        };

        // skip body if request handler don't read body
        let body_result = match body_result {
            Some(result) => result,
            None => body_sender.skip_body().await,
        };
        drop(body_sender);

        if let Err(e) = body_result {
            error!("failed to read request body, cause {}", e);
            self.send_error_response(e.status_code(), &context).await;
            return Err(e.into());
        }

        self.send_response(response_result, &context).await
    }

    async fn send_response<B, E>(
        &mut self,
        response_result: Result<Response<B>, E>,
        context: &ResponseContext,
    ) -> Result<bool, HttpError>
    where
        B: Body + Unpin,
        B::Error: Display,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let should_close = match response_result {
            Ok(response) => self.writer.send_response(response, context, &mut self.state).await?,
            Err(e) => {
                error!("handle response error, cause: {}", e.into());
                let error_response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR);
                self.writer.send_response(error_response, context, &mut self.state).await?
            }
        };
        Ok(should_close)
    }

    /// Best effort, the connection is torn down afterwards anyway.
    async fn send_error_response(&mut self, status: StatusCode, context: &ResponseContext) {
        let error_response = build_error_response(status);
        if let Err(e) = self.writer.send_response(error_response, context, &mut self.state).await {
            warn!("failed to send error response {}, cause {}", status, e);
        }
    }

    async fn upgrade_h2c(
        mut self,
        header: RequestHeader,
        payload_size: PayloadSize,
        settings: Bytes,
    ) -> Result<Served<R, W>, HttpError> {
        info!(uri = %header.uri(), "upgrade the connection to h2c");
        let context = ResponseContext::from_request(&header);

        if header.expects_continue() {
            self.writer.write_continue(&mut self.state).await?;
        }

        let target = header.target().map_or_else(|| header.uri().path().to_owned(), |target| target.as_str().to_owned());
        let (parts, ()) = header.into_inner().into_parts();
        let mut headers = parts.headers;

        let body = if payload_size.is_empty() {
            Bytes::new()
        } else {
            match self.read_upgrade_body(&mut headers).await {
                Ok(body) => body,
                Err(e) => {
                    error!("failed to read the body of the upgrade request, cause {}", e);
                    self.send_error_response(e.status_code(), &context).await;
                    return Err(e.into());
                }
            }
        };

        self.writer.write_switching_protocols(&mut self.state).await?;

        let request = UpgradedRequest::new(parts.method, &parts.uri, target, headers, body);
        Ok(self.handoff(HandoffMode::H2c { settings, request }))
    }

    /// Reads the whole body of the upgrade request, trailers are merged into `headers`.
    async fn read_upgrade_body(&mut self, headers: &mut HeaderMap) -> Result<Bytes, ParseError> {
        let mut body = BytesMut::new();
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => body.extend_from_slice(&bytes),
                Some(Ok(Message::Payload(PayloadItem::Trailers(trailers)))) => {
                    for (name, value) in &trailers {
                        headers.append(name.clone(), value.clone());
                    }
                }
                Some(Ok(Message::Payload(PayloadItem::Eof))) => return Ok(body.freeze()),
                Some(Ok(Message::Header(_) | Message::Http2Preface)) => {
                    return Err(ParseError::invalid_body("need body while receive header"));
                }
                Some(Err(e)) => return Err(e),
                None => return Err(ParseError::ClientDisconnected),
            }
        }
    }

    fn handoff(self, mode: HandoffMode) -> Served<R, W> {
        let parts = self.framed_read.into_parts();
        Served::Upgraded(Http2Handoff {
            reader: parts.io,
            writer: self.writer.into_inner(),
            buffered: parts.read_buf,
            state: self.state,
            mode,
        })
    }

    async fn close(mut self) -> Result<Served<R, W>, HttpError> {
        self.writer.shutdown(&mut self.state).await?;
        Ok(Served::Closed)
    }
}

/// Serves `connection` and, when it switches to HTTP/2, lets `engine` serve the rest of it.
pub async fn serve_connection<R, W, H, E>(
    connection: HttpConnection<R, W>,
    handler: Arc<H>,
    engine: &E,
) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    H: Handler + Send + Sync + 'static,
    H::RespBody: Unpin,
    <H::RespBody as Body>::Error: Display,
    E: Http2Engine<R, W>,
{
    match connection.process(Arc::clone(&handler)).await? {
        Served::Closed => Ok(()),
        Served::Upgraded(handoff) => {
            info!(prior_knowledge = handoff.is_prior_knowledge(), buffered = handoff.buffered.len(), "serve http/2");
            engine.serve(handoff, handler).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::body::ReqBody;
    use http::Request;
    use http_body_util::{BodyExt, Empty, Full};
    use indoc::indoc;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, DuplexStream};

    type TestResult = Result<Served<&'static [u8], DuplexStream>, HttpError>;

    const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

    async fn run<H>(input: &'static [u8], handler: H, options: HttpOptions) -> (TestResult, String)
    where
        H: Handler,
        H::RespBody: Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let (server, mut client) = tokio::io::duplex(64 * 1024);
        let connection =
            HttpConnection::with_options(input, server, Arc::new(options), ConnectionInfo::new(Some(8080), false));

        let mut result = connection.process(Arc::new(handler)).await;
        // the client sees EOF only once the server side is gone
        if let Ok(Served::Upgraded(handoff)) = &mut result {
            drop(std::mem::replace(&mut handoff.writer, tokio::io::duplex(1).0));
        }

        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        let written = String::from_utf8(written).unwrap();
        (result, written.split_inclusive("\r\n").filter(|line| !line.starts_with("date: ")).collect())
    }

    fn echo() -> impl Handler<RespBody = Full<Bytes>, Error = ParseError> {
        make_handler(|req: Request<ReqBody>| async move {
            let body = req.into_body().collect().await?.to_bytes();
            Ok::<_, ParseError>(Response::new(Full::new(body)))
        })
    }

    fn path() -> impl Handler<RespBody = Full<Bytes>, Error = ParseError> {
        make_handler(|req: Request<ReqBody>| async move {
            Ok::<_, ParseError>(Response::new(Full::new(Bytes::from(req.uri().path().to_owned()))))
        })
    }

    #[tokio::test]
    async fn keep_alive_until_eof() {
        let handler = make_handler(|_req: Request<ReqBody>| async { Ok::<_, ParseError>(Response::new(Empty::<Bytes>::new())) });
        let (result, written) = run(b"GET /a HTTP/1.1\r\nHost: x\r\n\r\n", handler, HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=999\r\ntransfer-encoding: chunked\r\n\r\n\
             0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn pipelined_requests_in_order() {
        let input = indoc! {"
            GET /a HTTP/1.1\r
            Host: x\r
            \r
            GET /b HTTP/1.1\r
            Host: x\r
            \r
        "};
        let (result, written) = run(input.as_bytes(), path(), HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=999\r\ntransfer-encoding: chunked\r\n\r\n\
             2\r\n/a\r\n0\r\n\r\n\
             HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=998\r\ntransfer-encoding: chunked\r\n\r\n\
             2\r\n/b\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn echo_chunked_body() {
        let input = b"POST /echo HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let (result, written) = run(input, echo(), HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=999\r\ntransfer-encoding: chunked\r\n\r\n\
             9\r\nWikipedia\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn unread_body_is_drained() {
        let input = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhelloGET /b HTTP/1.1\r\nHost: x\r\n\r\n";
        let (result, written) = run(input, path(), HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert!(written.ends_with("\r\n\r\n2\r\n/b\r\n0\r\n\r\n"));
        assert_eq!(written.matches("HTTP/1.1 200 OK").count(), 2);
    }

    #[tokio::test]
    async fn expect_continue() {
        let input = b"POST /echo HTTP/1.1\r\nHost: x\r\nExpect: 100-continue\r\nContent-Length: 2\r\n\r\nhi";
        let (_, written) = run(input, echo(), HttpOptions::default()).await;

        assert_eq!(
            written,
            "HTTP/1.1 100 Continue\r\n\r\n\
             HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=999\r\ntransfer-encoding: chunked\r\n\r\n\
             2\r\nhi\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn close_after_max_requests() {
        let input = indoc! {"
            GET /a HTTP/1.1\r
            Host: x\r
            \r
            GET /b HTTP/1.1\r
            Host: x\r
            \r
            GET /c HTTP/1.1\r
            Host: x\r
            \r
        "};
        let options = HttpOptions::builder().max_requests_per_connection(2).build();
        let (result, written) = run(input.as_bytes(), path(), options).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=1\r\ntransfer-encoding: chunked\r\n\r\n\
             2\r\n/a\r\n0\r\n\r\n\
             HTTP/1.1 200 OK\r\nconnection: close\r\n\r\n/b"
        );
    }

    #[tokio::test]
    async fn zero_request_budget_serves_one_request() {
        let input = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\nHost: x\r\n\r\n";
        let options = HttpOptions::builder().max_requests_per_connection(0).build();
        let (result, written) = run(input, path(), options).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(written, "HTTP/1.1 200 OK\r\nconnection: close\r\n\r\n/a");
    }

    #[tokio::test]
    async fn http10_closes_after_response() {
        let input = b"GET /a HTTP/1.0\r\nHost: x\r\n\r\nGET /b HTTP/1.0\r\nHost: x\r\n\r\n";
        let (result, written) = run(input, path(), HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert_eq!(written, "HTTP/1.0 200 OK\r\nconnection: close\r\n\r\n/a");
    }

    #[tokio::test]
    async fn head_response_has_no_body() {
        let (_, written) = run(b"HEAD / HTTP/1.1\r\nHost: x\r\n\r\n", path(), HttpOptions::default()).await;
        assert_eq!(
            written,
            "HTTP/1.1 200 OK\r\nconnection: keep-alive\r\nkeep-alive: timeout=6, max=999\r\ntransfer-encoding: chunked\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn missing_host_is_bad_request() {
        let (result, written) = run(b"GET / HTTP/1.1\r\n\r\n", path(), HttpOptions::default()).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::InvalidHost })));
        assert_eq!(written, "HTTP/1.0 400 Bad Request\r\nconnection: close\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn unsupported_transfer_encoding() {
        let input = b"POST / HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: gibberish\r\n\r\n4\r\nWiki\r\n";
        let (result, written) = run(input, echo(), HttpOptions::default()).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::UnsupportedTransferEncoding { .. } })));
        assert!(written.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn body_over_limit() {
        let input = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 10\r\n\r\n0123456789";
        let options = HttpOptions::builder().max_body_size(4).build();
        let (result, written) = run(input, echo(), options).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::TooLargePayload { .. } })));
        assert!(written.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
        assert!(written.contains("connection: close\r\n"));
    }

    #[tokio::test]
    async fn handler_raises_body_limit() {
        let handler = make_handler(|req: Request<ReqBody>| async move {
            req.body().raise_max_body_size(16);
            let body = req.into_body().collect().await?.to_bytes();
            Ok::<_, ParseError>(Response::new(Full::new(body)))
        });
        let input = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 10\r\n\r\n0123456789";
        let options = HttpOptions::builder().max_body_size(4).build();
        let (result, written) = run(input, handler, options).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert!(written.ends_with("\r\n\r\na\r\n0123456789\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn handler_error_is_internal_server_error() {
        let handler = make_handler(|_req: Request<ReqBody>| async {
            Err::<Response<Empty<Bytes>>, _>(ParseError::invalid_body("handler failed"))
        });
        let (result, written) = run(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", handler, HttpOptions::default()).await;

        assert!(matches!(result, Ok(Served::Closed)));
        assert!(written.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(written.contains("connection: close\r\n"));
    }

    #[tokio::test]
    async fn prior_knowledge_keeps_whole_buffer() {
        let input = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n\x00\x00\x00\x04\x00\x00\x00\x00\x00";
        let (result, written) = run(input, path(), HttpOptions::default()).await;

        let Ok(Served::Upgraded(handoff)) = result else { panic!("expected a handoff") };
        assert!(handoff.is_prior_knowledge());
        assert_eq!(&handoff.buffered[..], &input[..]);
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn http2_request_line_is_handed_over() {
        let input = b"GET / HTTP/2.0\r\nHost: x\r\n\r\n";
        let (result, written) = run(input, path(), HttpOptions::default()).await;

        let Ok(Served::Upgraded(handoff)) = result else { panic!("expected a handoff") };
        assert!(handoff.is_prior_knowledge());
        assert_eq!(&handoff.buffered[..], &input[..]);
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn h2c_upgrade() {
        let input = b"GET /index.html?q=1 HTTP/1.1\r\nHost: localhost\r\nConnection: Upgrade, HTTP2-Settings\r\nUpgrade: h2c\r\nHTTP2-Settings: AAMAAABkAAQAoAAAAAIAAAAA\r\nAccept: */*\r\n\r\nPRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";
        let (result, written) = run(input, path(), HttpOptions::default()).await;

        assert_eq!(written, "HTTP/1.1 101 Switching Protocols\r\nconnection: upgrade\r\nupgrade: h2c\r\n\r\n");

        let Ok(Served::Upgraded(handoff)) = result else { panic!("expected a handoff") };
        assert_eq!(&handoff.buffered[..], PREFACE);
        let HandoffMode::H2c { settings, request } = handoff.mode else { panic!("expected an h2c handoff") };
        assert_eq!(settings.len(), 18);
        assert_eq!(request.pseudo.method, http::Method::GET);
        assert_eq!(request.pseudo.path, "/index.html?q=1");
        assert_eq!(request.pseudo.authority.as_ref().map(http::uri::Authority::as_str), Some("localhost:8080"));
        assert_eq!(request.headers.len(), 2);
        assert!(request.headers.contains_key("accept"));
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn h2c_upgrade_with_chunked_body_and_trailers() {
        let input = b"POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: upgrade, http2-settings\r\nUpgrade: h2c\r\nHTTP2-Settings: AAMAAABkAAQAoAAAAAIAAAAA\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\nx-checksum: 1\r\n\r\n";
        let (result, _) = run(input, path(), HttpOptions::default()).await;

        let Ok(Served::Upgraded(handoff)) = result else { panic!("expected a handoff") };
        let HandoffMode::H2c { request, .. } = handoff.mode else { panic!("expected an h2c handoff") };
        assert_eq!(&request.body[..], b"Wiki");
        assert_eq!(request.headers["x-checksum"], "1");
    }

    #[derive(Default)]
    struct RecordingEngine {
        buffered: Mutex<Option<BytesMut>>,
    }

    impl<R: Send, W: Send> Http2Engine<R, W> for RecordingEngine {
        async fn serve<H>(&self, handoff: Http2Handoff<R, W>, _handler: Arc<H>) -> Result<(), HttpError>
        where
            H: Handler + Send + Sync + 'static,
        {
            *self.buffered.lock().unwrap() = Some(handoff.buffered);
            Ok(())
        }
    }

    #[tokio::test]
    async fn serve_connection_hands_over_to_engine() {
        let (server, _client) = tokio::io::duplex(1024);
        let connection = HttpConnection::new(PREFACE, server);
        let engine = RecordingEngine::default();

        serve_connection(connection, Arc::new(path()), &engine).await.unwrap();

        let buffered = engine.buffered.lock().unwrap().take().unwrap();
        assert_eq!(&buffered[..], PREFACE);
    }
}
