//! Echoes every request body back, run with `cargo run --example echo_server`.
//!
//! `curl -v --data-binary @Cargo.toml http://127.0.0.1:8080/echo` shows the
//! keep-alive headers, `curl --http2 http://127.0.0.1:8080/` shows the h2c
//! handover, which this server answers by closing the connection.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use micro_h1::connection::{Http2Engine, Http2Handoff, HandoffMode, HttpConnection, serve_connection};
use micro_h1::handler::{Handler, make_handler};
use micro_h1::protocol::body::ReqBody;
use micro_h1::protocol::{HttpError, ParseError};
use micro_h1::{ConnectionInfo, HttpOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const PORT: u16 = 8080;

/// Stands in for an HTTP/2 implementation: logs what it was handed and closes.
struct ClosingEngine;

impl<R, W> Http2Engine<R, W> for ClosingEngine
where
    R: Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    async fn serve<H>(&self, mut handoff: Http2Handoff<R, W>, _handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + Send + Sync + 'static,
    {
        match &handoff.mode {
            HandoffMode::PriorKnowledge => warn!(buffered = handoff.buffered.len(), "http/2 prior knowledge is not served"),
            HandoffMode::H2c { settings, request } => {
                warn!(settings = settings.len(), path = %request.pseudo.path, "h2c upgrade is not served")
            }
        }
        handoff.writer.shutdown().await.map_err(HttpError::upgrade)
    }
}

async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, ParseError> {
    info!(method = %request.method(), uri = %request.uri(), "receive request");

    // uploads up to 1 MiB are accepted on this path
    if request.uri().path() == "/upload" {
        request.body().raise_max_body_size(1024 * 1024);
    }

    let content_type = request.headers().get(CONTENT_TYPE).cloned();
    let body = request.into_body().collect().await?.to_bytes();
    info!(len = body.len(), "receiving request body");

    let mut response = Response::new(Full::new(body));
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = PORT, "start listening");
    let tcp_listener = match TcpListener::bind(("127.0.0.1", PORT)).await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let options = Arc::new(HttpOptions::builder().max_requests_per_connection(100).build());
    let handler = Arc::new(make_handler(echo));
    let engine = Arc::new(ClosingEngine);

    loop {
        let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let handler = handler.clone();
        let options = options.clone();
        let engine = engine.clone();

        tokio::spawn(async move {
            let local_port = tcp_stream.local_addr().ok().map(|addr| addr.port());
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::with_options(reader, writer, options, ConnectionInfo::new(local_port, false));
            match serve_connection(connection, handler, engine.as_ref()).await {
                Ok(()) => info!("finished process, connection shutdown"),
                Err(e) => error!("service has error, cause {}, connection shutdown", e),
            }
        });
    }
}
