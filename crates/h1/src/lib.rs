//! An asynchronous HTTP/1.x protocol engine
//!
//! This crate turns an arbitrarily fragmented byte stream into requests and
//! writes responses back with the right framing. It is built on top of tokio
//! and leaves sockets, routing and HTTP/2 framing to its callers.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 with keep-alive and a per connection request budget
//! - Resumable parsing that tolerates partial reads at any byte offset
//! - Header, trailer and body size limits enforced before buffering
//! - Content-Length and chunked request bodies, chunked trailers included
//! - Request bodies streamed to the handler with backpressure
//! - Chunked, fixed length and close delimited responses
//! - Expect-continue mechanism
//! - h2c upgrade and prior knowledge handover to an HTTP/2 engine
//!
//! # Example
//!
//! ```no_run
//! use http::{Request, Response};
//! use http_body_util::{BodyExt, Full};
//! use bytes::Bytes;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use micro_h1::connection::{HttpConnection, Served};
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::body::ReqBody;
//! use micro_h1::protocol::ParseError;
//! use micro_h1::{ConnectionInfo, HttpOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let options = Arc::new(HttpOptions::builder().max_body_size(1024 * 1024).build());
//!     let handler = Arc::new(make_handler(echo));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         let options = options.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::with_options(reader, writer, options, ConnectionInfo::new(Some(8080), false));
//!             match connection.process(handler).await {
//!                 Ok(Served::Closed) => info!("finished process, connection shutdown"),
//!                 Ok(Served::Upgraded(_)) => warn!("no http/2 engine, drop the connection"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, ParseError> {
//!     let body = request.into_body().collect().await?.to_bytes();
//!     Ok(Response::new(Full::new(body)))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: byte level decoders and encoders driven by `tokio_util::codec`
//! - [`protocol`]: message types, errors and the request body channel
//! - [`connection`]: the per connection driver, response writer and keep-alive policy
//! - [`handler`]: request handler traits and utilities
//! - [`config`]: [`HttpOptions`] and [`ConnectionInfo`]
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: a malformed or oversized request, each maps onto the status answered with
//! - [`protocol::SendError`]: a response that could not be written
//! - [`protocol::HttpError`]: what a connection finally resolves to
//!
//! A request side error ends the connection after a best effort error
//! response, no attempt is made to resynchronize a malformed stream.

pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;

pub use config::{ConnectionInfo, HttpOptions};
