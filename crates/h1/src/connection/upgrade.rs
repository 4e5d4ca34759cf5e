//! Handing a connection over to an HTTP/2 engine.
//!
//! Two ways lead to HTTP/2 on a cleartext connection: an `Upgrade: h2c`
//! request, answered with `101 Switching Protocols`, or a client starting
//! with the HTTP/2 connection preface right away. Either way the HTTP/1.x
//! driver stops and gives the transport, the bytes it has read but not
//! consumed, and the connection state to an [`Http2Engine`].

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::header::{CONNECTION, UPGRADE};
use http::uri::{Authority, Scheme};
use http::{HeaderMap, HeaderName, Method, Uri, Version};

use super::state::ConnectionState;
use crate::handler::Handler;
use crate::protocol::{HttpError, RequestHeader};
use crate::utils::base64;

const HTTP2_SETTINGS: HeaderName = HeaderName::from_static("http2-settings");

/// Returns the decoded `HTTP2-Settings` payload if the request asks for an h2c upgrade.
pub(crate) fn negotiate_h2c(header: &RequestHeader) -> Option<Bytes> {
    if header.version() != Version::HTTP_11 {
        return None;
    }

    let headers = header.headers();
    let upgrade = headers.get(UPGRADE)?;
    let connection = headers.get(CONNECTION)?;
    let settings = headers.get(HTTP2_SETTINGS)?;

    if !upgrade.as_bytes().trim_ascii().eq_ignore_ascii_case(b"h2c") {
        return None;
    }

    let connection = connection.as_bytes().to_ascii_lowercase();
    if !connection.windows(b"upgrade".len()).any(|window| window == b"upgrade") {
        return None;
    }

    base64::decode_url_safe(settings.as_bytes().trim_ascii()).map(Bytes::from)
}

/// The HTTP/2 pseudo header fields of an upgraded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoHeaders {
    pub method: Method,
    pub scheme: Option<Scheme>,
    pub authority: Option<Authority>,
    /// The request target exactly as the client sent it.
    pub path: String,
}

/// The request that carried an h2c upgrade, answered as HTTP/2 stream 1.
#[derive(Debug)]
pub struct UpgradedRequest {
    pub pseudo: PseudoHeaders,
    /// Request headers without `upgrade`, `connection` and `http2-settings`, trailers merged in.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpgradedRequest {
    pub(crate) fn new(method: Method, uri: &Uri, target: String, mut headers: HeaderMap, body: Bytes) -> Self {
        headers.remove(UPGRADE);
        headers.remove(CONNECTION);
        headers.remove(HTTP2_SETTINGS);

        let pseudo = PseudoHeaders { method, scheme: uri.scheme().cloned(), authority: uri.authority().cloned(), path: target };
        Self { pseudo, headers, body }
    }
}

#[derive(Debug)]
pub enum HandoffMode {
    /// The client started with the connection preface, which is still in the buffered bytes.
    PriorKnowledge,
    /// The client upgraded with `Upgrade: h2c`, the 101 response is already written.
    H2c { settings: Bytes, request: UpgradedRequest },
}

/// Everything an HTTP/2 engine needs to take a connection over.
///
/// `buffered` holds the bytes read from `reader` that the HTTP/1.x driver has
/// not consumed, the engine must process them before reading any more.
#[derive(Debug)]
pub struct Http2Handoff<R, W> {
    pub reader: R,
    pub writer: W,
    pub buffered: BytesMut,
    pub state: ConnectionState,
    pub mode: HandoffMode,
}

impl<R, W> Http2Handoff<R, W> {
    pub fn is_prior_knowledge(&self) -> bool {
        matches!(self.mode, HandoffMode::PriorKnowledge)
    }
}

/// How an HTTP/1.x connection ended.
#[derive(Debug)]
pub enum Served<R, W> {
    Closed,
    Upgraded(Http2Handoff<R, W>),
}

/// An HTTP/2 protocol engine taking over upgraded connections.
#[trait_variant::make(Http2Engine: Send)]
pub trait LocalHttp2Engine<R, W> {
    async fn serve<H>(&self, handoff: Http2Handoff<R, W>, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + Send + Sync + 'static;
}
