//! HTTP request header handling implementation.
//!
//! This module provides the core abstractions for handling HTTP request headers.
//! It wraps the standard `http::Request` type to provide additional functionality
//! specific to the HTTP/1 engine.

use http::header::EXPECT;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// The request target exactly as it appeared in the request line.
///
/// The parsed [`Uri`] is always absolute, resolved against the `Host` header,
/// so handlers that need the original form (`*`, origin-form, absolute-form)
/// read it from this request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget(String);

impl RequestTarget {
    pub(crate) fn new(target: String) -> Self {
        Self(target)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the asterisk-form target `*`.
    pub fn is_asterisk(&self) -> bool {
        self.0 == "*"
    }
}

/// Represents an HTTP request header.
///
/// This struct wraps a `http::Request<()>` to provide:
/// - Access to standard HTTP header fields
/// - Body attachment capabilities
/// - Request metadata inspection
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this header, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|_| body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns a mutable reference to the request's headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Returns the raw request target, if the header came from the decoder.
    pub fn target(&self) -> Option<&RequestTarget> {
        self.inner.extensions().get::<RequestTarget>()
    }

    /// Returns true if the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.headers()
            .get(EXPECT)
            .is_some_and(|value| value.as_bytes().len() >= 4 && value.as_bytes()[..4].eq_ignore_ascii_case(b"100-"))
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
