//! HTTP response header handling implementation.
//!
//! This module provides type definitions for HTTP response headers, and the
//! response extensions the writer understands.

use std::borrow::Cow;

use http::{HeaderMap, Response};

/// Type alias for HTTP response headers.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder. The actual response
/// body can be attached later using the response builder pattern.
pub type ResponseHead = Response<()>;

/// Overrides the reason phrase written in the status line.
///
/// Without this extension the canonical reason of the status code is used,
/// or an empty reason for codes that have none.
///
/// ```
/// use http::Response;
/// use micro_h1::protocol::ReasonPhrase;
///
/// let response = Response::builder().status(299).extension(ReasonPhrase::new("Fine")).body(()).unwrap();
/// assert_eq!(response.extensions().get::<ReasonPhrase>().unwrap().as_str(), "Fine");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(Cow<'static, str>);

impl ReasonPhrase {
    pub fn new<S: Into<Cow<'static, str>>>(reason: S) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resources the client should fetch alongside the response.
///
/// HTTP/1.x cannot push, so each resource becomes a
/// `link: <url>; rel=preload` header on the response.
#[derive(Debug, Clone, Default)]
pub struct PushResources {
    resources: Vec<(String, HeaderMap)>,
}

impl PushResources {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push<S: Into<String>>(mut self, url: S, headers: HeaderMap) -> Self {
        self.resources.push((url.into(), headers));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderMap)> {
        self.resources.iter().map(|(url, headers)| (url.as_str(), headers))
    }
}
