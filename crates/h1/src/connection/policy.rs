//! Keep-alive and body framing decisions for a response.
//!
//! [`ConnectionPolicy::apply`] is computed once per response, before any byte
//! of it is written. It rewrites the framing related headers of the head and
//! reports whether the body is chunked and whether the connection closes
//! after the response.

use std::time::Duration;

use http::header::{CONNECTION, CONTENT_LENGTH, DATE, LINK, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use tracing::warn;

use crate::config::HttpOptions;
use crate::protocol::{PushResources, ResponseHead};

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    /// The body is written with chunked transfer encoding.
    pub chunked: bool,
    /// The connection is closed once the response is written.
    pub should_close: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionPolicy {
    keep_alive_timeout: Duration,
}

impl ConnectionPolicy {
    pub fn new(keep_alive_timeout: Duration) -> Self {
        Self { keep_alive_timeout }
    }

    /// Decides the framing of `head` and rewrites its headers to match.
    ///
    /// `request_connection` are the `Connection` values of the request,
    /// `remaining_requests` is the budget left before this response is counted.
    pub fn apply<'a, I>(
        &self,
        head: &mut ResponseHead,
        version: Version,
        request_connection: I,
        remaining_requests: u64,
        date: HeaderValue,
    ) -> Framing
    where
        I: IntoIterator<Item = &'a HeaderValue>,
    {
        let status = head.status();
        head.headers_mut().insert(DATE, date);

        if status.is_informational() {
            return Framing { chunked: false, should_close: false };
        }

        let links = head.extensions().get::<PushResources>().map(preload_links).unwrap_or_default();
        let headers = head.headers_mut();
        for link in links {
            headers.append(LINK, link);
        }

        let mut should_close = request_connection.into_iter().any(is_close) || headers.get_all(CONNECTION).iter().any(is_close);
        let mut chunked = false;

        if headers.contains_key(CONTENT_LENGTH) {
            headers.remove(TRANSFER_ENCODING);
            should_close |= version == Version::HTTP_10;
        } else if is_bodiless(status) {
            headers.remove(TRANSFER_ENCODING);
        } else if version == Version::HTTP_11 {
            chunked = true;
        } else {
            should_close = true;
        }

        // the last permitted response tells the client not to send more
        if should_close || remaining_requests <= 1 {
            write_close(headers);
            return Framing { chunked: false, should_close: true };
        }

        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        let timeout = self.keep_alive_timeout.as_secs();
        let keep_alive = if remaining_requests == HttpOptions::UNBOUNDED_REQUESTS {
            format!("timeout={timeout}")
        } else {
            format!("timeout={timeout}, max={}", remaining_requests - 1)
        };
        // formatted from digits only, always a valid value
        if let Ok(value) = HeaderValue::try_from(keep_alive) {
            headers.insert(KEEP_ALIVE, value);
        }

        if chunked {
            headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        }

        Framing { chunked, should_close: false }
    }
}

/// Statuses that never carry a body.
pub(crate) fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

// a closing response is delimited by the close itself when it has no length
fn write_close(headers: &mut HeaderMap) {
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.remove(KEEP_ALIVE);
    headers.remove(TRANSFER_ENCODING);
}

fn is_close(value: &HeaderValue) -> bool {
    value.as_bytes().split(|b| *b == b',').any(|token| token.trim_ascii().eq_ignore_ascii_case(b"close"))
}

fn preload_links(push: &PushResources) -> Vec<HeaderValue> {
    push.iter()
        .filter_map(|(url, _)| match HeaderValue::try_from(format!("<{url}>; rel=preload")) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url, cause = %e, "skip push resource with invalid url");
                None
            }
        })
        .collect()
}
