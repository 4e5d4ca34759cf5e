//! Request line parsing and request target resolution.
//!
//! A request line is `METHOD SP TARGET SP HTTP/VERSION` with exactly one space
//! between the parts. The method is alphabetic, the target has no whitespace
//! and the version is `HTTP/` (any case) followed by digits with an optional
//! minor version. HTTP/1.0 and HTTP/1.1 are served here and HTTP/2.0 is
//! recognised for the handoff to HTTP/2, any other well formed version is
//! rejected as unsupported.

use http::uri::Authority;
use http::{Method, Uri, Version};

use crate::config::ConnectionInfo;
use crate::protocol::ParseError;
use crate::utils::ensure;

/// The connection preface line of HTTP/2 with prior knowledge.
pub(crate) const HTTP2_PREFACE_LINE: &[u8] = b"PRI * HTTP/2.0\r\n";

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RequestLine<'a> {
    pub(crate) method: &'a [u8],
    pub(crate) target: &'a str,
    pub(crate) version: Version,
}

impl<'a> RequestLine<'a> {
    /// Parses a request line without its CRLF.
    pub(crate) fn parse(line: &'a [u8]) -> Result<Self, ParseError> {
        let (method, rest) = split_at_space(line).ok_or_else(|| ParseError::invalid_request_line("missing request target"))?;
        ensure!(
            !method.is_empty() && method.iter().all(u8::is_ascii_alphabetic),
            ParseError::invalid_request_line("method must be alphabetic")
        );

        let (target, version) = split_at_space(rest).ok_or_else(|| ParseError::invalid_request_line("missing http version"))?;
        ensure!(
            !target.is_empty() && !target.iter().any(u8::is_ascii_whitespace),
            ParseError::invalid_request_line("malformed request target")
        );
        let target = std::str::from_utf8(target).map_err(|_| ParseError::invalid_uri("request target is not utf-8"))?;

        Ok(Self { method, target, version: parse_version(version)? })
    }

    /// The method token, upper-cased first when `normalize_case` is set.
    pub(crate) fn method(&self, normalize_case: bool) -> Result<Method, ParseError> {
        let method = if normalize_case && self.method.iter().any(u8::is_ascii_lowercase) {
            Method::from_bytes(&self.method.to_ascii_uppercase())
        } else {
            Method::from_bytes(self.method)
        };
        method.map_err(|e| ParseError::invalid_request_line(e.to_string()))
    }
}

fn split_at_space(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let position = bytes.iter().position(|&b| b == b' ')?;
    Some((&bytes[..position], &bytes[position + 1..]))
}

fn parse_version(version: &[u8]) -> Result<Version, ParseError> {
    const PREFIX: &[u8] = b"HTTP/";
    ensure!(
        version.len() > PREFIX.len() && version[..PREFIX.len()].eq_ignore_ascii_case(PREFIX),
        ParseError::invalid_request_line("malformed http version")
    );

    let number = &version[PREFIX.len()..];
    let well_formed = match number.iter().position(|&b| b == b'.') {
        Some(dot) => is_digits(&number[..dot]) && is_digits(&number[dot + 1..]),
        None => is_digits(number),
    };
    ensure!(well_formed, ParseError::invalid_request_line("malformed http version"));

    match number {
        b"1.1" => Ok(Version::HTTP_11),
        b"1.0" => Ok(Version::HTTP_10),
        b"2.0" => Ok(Version::HTTP_2),
        other => Err(ParseError::unsupported_version(String::from_utf8_lossy(other))),
    }
}

fn is_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

/// Resolves a request target into an absolute [`Uri`].
///
/// - `*` becomes the authority of the connection with path `*`
/// - `http://` and `https://` targets are taken as they are
/// - anything else is an origin-form path resolved against `host`
///
/// A `host` without port gets the local port of the connection appended.
pub(crate) fn resolve_target(target: &str, host: &str, info: &ConnectionInfo) -> Result<Uri, ParseError> {
    if is_absolute_form(target) {
        return target.parse::<Uri>().map_err(|e| ParseError::invalid_uri(e.to_string()));
    }

    let authority = host.parse::<Authority>().map_err(|e| ParseError::invalid_uri(e.to_string()))?;
    let authority = match (authority.port_u16(), info.local_port) {
        (None, Some(port)) => format!("{authority}:{port}")
            .parse::<Authority>()
            .map_err(|e| ParseError::invalid_uri(e.to_string()))?,
        _ => authority,
    };

    ensure!(target == "*" || target.starts_with('/'), ParseError::invalid_uri("origin-form target must start with '/'"));
    Uri::builder()
        .scheme(info.scheme())
        .authority(authority)
        .path_and_query(target)
        .build()
        .map_err(|e| ParseError::invalid_uri(e.to_string()))
}

fn is_absolute_form(target: &str) -> bool {
    let bytes = target.as_bytes();
    let has_prefix = |prefix: &[u8]| bytes.len() > prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix);
    has_prefix(b"http://") || has_prefix(b"https://")
}
