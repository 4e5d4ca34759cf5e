//! Error types for the HTTP/1 engine.
//!
//! Request side failures are [`ParseError`]s. Each of them maps onto the HTTP
//! status the driver answers with before it tears the connection down, see
//! [`ParseError::status_code`]. Response side failures are [`SendError`]s, and
//! [`HttpError`] is what a connection finally resolves to.

use http::StatusCode;
use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("upgrade error: {reason}")]
    UpgradeError { reason: String },
}

impl HttpError {
    pub fn upgrade<S: ToString>(str: S) -> Self {
        Self::UpgradeError { reason: str.to_string() }
    }
}

/// Errors raised while decoding a request.
///
/// The error is cloneable because the same failure is reported twice: once
/// into the request body stream, and once to the connection driver.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("unsupported http version: {version}")]
    UnsupportedVersion { version: String },

    #[error("multi-line headers are not supported")]
    MultilineHeader,

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported transfer-encoding: {value}")]
    UnsupportedTransferEncoding { value: String },

    #[error("invalid host header")]
    InvalidHost,

    #[error("invalid request target: {reason}")]
    InvalidUri { reason: String },

    #[error("invalid chunk size line: {reason}")]
    InvalidChunkSizeLine { reason: String },

    #[error("invalid hex chunk size: {value}")]
    InvalidHexChunkSize { value: String },

    #[error("chunk data is not terminated by CRLF")]
    InvalidChunkTerminator,

    #[error("trailer size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeTrailer { current_size: usize, max_size: usize },

    #[error("multi-line trailers are not supported")]
    MultilineTrailer,

    #[error("invalid trailer: {reason}")]
    InvalidTrailer { reason: String },

    #[error("payload too large, exceed the limit {max_size}")]
    TooLargePayload { max_size: u64 },

    #[error("client disconnected")]
    ClientDisconnected,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io { source: Arc<io::Error> },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(version: S) -> Self {
        Self::UnsupportedVersion { version: version.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(value: S) -> Self {
        Self::UnsupportedTransferEncoding { value: value.to_string() }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }

    pub fn invalid_chunk_size_line<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSizeLine { reason: str.to_string() }
    }

    pub fn invalid_hex_chunk_size<S: ToString>(value: S) -> Self {
        Self::InvalidHexChunkSize { value: value.to_string() }
    }

    pub fn too_large_trailer(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeTrailer { current_size, max_size }
    }

    pub fn invalid_trailer<S: ToString>(str: S) -> Self {
        Self::InvalidTrailer { reason: str.to_string() }
    }

    pub fn too_large_payload(max_size: u64) -> Self {
        Self::TooLargePayload { max_size }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: Arc::new(e.into()) }
    }

    /// The status code of the response sent to the client before closing.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TooLargeHeader { .. } | Self::TooManyHeaders { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::UnsupportedVersion { .. } => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            Self::TooLargePayload { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ClientDisconnected => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::io(e)
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid response head: {reason}")]
    InvalidHead { reason: String },

    #[error("the write side of the connection is closed")]
    WriteClosed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_head<S: ToString>(str: S) -> Self {
        Self::InvalidHead { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ParseError::too_large_header(40, 32).status_code(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
        assert_eq!(ParseError::too_many_headers(64).status_code(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
        assert_eq!(ParseError::unsupported_version("3.0").status_code(), StatusCode::HTTP_VERSION_NOT_SUPPORTED);
        assert_eq!(ParseError::too_large_payload(10).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ParseError::ClientDisconnected.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(ParseError::MultilineHeader.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ParseError::InvalidHost.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ParseError::invalid_chunk_size_line("chunk size too long").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ParseError::invalid_hex_chunk_size("zz").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ParseError::too_large_trailer(40, 32).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_error_is_cloneable() {
        let error = ParseError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        let cloned = error.clone();
        assert_eq!(error.to_string(), cloned.to_string());
    }
}
