//! HTTP header encoder implementation for serializing HTTP response heads
//!
//! This module writes the status line and the header fields of a response.
//! Framing headers (`content-length`, `transfer-encoding`, `connection`) are
//! decided by the connection policy before the head reaches the encoder, so
//! the fields are written exactly as they are in the [`ResponseHead`].

use crate::protocol::{ReasonPhrase, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::Version;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<ResponseHead> for HeaderEncoder {
    type Error = SendError;

    /// Encodes the status line and header fields into the provided bytes buffer.
    ///
    /// The reason phrase is taken from the [`ReasonPhrase`] extension, or else
    /// is the canonical reason of the status, or else empty.
    fn encode(&mut self, header: ResponseHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let version = match header.version() {
            Version::HTTP_11 => "1.1",
            Version::HTTP_10 => "1.0",
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(SendError::invalid_head(format!("unsupported http version {v:?}")));
            }
        };

        let reason = match header.extensions().get::<ReasonPhrase>() {
            Some(reason) => reason.as_str(),
            None => header.status().canonical_reason().unwrap_or(""),
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/{} {} {}\r\n", version, header.status().as_str(), reason)?;

        for (header_name, header_value) in header.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Response, StatusCode};

    fn encode(head: ResponseHead) -> Result<String, SendError> {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(head, &mut dst)?;
        Ok(String::from_utf8(dst.to_vec()).unwrap())
    }

    #[test]
    fn status_line_and_fields() {
        let head = Response::builder()
            .status(StatusCode::OK)
            .header("Content-Length", "5")
            .header("X-Foo", "a")
            .header("x-foo", "b")
            .body(())
            .unwrap();

        assert_eq!(encode(head).unwrap(), "HTTP/1.1 200 OK\r\ncontent-length: 5\r\nx-foo: a\r\nx-foo: b\r\n\r\n");
    }

    #[test]
    fn http_10_status_line() {
        let head = Response::builder().version(Version::HTTP_10).status(StatusCode::NOT_FOUND).body(()).unwrap();
        assert_eq!(encode(head).unwrap(), "HTTP/1.0 404 Not Found\r\n\r\n");
    }

    #[test]
    fn reason_phrase() {
        let head = Response::builder().status(299).body(()).unwrap();
        assert_eq!(encode(head).unwrap(), "HTTP/1.1 299 \r\n\r\n");

        let head = Response::builder().status(200).extension(ReasonPhrase::new("Fine")).body(()).unwrap();
        assert_eq!(encode(head).unwrap(), "HTTP/1.1 200 Fine\r\n\r\n");
    }

    #[test]
    fn reject_http2_head() {
        let head = Response::builder().version(Version::HTTP_2).body(()).unwrap();
        assert!(matches!(encode(head), Err(SendError::InvalidHead { .. })));
    }
}
