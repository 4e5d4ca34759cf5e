use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use http::HeaderMap;
use std::io::Write;

use tokio_util::codec::Encoder;

/// Frames body data as `size-in-hex CRLF data CRLF` chunks.
///
/// Trailers given before EOF are written between the last chunk and the
/// final empty line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    trailers: Option<HeaderMap>,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                // an empty chunk would end the body
                if !bytes.has_remaining() {
                    return Ok(());
                }
                write!(helper::Writer(dst), "{:x}\r\n", bytes.remaining())?;
                dst.reserve(bytes.remaining() + 2);
                dst.put(bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Trailers(trailers) => {
                self.trailers.get_or_insert_with(HeaderMap::new).extend(trailers);
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n");
                if let Some(trailers) = self.trailers.take() {
                    for (name, value) in &trailers {
                        dst.extend_from_slice(name.as_ref());
                        dst.extend_from_slice(b": ");
                        dst.extend_from_slice(value.as_bytes());
                        dst.extend_from_slice(b"\r\n");
                    }
                }
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
