use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::protocol::ParseError;
use crate::utils::{ensure, find_subslice};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Finds the end of a request head in the read buffer.
///
/// The head is everything up to and including the first empty line. Bytes
/// before the terminating empty line count against the header size limit,
/// and the limit is enforced identically however the bytes were split across
/// reads.
///
/// A head that arrives in many reads is not searched from its start again:
/// the scanner resumes where the previous search stopped.
#[derive(Debug, Clone)]
pub(crate) struct HeadScanner {
    max_header_size: usize,
    resume_at: usize,
}

impl HeadScanner {
    pub(crate) fn new(max_header_size: usize) -> Self {
        Self { max_header_size, resume_at: 0 }
    }

    /// Returns the length of the complete head, terminator included, or `None`
    /// if the terminator has not arrived yet.
    ///
    /// Empty lines in front of a request are discarded from `src`. Until a head
    /// is found `src` must only grow, the bytes already searched stay in place.
    pub(crate) fn scan(&mut self, src: &mut BytesMut) -> Result<Option<usize>, ParseError> {
        if self.resume_at == 0 {
            let leading = src.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
            if leading > 0 {
                trace!(leading, "skip empty lines before request");
                src.advance(leading);
            }
        }

        let resume_at = self.resume_at.min(src.len());
        match find_subslice(&src[resume_at..], HEAD_TERMINATOR).map(|position| position + resume_at) {
            Some(position) => {
                self.resume_at = 0;
                let head_size = position + 2;
                ensure!(head_size <= self.max_header_size, ParseError::too_large_header(head_size, self.max_header_size));
                Ok(Some(position + HEAD_TERMINATOR.len()))
            }
            None => {
                // the terminator can start no earlier than three bytes from the end
                self.resume_at = src.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
                let least_head_size = src.len().saturating_sub(1);
                ensure!(
                    least_head_size <= self.max_header_size,
                    ParseError::too_large_header(least_head_size, self.max_header_size)
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &[u8] = b"GET / HTTP/1.1\r\nA: b\r\n\r\n";

    fn scan_in_pieces(mut scanner: HeadScanner, input: &[u8], split: usize) -> Result<Option<usize>, ParseError> {
        let mut buf = BytesMut::from(&input[..split]);
        if let Some(length) = scanner.scan(&mut buf)? {
            return Ok(Some(length));
        }
        buf.extend_from_slice(&input[split..]);
        scanner.scan(&mut buf)
    }

    #[test]
    fn find_head() {
        let mut scanner = HeadScanner::new(1024);
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody"[..]);
        assert_eq!(scanner.scan(&mut buf).unwrap(), Some(27));
        assert_eq!(buf.len(), 31);
    }

    #[test]
    fn need_more_data() {
        let mut scanner = HeadScanner::new(1024);
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r"[..]);
        assert_eq!(scanner.scan(&mut buf).unwrap(), None);
    }

    #[test]
    fn skip_leading_empty_lines() {
        let mut scanner = HeadScanner::new(1024);
        let mut buf = BytesMut::from(&b"\r\n\r\n\nGET / HTTP/1.1\r\n\r\n"[..]);
        assert_eq!(scanner.scan(&mut buf).unwrap(), Some(18));
        assert!(buf.starts_with(b"GET"));

        let mut buf = BytesMut::from(&b"\r\n\r\n"[..]);
        assert_eq!(scanner.scan(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn limit_is_independent_of_fragmentation() {
        // 22 bytes of start line and fields before the empty line
        for split in 0..=HEAD.len() {
            assert_eq!(scan_in_pieces(HeadScanner::new(22), HEAD, split).unwrap(), Some(HEAD.len()), "split at {split}");
            let result = scan_in_pieces(HeadScanner::new(21), HEAD, split);
            assert!(matches!(result, Err(ParseError::TooLargeHeader { max_size: 21, .. })), "split at {split}");
        }
    }

    #[test]
    fn resume_where_the_last_scan_stopped() {
        let mut scanner = HeadScanner::new(1024);
        let mut buf = BytesMut::new();

        for (i, &byte) in HEAD.iter().enumerate() {
            buf.extend_from_slice(&[byte]);
            let result = scanner.scan(&mut buf).unwrap();
            if i + 1 < HEAD.len() {
                assert_eq!(result, None);
                assert_eq!(scanner.resume_at, buf.len().saturating_sub(3));
            } else {
                assert_eq!(result, Some(HEAD.len()));
            }
        }
        assert_eq!(scanner.resume_at, 0);

        // the next head is searched from its start
        let mut next = BytesMut::from(&b"\r\nGET /b HTTP/1.1\r\n\r\n"[..]);
        assert_eq!(scanner.scan(&mut next).unwrap(), Some(19));
    }

    #[test]
    fn unterminated_head_too_large() {
        let mut scanner = HeadScanner::new(16);
        let mut buf = BytesMut::from(&b"GET /aaaaaaaaaaaaaaaaaaaaaaaa"[..]);
        assert!(matches!(scanner.scan(&mut buf), Err(ParseError::TooLargeHeader { .. })));
    }
}
