//! Utility macros and functions for the HTTP/1 engine.
//!
//! This module provides helper macros and small byte helpers that are used
//! internally by the codec and connection layers.

pub(crate) mod base64;

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's useful for validation checks where you want to return early with an error
/// if some condition is not satisfied.
///
/// # Example
///
/// ```ignore
/// ensure!(headers.len() < MAX_HEADERS, ParseError::too_many_headers(MAX_HEADERS));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Returns the index of the first `\r\n` in `haystack`.
#[inline]
pub(crate) fn find_crlf(haystack: &[u8]) -> Option<usize> {
    find_subslice(haystack, b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subslice() {
        assert_eq!(find_subslice(b"abc\r\n\r\n", b"\r\n\r\n"), Some(3));
        assert_eq!(find_subslice(b"abc\r\n\r", b"\r\n\r\n"), None);
        assert_eq!(find_subslice(b"", b"\r\n"), None);
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"12\r"), None);
    }
}
