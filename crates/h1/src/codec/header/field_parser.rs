//! Parsing of header and trailer field blocks.
//!
//! A field block is a sequence of `name: value\r\n` lines closed by an empty
//! line. Names are tokens and are stored lower-cased by [`HeaderMap`], values
//! keep their bytes with trailing whitespace removed. Line folding is rejected.
//!
//! Values are sliced out of the block without copying.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use httparse::Status;

use crate::protocol::ParseError;
use crate::utils::ensure;

/// Maximum number of fields accepted in one block
pub(crate) const MAX_HEADER_NUM: usize = 64;

/// Which section a field block belongs to, selecting the reported errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldSection {
    Header,
    Trailer,
}

impl FieldSection {
    fn multiline(self) -> ParseError {
        match self {
            FieldSection::Header => ParseError::MultilineHeader,
            FieldSection::Trailer => ParseError::MultilineTrailer,
        }
    }

    fn invalid<S: ToString>(self, reason: S) -> ParseError {
        match self {
            FieldSection::Header => ParseError::invalid_header(reason),
            FieldSection::Trailer => ParseError::invalid_trailer(reason),
        }
    }
}

/// Appends every field of `block` to `headers`.
///
/// `block` must end with the empty line closing the section.
pub(crate) fn parse_fields(block: &Bytes, section: FieldSection, headers: &mut HeaderMap) -> Result<(), ParseError> {
    ensure!(!is_folded(block), section.multiline());

    let mut fields = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let parsed = httparse::parse_headers(block, &mut fields).map_err(|e| match e {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => section.invalid(e),
    })?;

    let Status::Complete((consumed, fields)) = parsed else {
        return Err(section.invalid("field block is not terminated"));
    };
    ensure!(consumed == block.len(), section.invalid("unexpected bytes after field block"));

    headers.reserve(fields.len());
    for field in fields {
        let name = HeaderName::from_bytes(field.name.as_bytes()).map_err(|e| section.invalid(e))?;
        let value = block.slice_ref(field.value.trim_ascii_end());
        let value = HeaderValue::from_maybe_shared(value).map_err(|e| section.invalid(e))?;
        headers.append(name, value);
    }
    Ok(())
}

/// A field line starting with whitespace continues the previous line.
fn is_folded(block: &[u8]) -> bool {
    matches!(block.first(), Some(b' ' | b'\t')) || block.windows(2).any(|w| w[0] == b'\n' && (w[1] == b' ' || w[1] == b'\t'))
}
