//! HTTP header processing module for encoding and decoding heads
//!
//! # Components
//!
//! - [`HeaderDecoder`]: Decodes request heads from raw bytes
//!   - finds the head and enforces the header size limit
//!   - parses the request line and the header fields
//!   - picks the body framing and resolves the request URI
//!   - recognises the HTTP/2 connection preface
//!
//! - [`HeaderEncoder`]: Encodes response heads to bytes
//!
//! The field parser is shared with the chunked body decoder, which reads
//! trailer sections with it.

mod field_parser;
mod head_scanner;
mod header_decoder;
mod header_encoder;
mod request_line;

pub(crate) use field_parser::{FieldSection, parse_fields};
pub use header_decoder::{DecodedHead, HeaderDecoder};
pub use header_encoder::HeaderEncoder;
