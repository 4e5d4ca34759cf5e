//! HTTP body handling module for processing request and response payloads
//!
//! # Components
//!
//! ## Decoders
//! - `ChunkedDecoder`: chunked transfer encoded request bodies, trailers included
//! - `LengthDecoder`: request bodies of a declared `Content-Length`
//! - [`PayloadDecoder`]: selects one of the above from the request framing
//!
//! ## Encoders
//! - `ChunkedEncoder`: chunked transfer encoding, trailers included
//! - `LengthEncoder`: response bodies of a declared `Content-Length`
//! - [`PayloadEncoder`]: selects the framing of a response body, including
//!   close-delimited bodies and bodies that are not sent at all
//!
//! Decoders enforce the body size limit of the request and hand out the body
//! in segments of at most `io_granularity` bytes.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
