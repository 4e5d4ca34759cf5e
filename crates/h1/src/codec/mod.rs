//! HTTP codec module for encoding and decoding HTTP/1.x messages
//!
//! This module provides functionality for streaming HTTP message processing,
//! including request decoding and response encoding. It uses a state machine
//! pattern to handle both heads and payload data efficiently.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestDecoder`]: Decodes incoming HTTP requests
//!   - Head parsing via the `header` module
//!   - Payload decoding via the `body` module
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: Encodes outgoing HTTP responses
//!   - Head encoding via the `header` module
//!   - Payload encoding via the `body` module
//!
//! # Features
//!
//! - Streaming processing of HTTP messages
//! - Chunked transfer encoding with trailers
//! - Content-Length based payload handling
//! - Header, trailer and body size limits
//! - Detection of the HTTP/2 connection preface

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use header::DecodedHead;
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
