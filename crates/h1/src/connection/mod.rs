//! HTTP connection handling module
//!
//! This module drives one HTTP/1.x connection from the first request byte to
//! the close, or to the handover to an HTTP/2 engine.
//!
//! # Components
//!
//! - [`HttpConnection`]: Main connection handler that:
//!   - Processes incoming requests one at a time
//!   - Streams request bodies to the handler with backpressure
//!   - Implements expect-continue handling
//!   - Detects h2c upgrades and the HTTP/2 connection preface
//! - [`ResponseWriter`]: frames and buffers responses
//! - [`ConnectionPolicy`]: keep-alive and framing decision per response
//! - [`ConnectionState`]: request budget and write side status
//! - [`Http2Engine`]: the contract an HTTP/2 implementation takes a connection over with

mod http_connection;
mod policy;
mod response_writer;
mod state;
mod upgrade;

pub use http_connection::{HttpConnection, serve_connection};
pub use policy::{ConnectionPolicy, Framing};
pub use response_writer::{ResponseContext, ResponseWriter, build_error_response};
pub use state::ConnectionState;
pub use upgrade::{HandoffMode, Http2Engine, Http2Handoff, LocalHttp2Engine, PseudoHeaders, Served, UpgradedRequest};
