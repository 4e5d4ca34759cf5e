//! HTTP request body handling implementation.
//!
//! The body of a request is streamed from the connection to the handler
//! through a bounded channel:
//!
//! - [`ReqBody`]: the consumer side, implementing `http_body::Body`
//! - `BodySender`: the producer side, pumping decoded payload items out of the
//!   connection's frame stream into the channel
//!
//! The channel capacity gives backpressure: when the handler stops reading,
//! the sender stops reading the socket. Once the handler gives the body up,
//! the sender keeps draining the payload so the next request on a keep-alive
//! connection starts at the right byte.
//!
//! [`BodyLimit`] is shared between the body and the payload decoder, so a
//! handler can raise the maximum body size of the request it is reading.

mod body_channel;
mod limit;
mod req_body;

pub(crate) use body_channel::BodySender;
pub use limit::BodyLimit;
pub use req_body::ReqBody;
