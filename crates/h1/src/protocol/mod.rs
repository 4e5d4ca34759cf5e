//! Core HTTP protocol abstractions.
//!
//! This module provides the fundamental building blocks shared by the codec and
//! connection layers:
//!
//! - **Message Handling** ([`message`]): [`Message`], [`PayloadItem`] and [`PayloadSize`]
//! - **Request Processing** ([`request`]): [`RequestHeader`] and the raw [`RequestTarget`]
//! - **Response Processing** ([`response`]): [`ResponseHead`] plus the [`ReasonPhrase`]
//!   and [`PushResources`] response extensions
//! - **Body Streaming** ([`body`]): [`body::ReqBody`] implementing `http_body::Body`
//! - **Error Handling** ([`error`]): [`HttpError`], [`ParseError`] and [`SendError`]
//! - **Date** ([`date`]): the cached `Date` header value

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;
pub use request::RequestTarget;

mod response;
pub use response::PushResources;
pub use response::ReasonPhrase;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
pub mod date;
