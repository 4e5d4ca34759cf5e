//! The application side of a connection.
//!
//! A [`Handler`] turns one request into one response. The request body is
//! streamed while the handler runs, so a handler may start answering before
//! the whole body has arrived.
//!
//! Closures are turned into handlers with [`make_handler`]:
//!
//! ```
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::body::ReqBody;
//! use http::{Request, Response};
//! use http_body_util::Full;
//! use bytes::Bytes;
//! use std::convert::Infallible;
//!
//! let handler = make_handler(|_req: Request<ReqBody>| async {
//!     Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"hello"))))
//! });
//! # let _ = handler;
//! ```

use std::error::Error;
use std::future::Future;

use http::{Request, Response};
use http_body::Body;

use crate::protocol::body::ReqBody;

#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    type RespBody: Body;
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<Self::RespBody>, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<RespBody, Err, F, Fut> Handler for HandlerFn<F>
where
    RespBody: Body,
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<RespBody>, Err>> + Send,
{
    type RespBody = RespBody;
    type Error = Err;

    fn call(&self, req: Request<ReqBody>) -> impl Future<Output = Result<Response<Self::RespBody>, Self::Error>> + Send {
        (self.f)(req)
    }
}

pub fn make_handler<F, RespBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    RespBody: Body,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<RespBody>, Err>>,
    F: Fn(Request<ReqBody>) -> Ret,
{
    HandlerFn { f }
}
