//! Handler-execution stage. Always last; never calls `next`.

use std::sync::Arc;

use super::{Middleware, Next, ready};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

pub(crate) struct Dispatch;

impl Middleware for Dispatch {
    fn handle(&self, req: Request, _next: Next) -> BoxFuture<Result<Response, Error>> {
        match req.route.as_ref().map(|r| Arc::clone(&r.handler)) {
            Some(handler) => handler.call(req),
            None => ready(Err(Error::MissingRoute)),
        }
    }
}
