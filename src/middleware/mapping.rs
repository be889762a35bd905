//! Attribute-mapping stage: lets the matched handler map the request body
//! onto its `MapTo` argument before user middleware runs.

use std::sync::Arc;

use super::{Middleware, Next, ready};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

pub(crate) struct AttributeMapping;

impl Middleware for AttributeMapping {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        let Some(handler) = req.route.as_ref().map(|r| Arc::clone(&r.handler)) else {
            return ready(Err(Error::MissingRoute));
        };
        if let Err(e) = handler.prepare(&mut req) {
            return ready(Err(e));
        }
        next.run(req)
    }
}
