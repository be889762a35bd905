//! Routing stage: matches the request and attaches the route, or answers
//! 404 / 405 itself.

use std::sync::Arc;

use http::StatusCode;

use super::{Middleware, Next, ready};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Lookup, RouteTable};

pub(crate) struct Routing {
    pub(crate) table: Arc<RouteTable>,
}

impl Middleware for Routing {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        match self.table.lookup(req.method(), req.path()) {
            Lookup::Found(route) => {
                req.route = Some(route);
                next.run(req)
            }
            Lookup::MethodNotAllowed(allowed) => ready(Ok(Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header("allow", &allow_header(&allowed))
                .no_body())),
            Lookup::NotFound => ready(Ok(Response::status(StatusCode::NOT_FOUND))),
        }
    }
}

fn allow_header(methods: &[Method]) -> String {
    methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
}
