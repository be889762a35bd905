//! Middleware layer.
//!
//! Every request runs through one ordered stack:
//!
//! ```text
//! recover → routing → attribute mapping → user middleware… → dispatch
//! ```
//!
//! `recover` turns failures into a generic 500 (or re-raises them in debug
//! mode), `routing` answers 404/405 or attaches the matched route, attribute
//! mapping fills `MapTo` arguments, and `dispatch` calls the handler. User
//! middleware therefore always sees a routed request and can inspect
//! [`Request::route`].
//!
//! A middleware is any `async` closure `(Request, Next)` or a type
//! implementing [`Middleware`]:
//!
//! ```rust
//! use mono::{Mono, Request, Response, StatusCode, middleware::Next};
//!
//! let mut app = Mono::new();
//! app.add_middleware(|req: Request, next: Next| async move {
//!     if req.header("x-api-key").is_none() {
//!         return Ok(Response::status(StatusCode::UNAUTHORIZED));
//!     }
//!     next.run(req).await
//! });
//! ```

mod dispatch;
mod mapping;
mod recover;
mod routing;
mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{BoxFuture, HandlerOutput};
use crate::request::Request;
use crate::response::Response;

pub(crate) use dispatch::Dispatch;
pub(crate) use mapping::AttributeMapping;
pub(crate) use recover::Recover;
pub(crate) use routing::Routing;
pub use trace::Trace;

/// A pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        let fut = self(req, next);
        Box::pin(async move { fut.await.into_result() })
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the stack after the current stage.
#[derive(Clone)]
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
}

impl Next {
    pub(crate) fn start(stack: Arc<[BoxedMiddleware]>) -> Self {
        Self { stack, index: 0 }
    }

    /// Passes the request to the next stage.
    pub fn run(self, req: Request) -> BoxFuture<Result<Response, Error>> {
        match self.stack.get(self.index) {
            Some(stage) => {
                let stage = Arc::clone(stage);
                let next = Next { stack: self.stack, index: self.index + 1 };
                stage.handle(req, next)
            }
            None => Box::pin(async { Err(Error::PipelineExhausted) }),
        }
    }
}

/// Short-circuits a stage with an already-known outcome.
pub(crate) fn ready(outcome: Result<Response, Error>) -> BoxFuture<Result<Response, Error>> {
    Box::pin(std::future::ready(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use parking_lot::Mutex;

    fn stack(stages: Vec<BoxedMiddleware>) -> Next {
        Next::start(stages.into())
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut stages: Vec<BoxedMiddleware> = Vec::new();
        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            stages.push(Arc::new(move |req: Request, next: Next| {
                seen.lock().push(name);
                next.run(req)
            }));
        }
        stages.push(Arc::new(|_req: Request, _next: Next| async { "end" }));

        let res = stack(stages).run(Request::new(Method::Get, "/")).await.unwrap();
        assert_eq!(res.text_body(), "end");
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn running_past_the_end_is_an_error() {
        let out = stack(Vec::new()).run(Request::new(Method::Get, "/")).await;
        assert!(matches!(out, Err(Error::PipelineExhausted)));
    }
}
