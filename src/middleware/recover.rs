//! Error-handling stage.
//!
//! Outermost stage: catches every `Err` and panic raised further down the
//! stack. In debug mode the failure goes back to the caller untouched;
//! otherwise it is logged and replaced with a generic 500.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use super::{Middleware, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Body of the production-mode 500 response.
pub(crate) const GENERIC_FAILURE: &str = "Something went wrong!";

pub(crate) struct Recover {
    pub(crate) debug: bool,
}

impl Middleware for Recover {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        let debug = self.debug;
        let method = req.method();
        let path = req.path().to_owned();

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { next.run(req).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(Error::Panic(panic_message(panic.as_ref()))));

            match outcome {
                Ok(res) => Ok(res),
                Err(e) if debug => Err(e),
                Err(e) => {
                    error!(%method, %path, error = %e, "request failed");
                    Ok(Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .text(GENERIC_FAILURE))
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
