//! Per-request tracing.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use super::{Middleware, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::router::RouteMatch;

/// Logs method, path, matched route, status and latency for every request.
///
/// Register it like any user middleware: `app.add_middleware(Trace)`. Because
/// user middleware runs after routing, 404 and 405 answers are not traced.
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.path(),
            route = req.route().map(RouteMatch::pattern).unwrap_or(""),
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = next.run(req).await;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                match &outcome {
                    Ok(res) => info!(status = res.status_code().as_u16(), elapsed_ms, "request completed"),
                    Err(e) => warn!(error = %e, elapsed_ms, "request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}
