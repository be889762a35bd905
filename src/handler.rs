//! Handler traits and type erasure.
//!
//! # How handlers are stored
//!
//! The route table holds handlers of *different* types, so each one is boxed
//! behind [`ErasedHandler`] once at registration time:
//!
//! ```text
//! async fn show(req: Request) -> Response { … }      ← user writes this
//!        ↓ app.add_route(Method::Get, "/", show)
//! show.into_boxed_handler()                         ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                         ← stored as BoxedHandler
//!        ↓
//! handler.call(req) at request time                 ← one vtable dispatch
//! ```
//!
//! Three shapes are accepted: `Fn(Request)`, `Fn(Request, MapTo<T>)` and an
//! `Arc` of a [`Controller`]. The `Args` parameter on [`Handler`] only exists
//! to keep these blanket impls apart.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Internal dispatch interface.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    /// Runs during the attribute-mapping stage, before user middleware.
    fn prepare(&self, _req: &mut Request) -> Result<(), Error> {
        Ok(())
    }

    fn call(&self, req: Request) -> BoxFuture<Result<Response, Error>>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + 'static>;

// ── Handler output ────────────────────────────────────────────────────────────

/// Anything a handler or middleware may return: a response, or a `Result`
/// whose error converts into [`Error`].
pub trait HandlerOutput: Send + 'static {
    fn into_result(self) -> Result<Response, Error>;
}

impl<R> HandlerOutput for R
where
    R: IntoResponse + Send + 'static,
{
    fn into_result(self) -> Result<Response, Error> {
        Ok(self.into_response())
    }
}

impl<R, E> HandlerOutput for Result<R, E>
where
    R: IntoResponse + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    fn into_result(self) -> Result<Response, Error> {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by:
///
/// ```text
/// async fn name(req: Request) -> impl HandlerOutput
/// async fn name(req: Request, body: MapTo<T>) -> impl HandlerOutput
/// Arc<impl Controller>
/// ```
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

/// Handler argument receiving the request body mapped onto `T`.
///
/// The body is mapped by [`Request::map_body`] during the attribute-mapping
/// stage, so a mapping failure never reaches user middleware.
#[derive(Debug)]
pub struct MapTo<T>(pub T);

/// An invokable controller object, registered as `Arc<C>`.
///
/// Controllers usually get their dependencies through
/// [`Inject`](crate::Inject) and are built with [`Mono::make`](crate::Mono::make).
pub trait Controller: Send + Sync + 'static {
    type Output: HandlerOutput;

    fn call(&self, req: Request) -> impl Future<Output = Self::Output> + Send;
}

#[doc(hidden)]
pub struct Invokable(());

// ── Fn(Request) ───────────────────────────────────────────────────────────────

impl<F, Fut> private::Sealed<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
}

impl<F, Fut> Handler<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
    fn call(&self, req: Request) -> BoxFuture<Result<Response, Error>> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_result() })
    }
}

// ── Fn(Request, MapTo<T>) ─────────────────────────────────────────────────────

impl<F, Fut, T> private::Sealed<(Request, MapTo<T>)> for F
where
    F: Fn(Request, MapTo<T>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
    T: DeserializeOwned + Send + Sync + 'static,
{
}

impl<F, Fut, T> Handler<(Request, MapTo<T>)> for F
where
    F: Fn(Request, MapTo<T>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(MapToHandler { f: self, _target: PhantomData })
    }
}

struct MapToHandler<F, T> {
    f: F,
    _target: PhantomData<fn() -> T>,
}

impl<F, Fut, T> ErasedHandler for MapToHandler<F, T>
where
    F: Fn(Request, MapTo<T>) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn prepare(&self, req: &mut Request) -> Result<(), Error> {
        let value: T = req.map_body()?;
        req.mapped = Some(Box::new(value));
        Ok(())
    }

    fn call(&self, mut req: Request) -> BoxFuture<Result<Response, Error>> {
        // Mapped eagerly unless the attribute-mapping stage is disabled.
        let mapped = match req.mapped.take().map(|b| b.downcast::<T>()) {
            Some(Ok(value)) => *value,
            _ => match req.map_body::<T>() {
                Ok(value) => value,
                Err(e) => return Box::pin(async move { Err(e) }),
            },
        };
        let fut = (self.f)(req, MapTo(mapped));
        Box::pin(async move { fut.await.into_result() })
    }
}

// ── Arc<impl Controller> ──────────────────────────────────────────────────────

impl<C: Controller> private::Sealed<Invokable> for Arc<C> {}

impl<C: Controller> Handler<Invokable> for Arc<C> {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(ControllerHandler(self))
    }
}

struct ControllerHandler<C>(Arc<C>);

impl<C: Controller> ErasedHandler for ControllerHandler<C> {
    fn call(&self, req: Request) -> BoxFuture<Result<Response, Error>> {
        let controller = Arc::clone(&self.0);
        Box::pin(async move { controller.call(req).await.into_result() })
    }
}
