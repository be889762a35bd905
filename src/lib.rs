//! # mono
//!
//! A micro-framework built around one object. Register routes and
//! middleware on [`Mono`], then either [`run`](Mono::run) it as an HTTP
//! server or [`handle`](Mono::handle) single requests directly.
//!
//! Every request goes through the same stages, in this order:
//!
//! 1. **error handling** — failures become a generic 500, or are re-raised
//!    when debug mode is on
//! 2. **routing** — 404, 405 with `Allow`, or the matched route is attached
//! 3. **attribute mapping** — `MapTo<T>` handler arguments are filled from
//!    the request body
//! 4. **your middleware**, in registration order
//! 5. **the handler**
//!
//! Routing is delegated to [`matchit`], templates to [`minijinja`], the
//! transport to hyper. mono only wires them together.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mono::{MapTo, Method, Mono, Request, Response, StatusCode};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewBook {
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mono::Error> {
//!     let mut app = Mono::builder().templates("templates").debug(true).build();
//!
//!     app.add_route(Method::Get, "/", home);
//!     app.add_route(Method::Get, "/books/{book}", show_book);
//!     app.add_route(Method::Post, "/books", create_book);
//!
//!     app.run().await
//! }
//!
//! async fn home(req: Request) -> Result<Response, mono::Error> {
//!     req.render("index.html", serde_json::json!({ "output": "Hello, world!" }))
//! }
//!
//! async fn show_book(req: Request) -> String {
//!     format!("Book: {}", req.param("book").unwrap_or_default())
//! }
//!
//! async fn create_book(_req: Request, MapTo(book): MapTo<NewBook>) -> Response {
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .text(book.title)
//! }
//! ```

mod app;
mod config;
mod container;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod templates;

pub mod middleware;

pub use app::{Mono, MonoBuilder, Pipeline};
pub use config::Config;
pub use container::{Container, Inject};
pub use error::Error;
pub use handler::{BoxFuture, Controller, Handler, HandlerOutput, MapTo};
pub use http::StatusCode;
pub use method::{IntoMethods, Method};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::RouteMatch;
pub use server::Server;
pub use templates::Templates;
