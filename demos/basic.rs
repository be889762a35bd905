//! Minimal mono example: a small book API with a template page.
//!
//! Run with:
//!   RUST_LOG=info MONO_ADDR=127.0.0.1:3000 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/books/42
//!   curl -X POST http://localhost:3000/books -d 'title=Moby+dick&rating=5'
//!   curl -X DELETE http://localhost:3000/books/42

use mono::middleware::Trace;
use mono::{Config, Error, MapTo, Method, Mono, Request, Response, StatusCode};
use serde::Deserialize;

#[derive(Deserialize)]
struct NewBook {
    title: String,
    rating: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let mut app = Mono::builder().config(Config::from_env()?).build();

    app.add_middleware(Trace);
    app.add_route(Method::Get, "/books/{id}", show_book);
    app.add_route(Method::Post, "/books", create_book);
    app.add_route(Method::Delete, "/books/{id}", delete_book);
    app.add_route(Method::Get, "/", home);

    app.run().await
}

// Falls back to plain text when MONO_TEMPLATES is not set.
async fn home(req: Request) -> Result<Response, Error> {
    match req.render("index.html", serde_json::json!({ "output": "Hello, world!" })) {
        Err(Error::TemplatesNotConfigured) => Ok(Response::text("Hello, world!")),
        other => other,
    }
}

async fn show_book(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","title":"Moby dick"}}"#).into_bytes())
}

async fn create_book(_req: Request, MapTo(book): MapTo<NewBook>) -> Response {
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/books/99")
        .json(format!(r#"{{"id":"99","title":"{}","rating":{}}}"#, book.title, book.rating.unwrap_or(0)).into_bytes())
}

async fn delete_book(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
