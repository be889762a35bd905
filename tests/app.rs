use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mono::middleware::Next;
use mono::{
    Container, Controller, Error, Inject, MapTo, Method, Mono, Request, Response, StatusCode,
    Templates,
};
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;

fn template_folder() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "{{ output }}").unwrap();
    dir
}

fn get(uri: &str) -> Request {
    Request::new(Method::Get, uri)
}

async fn body(app: &Mono, req: Request) -> String {
    app.handle(req).await.unwrap().text_body().into_owned()
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn routes_to_handler() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/", |_req: Request| async { "Hello, world!" });

    assert_eq!(body(&app, get("/")).await, "Hello, world!");
}

#[tokio::test]
async fn routes_with_parameters() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/books/{book}", |req: Request| async move {
        format!("Book: {}", req.param("book").unwrap_or_default())
    });

    assert_eq!(body(&app, get("/books/123")).await, "Book: 123");
}

#[tokio::test]
async fn unmatched_method_is_405_with_allow() {
    let mut app = Mono::new();
    app.add_route([Method::Post, Method::Put], "/book", |_req: Request| async { StatusCode::NO_CONTENT });

    let res = app.handle(get("/book")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("allow"), Some("POST, PUT"));
}

#[tokio::test]
async fn invalid_routes_fail_the_run() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/", |_req: Request| async { "a" });
    app.add_route(Method::Get, "/", |_req: Request| async { "b" });

    assert!(matches!(app.handle(get("/")).await, Err(Error::Route { .. })));
}

// ── Error handling ────────────────────────────────────────────────────────────

#[tokio::test]
async fn production_mode_returns_generic_error() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/", |_req: Request| async {
        Err::<Response, _>(Error::handler("Developer error"))
    });

    let res = app.handle(get("/")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text_body(), "Something went wrong!");
}

#[tokio::test]
async fn debug_mode_raises_errors() {
    let mut app = Mono::builder().debug(true).build();
    app.add_route(Method::Get, "/", |_req: Request| async {
        Err::<Response, _>(std::io::Error::other("disk on fire"))
    });

    assert!(matches!(app.handle(get("/")).await, Err(Error::Io(_))));
}

#[tokio::test]
async fn render_without_template_folder_raises_in_debug() {
    let mut app = Mono::builder().debug(true).build();
    app.add_route(Method::Get, "/", |req: Request| async move {
        req.render("index.html", json!({ "output": "Hello, world!" }))
    });

    assert!(matches!(app.handle(get("/")).await, Err(Error::TemplatesNotConfigured)));
}

// ── Templates and DI ──────────────────────────────────────────────────────────

#[tokio::test]
async fn renders_templates() {
    let dir = template_folder();
    let mut app = Mono::builder().templates(dir.path()).debug(true).build();
    app.add_route(Method::Get, "/", |req: Request| async move {
        req.render("index.html", json!({ "output": "Hello, world!" }))
    });

    let res = app.handle(get("/")).await.unwrap();
    assert_eq!(res.text_body(), "Hello, world!");
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));

    let direct = app.render("index.html", json!({ "output": "direct" })).unwrap();
    assert_eq!(direct.text_body(), "direct");
}

#[tokio::test]
async fn template_environment_can_be_customised() {
    let dir = template_folder();
    std::fs::write(dir.path().join("greet.html"), "{{ greet(name) }}").unwrap();

    let app = Mono::builder()
        .templates(dir.path())
        .template_env(|env| env.add_function("greet", |name: String| format!("Hi {name}")))
        .build();

    assert_eq!(app.render("greet.html", json!({ "name": "Ada" })).unwrap().text_body(), "Hi Ada");
}

struct Library {
    name: &'static str,
}

#[tokio::test]
async fn handlers_resolve_services() {
    let container = Container::new();
    container.insert(Library { name: "Alexandria" });

    let mut app = Mono::builder().container(container).build();
    app.add_route(Method::Get, "/", |req: Request| async move {
        req.get::<Library>().map(|lib| lib.name.to_owned())
    });

    assert_eq!(body(&app, get("/")).await, "Alexandria");
    assert_eq!(app.get::<Library>().unwrap().name, "Alexandria");
}

#[tokio::test]
async fn templates_are_registered_in_the_container() {
    let dir = template_folder();
    let app = Mono::builder().templates(dir.path()).build();
    assert_eq!(app.get::<Templates>().unwrap().folder(), dir.path());
}

// ── Controllers ───────────────────────────────────────────────────────────────

struct Greeter {
    templates: Option<Arc<Templates>>,
}

impl Inject for Greeter {
    fn inject(c: &Container) -> Result<Self, Error> {
        Ok(Self { templates: c.try_get() })
    }
}

impl Controller for Greeter {
    type Output = Result<Response, Error>;

    async fn call(&self, req: Request) -> Result<Response, Error> {
        let name = req.param("name").unwrap_or_default();
        match &self.templates {
            Some(templates) => templates.render("index.html", json!({ "output": format!("Hello {name}!") })),
            None => Ok(Response::text(format!("Hello {name}!"))),
        }
    }
}

#[tokio::test]
async fn routes_to_controller() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/test/{name}", Arc::new(Greeter { templates: None }));

    assert_eq!(body(&app, get("/test/foobar")).await, "Hello foobar!");
}

#[tokio::test]
async fn routes_to_autowired_controller() {
    let mut app = Mono::new();
    app.add_route(Method::Get, "/test/{name}", app.make::<Greeter>().unwrap());

    assert_eq!(body(&app, get("/test/autowired")).await, "Hello autowired!");
}

#[tokio::test]
async fn autowired_controller_renders_templates() {
    let dir = template_folder();
    let mut app = Mono::builder().templates(dir.path()).build();
    app.add_route(Method::Get, "/test/{name}", app.make::<Greeter>().unwrap());

    let res = app.handle(get("/test/autotwig")).await.unwrap();
    assert_eq!(res.text_body(), "Hello autotwig!");
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
}

// ── Middleware ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn middleware_can_replace_the_response() {
    let mut app = Mono::builder().debug(true).build();
    app.add_middleware(|req: Request, next: Next| async move {
        next.run(req).await?;
        Ok::<_, Error>(Response::text("Some new content"))
    });
    app.add_route(Method::Get, "/", |_req: Request| async { "Hello, world!" });

    assert_eq!(body(&app, get("/")).await, "Some new content");
}

#[tokio::test]
async fn middleware_sees_the_matched_route() {
    let mut app = Mono::builder().debug(true).build();
    app.add_middleware(|req: Request, next: Next| async move {
        let pattern = req.route().map(|r| r.pattern().to_owned());
        let res = next.run(req).await?;
        Ok::<_, Error>(res.with_header("x-route", &pattern.unwrap_or_default()))
    });
    app.add_route(Method::Get, "/books/{book}", |_req: Request| async { "ok" });

    let res = app.handle(get("/books/1")).await.unwrap();
    assert_eq!(res.header("x-route"), Some("/books/{book}"));
}

#[tokio::test]
async fn middleware_runs_in_registration_order() {
    let mut app = Mono::new();
    for tag in ["a", "b"] {
        app.add_middleware(move |req: Request, next: Next| async move {
            let res = next.run(req).await?;
            let seen = res.header("x-seen").unwrap_or_default().to_owned();
            Ok::<_, Error>(Response::text(res.text_body().into_owned())
                .with_header("x-seen", &format!("{tag}{seen}")))
        });
    }
    app.add_route(Method::Get, "/", |_req: Request| async { "" });

    let res = app.handle(get("/")).await.unwrap();
    assert_eq!(res.header("x-seen"), Some("ab"));
}

#[tokio::test]
async fn not_found_short_circuits_user_middleware() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut app = Mono::new();
    let counter = Arc::clone(&calls);
    app.add_middleware(move |req: Request, next: Next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.run(req)
    });

    let res = app.handle(get("/missing")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ── Attribute mapping ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum Gender {
    Male,
    Female,
}

#[derive(Debug, Deserialize)]
struct Book {
    title: String,
    gender: Gender,
    published: String,
    rating: Option<i32>,
}

fn book_form(body: &str) -> Request {
    Request::new(Method::Post, "/book")
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body(body)
}

#[tokio::test]
async fn maps_form_body_to_handler_argument() {
    let mut app = Mono::builder().debug(true).build();
    app.add_route(Method::Post, "/book", |_req: Request, MapTo(book): MapTo<Book>| async move {
        assert_eq!(book.gender, Gender::Male);
        assert_eq!(book.published, "2014-05-12T00:00:00+00:00");
        format!("{} ({})", book.title, book.rating.unwrap_or_default())
    });

    let req = book_form("title=Moby+dick&gender=male&published=2014-05-12T00%3A00%3A00%2B00%3A00&rating=5");
    assert_eq!(body(&app, req).await, "Moby dick (5)");
}

#[tokio::test]
async fn maps_digit_and_empty_strings_next_to_numbers() {
    let mut app = Mono::builder().debug(true).build();
    app.add_route(Method::Post, "/book", |_req: Request, MapTo(book): MapTo<Book>| async move {
        format!("[{}] [{}] ({})", book.title, book.published, book.rating.unwrap_or_default())
    });

    let req = book_form("title=1984&gender=male&published=&rating=5");
    assert_eq!(body(&app, req).await, "[1984] [] (5)");
}

#[tokio::test]
async fn maps_json_body_inside_handler() {
    let mut app = Mono::builder().debug(true).build();
    app.add_route(Method::Post, "/book", |req: Request| async move {
        req.map_body::<Book>().map(|book| book.title)
    });

    let req = Request::new(Method::Post, "/book")
        .with_header("content-type", "application/json")
        .with_body(r#"{"title":"Dune","gender":"female","published":"1965","extra":true}"#);
    assert_eq!(body(&app, req).await, "Dune");
}

#[tokio::test]
async fn mapping_failure_stops_before_user_middleware() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut app = Mono::builder().debug(true).build();
    let counter = Arc::clone(&calls);
    app.add_middleware(move |req: Request, next: Next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.run(req)
    });
    app.add_route(Method::Post, "/book", |_req: Request, MapTo(book): MapTo<Book>| async move { book.title });

    let err = app.handle(book_form("gender=male")).await.unwrap_err();
    assert!(matches!(err, Error::Mapping { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_mapping_stage_maps_after_user_middleware() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut app = Mono::builder().map_attributes(false).build();
    let counter = Arc::clone(&calls);
    app.add_middleware(move |req: Request, next: Next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.run(req)
    });
    app.add_route(Method::Post, "/book", |_req: Request, MapTo(book): MapTo<Book>| async move { book.title });

    let res = app.handle(book_form("gender=male")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
