//! The application object.
//!
//! [`Mono`] collects routes, middleware and services. Nothing is compiled
//! until a request is handled: [`Mono::pipeline`] turns the registrations
//! into a [`Pipeline`] with the stage order fixed here, and both
//! [`Mono::handle`] and [`Mono::run`] go through it. `handle` keeps the
//! compiled pipeline until the next registration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use http::StatusCode;
use minijinja::Environment;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::container::{Container, Inject};
use crate::error::Error;
use crate::handler::{BoxFuture, Handler};
use crate::method::IntoMethods;
use crate::middleware::{
    AttributeMapping, BoxedMiddleware, Dispatch, Middleware, Next, Recover, Routing,
};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::server::Server;
use crate::templates::Templates;

/// Services every request can reach through [`Request::get`] and
/// [`Request::render`].
pub(crate) struct Shared {
    pub(crate) container: Arc<Container>,
    pub(crate) templates: Option<Arc<Templates>>,
}

/// A micro-framework application.
///
/// ```rust,no_run
/// use mono::{Method, Mono, Request};
///
/// #[tokio::main]
/// async fn main() -> Result<(), mono::Error> {
///     let mut app = Mono::builder().templates("templates").build();
///
///     app.add_route(Method::Get, "/books/{book}", |req: Request| async move {
///         format!("Book: {}", req.param("book").unwrap_or_default())
///     });
///
///     app.run().await
/// }
/// ```
pub struct Mono {
    config: Config,
    container: Arc<Container>,
    templates: Option<Arc<Templates>>,
    router: Router,
    middleware: Vec<BoxedMiddleware>,
    compiled: OnceLock<Pipeline>,
}

impl Mono {
    /// An application with default configuration: no templates, debug off,
    /// an empty container.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MonoBuilder {
        MonoBuilder::default()
    }

    /// Registers `handler` for one or several methods on `path`.
    ///
    /// Patterns are validated when the pipeline is built; an invalid or
    /// conflicting pattern makes [`handle`](Self::handle) and
    /// [`run`](Self::run) fail with [`Error::Route`].
    pub fn add_route<Args>(&mut self, methods: impl IntoMethods, path: &str, handler: impl Handler<Args>) {
        self.router.add(methods.into_methods(), path, handler.into_boxed_handler());
        self.compiled.take();
    }

    /// Appends a user middleware. User middleware runs after routing and
    /// attribute mapping, in registration order.
    pub fn add_middleware(&mut self, middleware: impl Middleware) {
        self.middleware.push(Arc::new(middleware));
        self.compiled.take();
    }

    /// Resolves a registered service.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.container.get::<T>()
    }

    /// Resolves a service, constructing it through [`Inject`] if needed.
    pub fn make<T: Inject>(&self) -> Result<Arc<T>, Error> {
        self.container.make::<T>()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Renders a template into a `200 OK` HTML response.
    pub fn render(&self, template: &str, data: impl Serialize) -> Result<Response, Error> {
        match &self.templates {
            Some(templates) => templates.render(template, data),
            None => Err(Error::TemplatesNotConfigured),
        }
    }

    /// A response with `status` and an optional plain-text body.
    pub fn create_response(status: StatusCode, body: Option<String>) -> Response {
        match body {
            Some(body) => Response::builder().status(status).text(body),
            None => Response::status(status),
        }
    }

    /// Compiles routes and assembles the stage stack:
    /// recover, routing, attribute mapping (optional), user middleware, dispatch.
    ///
    /// Every call compiles afresh; keep the result around when serving
    /// requests outside [`handle`](Self::handle) and [`run`](Self::run).
    pub fn pipeline(&self) -> Result<Pipeline, Error> {
        let table = Arc::new(self.router.compile()?);

        let mut stack: Vec<BoxedMiddleware> = Vec::with_capacity(self.middleware.len() + 4);
        stack.push(Arc::new(Recover { debug: self.config.debug }));
        stack.push(Arc::new(Routing { table }));
        if self.config.map_attributes {
            stack.push(Arc::new(AttributeMapping));
        }
        stack.extend(self.middleware.iter().cloned());
        stack.push(Arc::new(Dispatch));

        debug!(
            routes = self.router.len(),
            middleware = self.middleware.len(),
            debug = self.config.debug,
            "pipeline built"
        );

        Ok(Pipeline {
            stack: stack.into(),
            max_body_bytes: self.config.max_body_bytes,
            shared: Arc::new(Shared {
                container: Arc::clone(&self.container),
                templates: self.templates.clone(),
            }),
        })
    }

    /// Runs one request through the pipeline.
    ///
    /// In debug mode, handler errors and panics come back as `Err`; otherwise
    /// they become a generic 500 response.
    ///
    /// The pipeline is compiled on the first call and reused until a route
    /// or middleware is added.
    pub async fn handle(&self, req: Request) -> Result<Response, Error> {
        let pipeline = match self.compiled.get() {
            Some(pipeline) => pipeline,
            None => {
                let pipeline = self.pipeline()?;
                self.compiled.get_or_init(|| pipeline)
            }
        };
        pipeline.handle(req).await
    }

    /// Serves the application on the configured address until SIGTERM or
    /// Ctrl-C, then drains in-flight connections.
    pub async fn run(self) -> Result<(), Error> {
        let addr = self.config.addr;
        self.run_on(addr).await
    }

    pub async fn run_on(self, addr: SocketAddr) -> Result<(), Error> {
        let pipeline = self.pipeline()?;
        Server::bind(addr).await?.serve(pipeline).await
    }
}

impl Default for Mono {
    fn default() -> Self { Self::new() }
}

/// Compiled, shareable request pipeline.
pub struct Pipeline {
    stack: Arc<[BoxedMiddleware]>,
    shared: Arc<Shared>,
    max_body_bytes: usize,
}

impl Pipeline {
    /// Body cap the server applies before a request enters the pipeline.
    pub(crate) fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn handle(&self, mut req: Request) -> BoxFuture<Result<Response, Error>> {
        req.shared = Some(Arc::clone(&self.shared));
        Next::start(Arc::clone(&self.stack)).run(req)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

type EnvHook = Box<dyn FnOnce(&mut Environment<'static>)>;

/// Builder for [`Mono`]. Obtain via [`Mono::builder()`].
#[derive(Default)]
pub struct MonoBuilder {
    config: Config,
    container: Option<Arc<Container>>,
    env_hooks: Vec<EnvHook>,
}

impl MonoBuilder {
    /// Replaces the whole configuration, e.g. with [`Config::from_env`].
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn templates(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.templates = Some(folder.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn map_attributes(mut self, enabled: bool) -> Self {
        self.config.map_attributes = enabled;
        self
    }

    /// Uses a pre-populated container instead of an empty one.
    pub fn container(mut self, container: impl Into<Arc<Container>>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Customises the template environment (filters, functions, globals).
    /// Ignored when no template folder ends up configured.
    pub fn template_env(mut self, hook: impl FnOnce(&mut Environment<'static>) + 'static) -> Self {
        self.env_hooks.push(Box::new(hook));
        self
    }

    pub fn build(self) -> Mono {
        let container = self.container.unwrap_or_default();

        let templates = match &self.config.templates {
            Some(folder) if folder.is_dir() => {
                let mut templates = Templates::new(folder.clone(), self.config.debug);
                for hook in self.env_hooks {
                    hook(templates.environment_mut());
                }
                let templates = Arc::new(templates);
                container.insert_arc(Arc::clone(&templates));
                Some(templates)
            }
            Some(folder) => {
                warn!(folder = %folder.display(), "template folder not found, rendering disabled");
                None
            }
            None => None,
        };

        container.insert(self.config.clone());

        Mono {
            config: self.config,
            container,
            templates,
            router: Router::default(),
            middleware: Vec::new(),
            compiled: OnceLock::new(),
        }
    }
}
