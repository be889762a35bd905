//! Incoming HTTP request type.

use std::any::{Any, type_name};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::app::Shared;
use crate::error::Error;
use crate::method::Method;
use crate::response::Response;
use crate::router::RouteMatch;

/// An incoming HTTP request.
///
/// Besides the wire data, a request carries what earlier pipeline stages
/// attached to it: the matched route (see [`Request::route`]) and, for
/// handlers taking a [`MapTo`](crate::MapTo) argument, the mapped body.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) route: Option<RouteMatch>,
    pub(crate) mapped: Option<Box<dyn Any + Send + Sync>>,
    pub(crate) shared: Option<Arc<Shared>>,
}

impl Request {
    /// Builds a request for `method` and `uri` (path plus optional query).
    ///
    /// ```rust
    /// use mono::{Method, Request};
    ///
    /// let req = Request::new(Method::Post, "/books?draft=1")
    ///     .with_header("content-type", "application/json")
    ///     .with_body(br#"{"title":"Moby Dick"}"#.to_vec());
    /// assert_eq!(req.path(), "/books");
    /// assert_eq!(req.query("draft").as_deref(), Some("1"));
    /// ```
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (uri, None),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_owned() } else { path.to_owned() },
            query,
            headers: Vec::new(),
            body: Vec::new(),
            route: None,
            mapped: None,
            shared: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query-string value. The last occurrence wins.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(k, _)| k == key)
            .last()
            .map(|(_, v)| v.into_owned())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/books/{book}`, `req.param("book")` on `/books/123` returns `Some("123")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.route.as_ref()?.param(key)
    }

    /// The route the routing stage matched, if it has run.
    pub fn route(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }

    /// The body decoded by content type.
    ///
    /// JSON objects and `application/x-www-form-urlencoded` bodies produce a
    /// map; anything else (including malformed JSON) produces an empty one.
    pub fn parsed_body(&self) -> Map<String, Value> {
        if self.is_form() {
            return url::form_urlencoded::parse(&self.body)
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect();
        }
        if self.is_json() {
            if let Ok(Value::Object(map)) = serde_json::from_slice(&self.body) {
                return map;
            }
        }
        Map::new()
    }

    /// Maps the body onto `T`.
    ///
    /// Unknown keys are ignored. Form fields arrive as strings and are cast
    /// one by one against the type of the field they fill, so `title=1984`
    /// stays a string while `rating=5` becomes a number. Other bodies go
    /// through [`parsed_body`](Self::parsed_body) and serde_json.
    pub fn map_body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let mapped = if self.is_form() {
            serde_urlencoded::from_bytes::<T>(&self.body).map_err(|e| e.to_string())
        } else {
            serde_json::from_value::<T>(Value::Object(self.parsed_body())).map_err(|e| e.to_string())
        };
        mapped.map_err(|message| Error::Mapping { type_name: type_name::<T>(), message })
    }

    /// Resolves a service from the running app's container.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        match &self.shared {
            Some(shared) => shared.container.get::<T>(),
            None => Err(Error::NotRegistered(type_name::<T>())),
        }
    }

    /// Renders a template through the running app's template folder.
    pub fn render(&self, template: &str, data: impl Serialize) -> Result<Response, Error> {
        match self.shared.as_ref().and_then(|s| s.templates.as_ref()) {
            Some(templates) => templates.render(template, data),
            None => Err(Error::TemplatesNotConfigured),
        }
    }

    fn is_form(&self) -> bool {
        self.content_type_is("application/x-www-form-urlencoded")
    }

    fn is_json(&self) -> bool {
        self.content_type_is("application/json")
    }

    fn content_type_is(&self, mime: &str) -> bool {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(mime))
    }
}
