//! Route registration and the compiled radix-tree table.
//!
//! Registration only records routes. The table is compiled when the pipeline
//! is built, with one `matchit` tree per HTTP method, so a bad pattern is
//! reported as an [`Error::Route`] from the run instead of a panic at
//! registration time.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;

/// One registered route.
struct Route {
    methods: Vec<Method>,
    pattern: Arc<str>,
    handler: BoxedHandler,
}

/// Routes in registration order.
#[derive(Default)]
pub(crate) struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub(crate) fn add(&mut self, methods: Vec<Method>, path: &str, handler: BoxedHandler) {
        self.routes.push(Route { methods, pattern: path.into(), handler });
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }

    /// Builds the lookup table.
    pub(crate) fn compile(&self) -> Result<RouteTable, Error> {
        let mut trees: Vec<(Method, MatchitRouter<usize>)> = Vec::new();

        for (index, route) in self.routes.iter().enumerate() {
            for &method in &route.methods {
                let slot = match trees.iter().position(|(m, _)| *m == method) {
                    Some(slot) => slot,
                    None => {
                        trees.push((method, MatchitRouter::new()));
                        trees.len() - 1
                    }
                };
                trees[slot].1.insert(&*route.pattern, index).map_err(|e| Error::Route {
                    path: format!("{method} {}", route.pattern),
                    message: e.to_string(),
                })?;
            }
        }

        let entries = self.routes.iter()
            .map(|r| (Arc::clone(&r.pattern), Arc::clone(&r.handler)))
            .collect();

        Ok(RouteTable { trees, entries })
    }
}

/// Outcome of matching a method + path.
pub(crate) enum Lookup {
    Found(RouteMatch),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Compiled routes. Trees are kept in the order their method was first
/// registered, which is also the order of the `Allow` header.
pub(crate) struct RouteTable {
    trees: Vec<(Method, MatchitRouter<usize>)>,
    entries: Vec<(Arc<str>, BoxedHandler)>,
}

impl RouteTable {
    pub(crate) fn lookup(&self, method: Method, path: &str) -> Lookup {
        if let Some(found) = self.find(method, path) {
            return Lookup::Found(found);
        }
        if method == Method::Head {
            if let Some(found) = self.find(Method::Get, path) {
                return Lookup::Found(found);
            }
        }

        let allowed: Vec<Method> = self.trees.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();

        if allowed.is_empty() { Lookup::NotFound } else { Lookup::MethodNotAllowed(allowed) }
    }

    fn find(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let (_, tree) = self.trees.iter().find(|(m, _)| *m == method)?;
        let matched = tree.at(path).ok()?;
        let (pattern, handler) = &self.entries[*matched.value];
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some(RouteMatch {
            pattern: Arc::clone(pattern),
            handler: Arc::clone(handler),
            params,
        })
    }
}

/// The route the routing stage matched, attached to the request so later
/// middleware can inspect it.
#[derive(Clone)]
pub struct RouteMatch {
    pattern: Arc<str>,
    pub(crate) handler: BoxedHandler,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// The registered pattern, e.g. `/books/{book}`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::request::Request;

    async fn noop(_req: Request) -> &'static str {
        ""
    }

    fn router(routes: &[(&[Method], &str)]) -> Router {
        let mut router = Router::default();
        for (methods, path) in routes {
            router.add(methods.to_vec(), path, noop.into_boxed_handler());
        }
        router
    }

    #[test]
    fn matches_parameters() {
        let table = router(&[(&[Method::Get], "/books/{book}")]).compile().unwrap();
        let Lookup::Found(found) = table.lookup(Method::Get, "/books/123") else {
            panic!("expected a match");
        };
        assert_eq!(found.pattern(), "/books/{book}");
        assert_eq!(found.param("book"), Some("123"));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let table = router(&[(&[Method::Get], "/")]).compile().unwrap();
        assert!(matches!(table.lookup(Method::Get, "/missing"), Lookup::NotFound));
    }

    #[test]
    fn wrong_method_lists_allowed_in_registration_order() {
        let table = router(&[
            (&[Method::Post], "/book"),
            (&[Method::Put, Method::Delete], "/book"),
            (&[Method::Get], "/other"),
        ])
        .compile()
        .unwrap();

        let Lookup::MethodNotAllowed(allowed) = table.lookup(Method::Get, "/book") else {
            panic!("expected 405");
        };
        assert_eq!(allowed, vec![Method::Post, Method::Put, Method::Delete]);
    }

    #[test]
    fn head_falls_back_to_get() {
        let table = router(&[(&[Method::Get], "/")]).compile().unwrap();
        assert!(matches!(table.lookup(Method::Head, "/"), Lookup::Found(_)));
    }

    #[test]
    fn duplicate_routes_fail_to_compile() {
        let err = router(&[(&[Method::Get], "/"), (&[Method::Get], "/")]).compile().err().unwrap();
        assert!(matches!(err, Error::Route { path, .. } if path == "GET /"));
    }
}
