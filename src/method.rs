//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 methods plus `PURGE`, which caches such as nginx and
//! Varnish use for invalidation. Anything else is rejected by the server with
//! `501 Not Implemented` before it reaches the pipeline.
//!
//! A route may answer to several methods at once; see [`IntoMethods`].

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Purge,
    Put,
    Trace,
}

const ALL: [Method; 10] = [
    Method::Connect,
    Method::Delete,
    Method::Get,
    Method::Head,
    Method::Options,
    Method::Patch,
    Method::Post,
    Method::Purge,
    Method::Put,
    Method::Trace,
];

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Purge   => "PURGE",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Route method sets ─────────────────────────────────────────────────────────

/// One or several methods a route answers to.
///
/// ```rust
/// # use mono::{Method, Mono, Request};
/// # async fn page(_: Request) -> &'static str { "" }
/// let mut app = Mono::new();
/// app.add_route(Method::Get, "/", page);
/// app.add_route([Method::Get, Method::Post], "/form", page);
/// ```
pub trait IntoMethods {
    fn into_methods(self) -> Vec<Method>;
}

impl IntoMethods for Method {
    fn into_methods(self) -> Vec<Method> { vec![self] }
}

impl<const N: usize> IntoMethods for [Method; N] {
    fn into_methods(self) -> Vec<Method> { self.to_vec() }
}

impl IntoMethods for &[Method] {
    fn into_methods(self) -> Vec<Method> { self.to_vec() }
}

impl IntoMethods for Vec<Method> {
    fn into_methods(self) -> Vec<Method> { self }
}
