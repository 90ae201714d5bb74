//! Defines a builder API for constructing a `Router`.

mod draw;
mod single;

use std::sync::Arc;

use hyper::Method;

use crate::handler::ServeFile;
use crate::router::route::{parse_pattern, Route, Segment};
use crate::router::Router;

pub use self::draw::DrawRoutes;
pub use self::single::DefineSingleRoute;

/// Builds a `Router` using the provided closure. Routes are defined using the `RouterBuilder`
/// value passed to the closure, and the `Router` is constructed before returning.
///
/// `files` answers every static route defined with `to_static` or `DrawRoutes::static_file`.
///
/// ```rust
/// use static_route::handler::FileHandler;
/// use static_route::hyper::StatusCode;
/// use static_route::router::builder::*;
/// use static_route::router::Router;
/// use static_route::test::TestServer;
///
/// fn router() -> Router {
///     let files = FileHandler::new("resources/test/public").unwrap();
///
///     build_router(files, |route| {
///         route.get_or_head("/login").name("login").to_static("index.html");
///         route.get_or_head("/register").name("register").to_static("index.html");
///     })
/// }
///
/// let test_server = TestServer::new(router()).unwrap();
/// let response = test_server
///     .client()
///     .get("http://localhost/register")
///     .perform()
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// ```
///
/// # Panics
///
/// When two routes are given the same name, or a pattern has an unnamed `:` segment.
pub fn build_router<S, F>(files: S, f: F) -> Router
where
    S: ServeFile + 'static,
    F: FnOnce(&mut RouterBuilder),
{
    let mut builder = RouterBuilder {
        routes: Vec::new(),
        files: Arc::new(files),
    };

    f(&mut builder);

    Router::new(builder.routes)
}

/// The top-level builder which is created by `build_router` and passed to the provided closure.
/// See the `build_router` function and the `DrawRoutes` trait for usage.
pub struct RouterBuilder {
    routes: Vec<Route>,
    files: Arc<dyn ServeFile>,
}

/// A builder for a single route, created by the `DrawRoutes` methods and completed by one of
/// the `DefineSingleRoute` methods.
#[must_use = "the route is only added by one of the `DefineSingleRoute::to*` methods"]
pub struct SingleRouteBuilder<'a> {
    routes: &'a mut Vec<Route>,
    files: Arc<dyn ServeFile>,
    name: Option<String>,
    methods: Vec<Method>,
    pattern: String,
    segments: Vec<Segment>,
}

impl<'a> SingleRouteBuilder<'a> {
    fn new(
        routes: &'a mut Vec<Route>,
        files: Arc<dyn ServeFile>,
        methods: Vec<Method>,
        pattern: &str,
    ) -> Self {
        SingleRouteBuilder {
            routes,
            files,
            name: None,
            methods,
            pattern: pattern.to_owned(),
            segments: parse_pattern(pattern),
        }
    }
}
