use hyper::Method;

use crate::handler::StaticRoute;
use crate::router::builder::{RouterBuilder, SingleRouteBuilder};

/// Defines functions used by a builder to determine which request paths will be dispatched to a
/// route. This trait is implemented by the top-level `RouterBuilder`.
pub trait DrawRoutes {
    /// Creates a route which matches `GET` and `HEAD` requests to the given path.
    ///
    /// ```rust
    /// # use static_route::handler::FileHandler;
    /// # use static_route::hyper::{Method, StatusCode};
    /// # use static_route::router::builder::*;
    /// # use static_route::test::TestServer;
    /// # let files = FileHandler::new("resources/test/public").unwrap();
    /// let router = build_router(files, |route| {
    ///     route.get_or_head("/index").to_static("index.html");
    /// });
    /// #
    /// # assert_eq!(router.routes()[0].methods, vec![Method::GET, Method::HEAD]);
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client().head("http://localhost/index").perform().unwrap();
    /// # assert_eq!(response.status(), StatusCode::OK);
    /// ```
    fn get_or_head<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::GET, Method::HEAD], path)
    }

    /// Creates a route which matches only `GET` requests to the given path.
    fn get<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::GET], path)
    }

    /// Creates a route which matches `HEAD` requests to the given path.
    fn head<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::HEAD], path)
    }

    /// Creates a route which matches `POST` requests to the given path.
    fn post<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::POST], path)
    }

    /// Creates a route which matches `PUT` requests to the given path.
    fn put<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::PUT], path)
    }

    /// Creates a route which matches `PATCH` requests to the given path.
    fn patch<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::PATCH], path)
    }

    /// Creates a route which matches `DELETE` requests to the given path.
    fn delete<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::DELETE], path)
    }

    /// Creates a route which matches `OPTIONS` requests to the given path.
    fn options<'b>(&'b mut self, path: &str) -> SingleRouteBuilder<'b> {
        self.request(vec![Method::OPTIONS], path)
    }

    /// Creates a single route which matches any requests to the given `path` with one of the
    /// given `methods`. The `path` can contain `:name` segments, whose values are stored in
    /// `State` as `RouteParams`.
    ///
    /// ```rust
    /// # use static_route::handler::FileHandler;
    /// # use static_route::hyper::{Method, StatusCode};
    /// # use static_route::router::builder::*;
    /// # use static_route::test::TestServer;
    /// # let files = FileHandler::new("resources/test/public").unwrap();
    /// let router = build_router(files, |route| {
    ///     route
    ///         .request(vec![Method::GET, Method::HEAD, Method::OPTIONS], "/docs/:page")
    ///         .to_static("doc.html");
    /// });
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client().options("http://localhost/docs/intro").perform().unwrap();
    /// # assert_eq!(response.status(), StatusCode::OK);
    /// ```
    fn request<'b>(&'b mut self, methods: Vec<Method>, path: &str) -> SingleRouteBuilder<'b> {
        let builder = self.router_builder();
        let files = builder.files.clone();
        SingleRouteBuilder::new(&mut builder.routes, files, methods, path)
    }

    /// Creates a `StaticRoute` for `path`, answered by this builder's file handler, for use with
    /// `DefineSingleRoute::to_new_handler`.
    fn static_file(&mut self, path: &str) -> StaticRoute {
        StaticRoute::new(path, self.router_builder().files.clone())
    }

    /// Returns the builder which collects the drawn routes.
    #[doc(hidden)]
    fn router_builder(&mut self) -> &mut RouterBuilder;
}

impl DrawRoutes for RouterBuilder {
    fn router_builder(&mut self) -> &mut RouterBuilder {
        self
    }
}
