use std::panic::RefUnwindSafe;

use log::trace;

use crate::handler::{Handler, NewHandler, StaticRoute};
use crate::router::builder::SingleRouteBuilder;
use crate::router::route::{DispatcherImpl, Route};

/// Describes the API for defining a single route, after determining which request paths will be
/// dispatched here. The API here uses chained function calls to build and add the route into the
/// `RouterBuilder` which created it.
///
/// ```rust
/// # use static_route::handler::FileHandler;
/// # use static_route::hyper::StatusCode;
/// # use static_route::router::builder::*;
/// # use static_route::state::State;
/// # use static_route::test::TestServer;
/// #
/// fn health(state: State) -> (State, &'static str) {
///     (state, "ok")
/// }
///
/// # let files = FileHandler::new("resources/test/public").unwrap();
/// let router = build_router(files, |route| {
///     route.get("/health").to(health);
///     route.get_or_head("/login").name("login").to_static("index.html");
/// });
/// #
/// # let test_server = TestServer::new(router).unwrap();
/// # let response = test_server.client().get("http://localhost/health").perform().unwrap();
/// # assert_eq!(response.status(), StatusCode::OK);
/// ```
pub trait DefineSingleRoute: Sized {
    /// Names the route, so that `Router::path_for` can find it.
    ///
    /// Names must be unique within a router; `build_router` panics on a repeated name.
    fn name(self, name: &str) -> Self;

    /// Directs the route to the given `Handler`, automatically creating a `NewHandler` which
    /// copies the `Handler`. This is the easiest option for code which is using bare functions as
    /// `Handler` functions.
    fn to<H>(self, handler: H)
    where
        H: Handler + RefUnwindSafe + Copy + Send + Sync + 'static,
    {
        self.to_new_handler(move || Ok(handler))
    }

    /// Directs the route to the given `NewHandler`. This gives more control over how `Handler`
    /// values are constructed.
    fn to_new_handler<NH>(self, new_handler: NH)
    where
        NH: NewHandler + 'static;

    /// Directs the route to a `StaticRoute` serving `path` from the router's public directory,
    /// whatever path the request was for.
    fn to_static(self, path: &str);
}

impl<'a> DefineSingleRoute for SingleRouteBuilder<'a> {
    fn name(self, name: &str) -> Self {
        SingleRouteBuilder {
            name: Some(name.to_owned()),
            ..self
        }
    }

    fn to_new_handler<NH>(self, new_handler: NH)
    where
        NH: NewHandler + 'static,
    {
        if let Some(name) = &self.name {
            if self
                .routes
                .iter()
                .any(|route| route.name.as_ref() == Some(name))
            {
                panic!("a route named `{}` is already defined", name);
            }
        }

        trace!(
            " adding route {} {:?} to {}",
            self.pattern,
            self.methods,
            new_handler.describe()
        );

        self.routes.push(Route {
            name: self.name,
            methods: self.methods,
            pattern: self.pattern,
            segments: self.segments,
            dispatcher: Box::new(DispatcherImpl::new(new_handler)),
        });
    }

    fn to_static(self, path: &str) {
        let route = StaticRoute::new(path, self.files.clone());
        self.to_new_handler(route)
    }
}
