//! Defines the `Router` and supporting types.

pub mod builder;
mod route;

use std::fmt::Write;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{self, FutureExt, TryFutureExt};
use hyper::header::{HeaderValue, ALLOW};
use hyper::{Method, StatusCode, Uri};
use log::trace;
use thiserror::Error;

use crate::handler::{Handler, HandlerFuture, IntoResponse, NewHandler};
use crate::helpers::http::response::create_empty_response;
use crate::router::route::{request_segments, Route};
use crate::state::{request_id, FromState, State, StateData};

/// Errors raised when building a path for a named route.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// No route was registered under this name.
    #[error("no route named `{0}`")]
    UnknownRoute(String),
    /// The route pattern needs a parameter which wasn't supplied.
    #[error("route `{route}` needs a value for `:{param}`")]
    MissingParam {
        /// The name of the route.
        route: String,
        /// The missing parameter.
        param: String,
    },
}

/// The values of the `:name` segments matched for the current request, stored in `State` before
/// the route's handler is called.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: Vec<(String, String)>,
}

impl RouteParams {
    pub(crate) fn push(&mut self, name: &str, value: &str) {
        self.params.push((name.to_owned(), value.to_owned()));
    }

    /// The percent-decoded value for the parameter `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All parameters, in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl StateData for RouteParams {}

/// A description of a single route, as listed by `Router::routes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteDescription {
    /// The route name, if one was given.
    pub name: Option<String>,
    /// The methods accepted by the route.
    pub methods: Vec<Method>,
    /// The pattern as it was defined.
    pub pattern: String,
    /// The handler's label, `static('<path>')` for static routes.
    pub target: String,
}

struct RouterData {
    routes: Vec<Route>,
    descriptions: Vec<RouteDescription>,
}

/// Dispatches requests to the first route whose pattern and methods match, and turns errors
/// from the route's handler into responses.
///
/// A path matched by some route which doesn't accept the request method is answered with
/// `405 Method Not Allowed` and an `Allow` header. Anything else unmatched is `404 Not Found`.
///
/// Routers are built with `builder::build_router`.
#[derive(Clone)]
pub struct Router {
    data: Arc<RouterData>,
}

impl Router {
    pub(crate) fn new(routes: Vec<Route>) -> Router {
        let descriptions = routes
            .iter()
            .map(|route| RouteDescription {
                name: route.name.clone(),
                methods: route.methods.clone(),
                pattern: route.pattern.clone(),
                target: route.dispatcher.describe().into_owned(),
            })
            .collect();

        Router {
            data: Arc::new(RouterData {
                routes,
                descriptions,
            }),
        }
    }

    /// The routes of this router, in the order they were defined.
    pub fn routes(&self) -> &[RouteDescription] {
        &self.data.descriptions
    }

    /// Builds the request path of the route called `name`, filling `:name` segments from
    /// `params`. Values are percent-encoded.
    ///
    /// ```rust
    /// # use static_route::handler::FileHandler;
    /// # use static_route::router::builder::*;
    /// # let files = FileHandler::new("resources/test/public").unwrap();
    /// let router = build_router(files, |route| {
    ///     route.get("/users/:id").name("user").to_static("index.html");
    /// });
    ///
    /// assert_eq!(router.path_for("user", &[("id", "a b")]).unwrap(), "/users/a%20b");
    /// ```
    pub fn path_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        self.data
            .routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
            .ok_or_else(|| RouteError::UnknownRoute(name.to_owned()))?
            .path_for(params)
    }

    /// Renders the routes as an aligned table, one route per line.
    ///
    /// ```text
    /// Prefix    Verb      URI Pattern  Target
    /// login     GET|HEAD  /login       static('index.html')
    /// ```
    pub fn route_table(&self) -> String {
        let header = [
            "Prefix".to_owned(),
            "Verb".to_owned(),
            "URI Pattern".to_owned(),
            "Target".to_owned(),
        ];

        let rows: Vec<[String; 4]> = std::iter::once(header)
            .chain(self.routes().iter().map(|route| {
                [
                    route.name.clone().unwrap_or_default(),
                    route
                        .methods
                        .iter()
                        .map(Method::as_str)
                        .collect::<Vec<_>>()
                        .join("|"),
                    route.pattern.clone(),
                    route.target.clone(),
                ]
            }))
            .collect();

        let mut widths = [0; 4];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut table = String::new();
        for row in &rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                // writing to a String cannot fail
                let _ = write!(line, "{:width$}  ", cell, width = widths[i]);
            }
            table.push_str(line.trim_end());
            table.push('\n');
        }
        table
    }

    fn dispatch(&self, mut state: State) -> Pin<Box<HandlerFuture>> {
        let path = Uri::borrow_from(&state).path().to_owned();
        let method = Method::borrow_from(&state).clone();
        let segments = request_segments(&path);

        let mut allow: Vec<Method> = Vec::new();
        for route in &self.data.routes {
            let params = match route.extract(&segments) {
                Some(params) => params,
                None => continue,
            };

            if route.accepts(&method) {
                trace!(
                    "[{}] dispatching to route `{}`",
                    request_id(&state),
                    route.pattern
                );
                state.put(params);
                return route.dispatcher.dispatch(state);
            }

            for method in &route.methods {
                if !allow.contains(method) {
                    allow.push(method.clone());
                }
            }
        }

        let response = if allow.is_empty() {
            trace!("[{}] did not find a matching route", request_id(&state));
            create_empty_response(&state, StatusCode::NOT_FOUND)
        } else {
            trace!("[{}] method {} not allowed", request_id(&state), method);
            let mut response = create_empty_response(&state, StatusCode::METHOD_NOT_ALLOWED);
            let allow = allow
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
            response
        };
        future::ok((state, response)).boxed()
    }
}

impl NewHandler for Router {
    type Instance = Router;

    fn new_handler(&self) -> anyhow::Result<Self::Instance> {
        trace!(" cloning instance");
        Ok(self.clone())
    }

    fn describe(&self) -> std::borrow::Cow<'static, str> {
        "router".into()
    }
}

impl Handler for Router {
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        trace!("[{}] starting", request_id(&state));

        self.dispatch(state)
            .or_else(|(state, err)| {
                trace!(
                    "[{}] converting error into http response: {:?}",
                    request_id(&state),
                    err
                );
                let response = err.into_response(&state);
                future::ok((state, response))
            })
            .boxed()
    }
}
