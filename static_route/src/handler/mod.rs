//! Defines types for handlers, the targets of routes.
//!
//! A function can be used directly as a handler using one of the default implementations of
//! `Handler`, but the trait can also be implemented directly for greater control. The static
//! file handlers in [`assets`] and the [`StaticRoute`] responder are both implemented this way.

use std::borrow::Cow;
use std::future::Future;
use std::panic::RefUnwindSafe;
use std::pin::Pin;

use futures_util::future::{self, FutureExt};
use hyper::{Body, Response, StatusCode};
use mime::{self, Mime};

use crate::helpers::http::response;
use crate::state::State;

pub mod assets;
mod error;
pub mod static_route;

pub use self::assets::{AssetError, FileHandler, FileOptions, ServeFile};
pub use self::error::{HandlerError, MapHandlerError};
pub use self::static_route::{static_file, StaticRoute};

/// A type alias for the value a `HandlerFuture` resolves to.
pub type HandlerResult = std::result::Result<(State, Response<Body>), (State, HandlerError)>;

/// A type alias for the trait objects returned by `Handler::handle`.
///
/// When the `Future` resolves to an error, the `(State, HandlerError)` value is used to generate
/// an appropriate HTTP error response.
pub type HandlerFuture = dyn Future<Output = HandlerResult> + Send;

/// A `Handler` is an asynchronous function, taking a `State` value which represents the request
/// and related runtime state, and returns a future which resolves to a response.
///
/// This represents the common entry point for the parts of an application, implemented by the
/// `Router`, by `FileHandler` and by `StaticRoute`.
///
/// # Implementing `Handler`
///
/// Functions with the signature `fn(State) -> (State, R)` where `R: IntoResponse` implement
/// `Handler` automatically:
///
/// ```rust
/// use static_route::hyper::{Body, Response, StatusCode};
/// use static_route::state::State;
///
/// fn my_handler(state: State) -> (State, Response<Body>) {
///     let response = Response::builder()
///         .status(StatusCode::ACCEPTED)
///         .body(Body::empty())
///         .unwrap();
///     (state, response)
/// }
/// #
/// # let test_server = static_route::test::TestServer::new(|| Ok(my_handler)).unwrap();
/// # let response = test_server.client().get("http://localhost/").perform().unwrap();
/// # assert_eq!(response.status(), StatusCode::ACCEPTED);
/// ```
pub trait Handler: Send {
    /// Handles the request, returning a boxed future which resolves to a response.
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>>;
}

impl<F, R> Handler for F
where
    F: FnOnce(State) -> R + Send,
    R: IntoHandlerFuture,
{
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        self(state).into_handler_future()
    }
}

/// A type which is used to spawn new `Handler` values. When implementing a custom `Handler` type,
/// this is used to define how instances of the `Handler` are created.
///
/// The `NewHandler` is shared by every request routed to it, so it must be safe to use from many
/// threads at once; each request gets its own `Handler` instance from `new_handler`.
///
/// ```rust
/// use std::pin::Pin;
///
/// use static_route::handler::{Handler, HandlerFuture, IntoHandlerFuture, NewHandler};
/// use static_route::hyper::StatusCode;
/// use static_route::helpers::http::response::create_empty_response;
/// use static_route::state::State;
///
/// #[derive(Copy, Clone)]
/// struct MyCustomHandler;
///
/// impl NewHandler for MyCustomHandler {
///     type Instance = Self;
///
///     fn new_handler(&self) -> static_route::anyhow::Result<Self::Instance> {
///         Ok(*self)
///     }
/// }
///
/// impl Handler for MyCustomHandler {
///     fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
///         let response = create_empty_response(&state, StatusCode::NO_CONTENT);
///         (state, response).into_handler_future()
///     }
/// }
/// #
/// # let test_server = static_route::test::TestServer::new(MyCustomHandler).unwrap();
/// # let response = test_server.client().get("http://localhost/").perform().unwrap();
/// # assert_eq!(response.status(), StatusCode::NO_CONTENT);
/// ```
pub trait NewHandler: Send + Sync + RefUnwindSafe {
    /// The type of `Handler` created by the `NewHandler`.
    type Instance: Handler + Send;

    /// Create and return a new `Handler` value.
    fn new_handler(&self) -> anyhow::Result<Self::Instance>;

    /// A human readable label for this handler, shown in route listings.
    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<F, H> NewHandler for F
where
    F: Fn() -> anyhow::Result<H> + Send + Sync + RefUnwindSafe,
    H: Handler + Send,
{
    type Instance = H;

    fn new_handler(&self) -> anyhow::Result<H> {
        self()
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<H>())
    }
}

/// Represents a type which can be converted into the future type returned by a `Handler`.
///
/// This is used to allow functions with different return types to satisfy the `Handler` trait
/// bound via the generic function implementation.
pub trait IntoHandlerFuture {
    /// Converts this value into a boxed future resolving to a state and response.
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>>;
}

impl<T> IntoHandlerFuture for (State, T)
where
    T: IntoResponse,
{
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>> {
        let (state, t) = self;
        let response = t.into_response(&state);
        future::ok((state, response)).boxed()
    }
}

impl IntoHandlerFuture for Pin<Box<HandlerFuture>> {
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>> {
        self
    }
}

/// Represents a type which can be converted to a response. This trait is used in converting the
/// return type of a function into a response.
pub trait IntoResponse {
    /// Converts this value into a `hyper::Response`
    fn into_response(self, state: &State) -> Response<Body>;
}

impl IntoResponse for Response<Body> {
    fn into_response(self, _state: &State) -> Response<Body> {
        self
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self, state: &State) -> Response<Body> {
        match self {
            Ok(res) => res.into_response(state),
            Err(e) => e.into_response(state),
        }
    }
}

impl<B> IntoResponse for (Mime, B)
where
    B: Into<Body>,
{
    fn into_response(self, state: &State) -> Response<Body> {
        (StatusCode::OK, self.0, self.1).into_response(state)
    }
}

impl<B> IntoResponse for (StatusCode, Mime, B)
where
    B: Into<Body>,
{
    fn into_response(self, state: &State) -> Response<Body> {
        response::create_response(state, self.0, self.1, self.2)
    }
}

impl IntoResponse for String {
    fn into_response(self, state: &State) -> Response<Body> {
        (mime::TEXT_PLAIN_UTF_8, self).into_response(state)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self, state: &State) -> Response<Body> {
        (mime::TEXT_PLAIN_UTF_8, self).into_response(state)
    }
}
