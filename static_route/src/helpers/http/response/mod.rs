//! Helpers for HTTP response generation

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode};
use mime::Mime;

use crate::state::{FromState, State};

/// Creates a `Response` object with the given status, content type and body.
///
/// The body is omitted for `HEAD` requests, while the `Content-Type` header is kept.
///
/// # Examples
///
/// ```rust
/// use static_route::helpers::http::response::create_response;
/// use static_route::hyper::{header::CONTENT_TYPE, Body, Response, StatusCode};
/// use static_route::state::State;
///
/// static BODY: &'static [u8] = b"Hello, world!";
///
/// fn handler(state: State) -> (State, Response<Body>) {
///     let response = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, BODY);
///
///     (state, response)
/// }
/// #
/// # let test_server = static_route::test::TestServer::new(|| Ok(handler)).unwrap();
/// # let response = test_server.client().get("http://example.com/").perform().unwrap();
/// # assert_eq!(response.status(), StatusCode::OK);
/// # assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
/// # assert_eq!(&response.read_body().unwrap()[..], BODY);
/// ```
pub fn create_response<B>(state: &State, status: StatusCode, mime: Mime, body: B) -> Response<Body>
where
    B: Into<Body>,
{
    let mut res = create_empty_response(state, status);

    // The content type is always a valid header value
    if let Ok(content_type) = HeaderValue::from_str(mime.as_ref()) {
        res.headers_mut().insert(CONTENT_TYPE, content_type);
    }

    if *Method::borrow_from(state) != Method::HEAD {
        *res.body_mut() = body.into();
    }

    res
}

/// Produces a simple empty `Response` with the provided status.
///
/// ```rust
/// use static_route::helpers::http::response::create_empty_response;
/// use static_route::hyper::{Body, Response, StatusCode};
/// use static_route::state::State;
///
/// fn handler(state: State) -> (State, Response<Body>) {
///     let resp = create_empty_response(&state, StatusCode::NO_CONTENT);
///
///     (state, resp)
/// }
/// #
/// # let test_server = static_route::test::TestServer::new(|| Ok(handler)).unwrap();
/// # let response = test_server.client().get("http://example.com/").perform().unwrap();
/// # assert_eq!(response.status(), StatusCode::NO_CONTENT);
/// # assert!(response.read_body().unwrap().is_empty());
/// ```
pub fn create_empty_response(_state: &State, status: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = status;
    res
}
