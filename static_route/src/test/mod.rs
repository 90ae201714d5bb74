//! Contains helpers for testing applications without binding a socket.
//!
//! ```rust
//! # use static_route::handler::FileHandler;
//! # use static_route::hyper::StatusCode;
//! # use static_route::router::builder::*;
//! use static_route::test::TestServer;
//!
//! # fn main() -> static_route::anyhow::Result<()> {
//! let files = FileHandler::new("resources/test/public")?;
//! let router = build_router(files, |route| {
//!     route.get_or_head("/login").to_static("index.html");
//! });
//!
//! let test_server = TestServer::new(router)?;
//! let response = test_server
//!     .client()
//!     .get("http://localhost/login")
//!     .perform()?;
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert!(response.read_utf8_body()?.contains("<html>"));
//! # Ok(())
//! # }
//! ```


use std::convert::TryFrom;
use std::future::Future;
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use hyper::header::CONTENT_TYPE;
use hyper::service::Service;
use hyper::{body, http, Body, Method, Request, Response, Uri};
use tokio::runtime::Runtime;

use crate::handler::NewHandler;
use crate::service::AppService;

pub use self::request::TestRequest;

type ResponseFuture = Pin<Box<dyn Future<Output = anyhow::Result<Response<Body>>> + Send>>;

struct TestServerData {
    runtime: Runtime,
    timeout: Duration,
    client_addr: SocketAddr,
    dispatch: Box<dyn Fn(Request<Body>, SocketAddr) -> ResponseFuture + Send + Sync>,
}

/// The `TestServer` type, which is used as a harness when writing test cases for applications.
///
/// Requests are passed to the application in memory, through the same service used by
/// `bind_server`, on a runtime owned by the `TestServer`.
#[derive(Clone)]
pub struct TestServer {
    data: Arc<TestServerData>,
}

impl TestServer {
    /// Creates a `TestServer` instance for the `Handler` spawned by `new_handler`. Requests time
    /// out after 10 seconds.
    pub fn new<NH>(new_handler: NH) -> anyhow::Result<TestServer>
    where
        NH: NewHandler + 'static,
    {
        TestServer::with_timeout(new_handler, 10)
    }

    /// Sets the request timeout to `timeout` seconds and returns a new `TestServer`.
    pub fn with_timeout<NH>(new_handler: NH, timeout: u64) -> anyhow::Result<TestServer>
    where
        NH: NewHandler + 'static,
    {
        let runtime = Runtime::new()?;
        let service = AppService::new(new_handler);

        let dispatch = move |request: Request<Body>, client_addr: SocketAddr| -> ResponseFuture {
            service.connect(client_addr).call(request)
        };

        Ok(TestServer {
            data: Arc::new(TestServerData {
                runtime,
                timeout: Duration::from_secs(timeout),
                client_addr: "127.0.0.1:10000".parse()?,
                dispatch: Box::new(dispatch),
            }),
        })
    }

    /// Returns a client connected to the `TestServer`. The `TestClient` can be used to make
    /// requests via the server.
    pub fn client(&self) -> TestClient {
        TestClient {
            test_server: self.clone(),
        }
    }

    /// Runs the given future on the runtime owned by this `TestServer`.
    pub fn run_future<F, O>(&self, future: F) -> O
    where
        F: Future<Output = O>,
    {
        self.data.runtime.block_on(future)
    }

    /// Passes `request` to the application, without waiting for the response. The returned future
    /// can be awaited in `run_future`, alongside other requests.
    pub fn dispatch(&self, request: Request<Body>) -> ResponseFuture {
        (self.data.dispatch)(request, self.data.client_addr)
    }

    fn run_request(&self, request: Request<Body>) -> anyhow::Result<Response<Body>> {
        let timeout = self.data.timeout;
        let response = self.dispatch(request);

        self.run_future(async move {
            match tokio::time::timeout(timeout, response).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!("timed out")),
            }
        })
    }

    fn read_body(&self, response: Response<Body>) -> anyhow::Result<Vec<u8>> {
        let bytes = self.run_future(body::to_bytes(response.into_body()))?;
        Ok(bytes.to_vec())
    }
}

/// Client interface for issuing requests to a `TestServer`.
pub struct TestClient {
    test_server: TestServer,
}

impl TestClient {
    /// Begin constructing a HEAD request using this `TestClient`.
    pub fn head<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::HEAD, uri)
    }

    /// Begin constructing a GET request using this `TestClient`.
    pub fn get<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::GET, uri)
    }

    /// Begin constructing an OPTIONS request using this `TestClient`.
    pub fn options<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::OPTIONS, uri)
    }

    /// Begin constructing a POST request using this `TestClient`.
    pub fn post<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::POST, uri, body, mime)
    }

    /// Begin constructing a DELETE request using this `TestClient`.
    pub fn delete<U>(&self, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::DELETE, uri)
    }

    /// Begin constructing a request with the given HTTP method and URI.
    pub fn build_request<U>(&self, method: Method, uri: U) -> TestRequest<'_>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        TestRequest::new(self, method, uri)
    }

    /// Begin constructing a request with the given HTTP method, URI and body.
    pub fn build_request_with_body<B, U>(
        &self,
        method: Method,
        uri: U,
        body: B,
        mime: mime::Mime,
    ) -> TestRequest<'_>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        let mut request = self.build_request(method, uri);

        {
            let headers = request.headers_mut();
            headers.insert(CONTENT_TYPE, mime.to_string().parse().unwrap());
        }

        *request.body_mut() = body.into();

        request
    }

    fn perform(&self, request: Request<Body>) -> anyhow::Result<TestResponse> {
        let response = self.test_server.run_request(request)?;
        Ok(TestResponse {
            response,
            reader: self.test_server.clone(),
        })
    }
}

/// Wrapping struct for the `Response` returned by a `TestClient`. Provides access to the
/// `Response` value via the `Deref`, `DerefMut` traits, and also provides a function for reading
/// the body of the response.
pub struct TestResponse {
    response: Response<Body>,
    reader: TestServer,
}

impl Deref for TestResponse {
    type Target = Response<Body>;

    fn deref(&self) -> &Response<Body> {
        &self.response
    }
}

impl DerefMut for TestResponse {
    fn deref_mut(&mut self) -> &mut Response<Body> {
        &mut self.response
    }
}

impl std::fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestResponse")
            .field("response", &self.response)
            .finish()
    }
}

impl TestResponse {
    /// Awaits the body of the underlying `Response`, and returns it.
    pub fn read_body(self) -> anyhow::Result<Vec<u8>> {
        self.reader.read_body(self.response)
    }

    /// Awaits the UTF-8 encoded body of the underlying `Response`, and returns the `String`.
    pub fn read_utf8_body(self) -> anyhow::Result<String> {
        let buf = self.read_body()?;
        let s = String::from_utf8(buf)?;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::future::{self, FutureExt};
    use hyper::header::{HeaderValue, USER_AGENT};
    use hyper::StatusCode;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::handler::{Handler, HandlerFuture, IntoHandlerFuture};
    use crate::helpers::http::response::create_response;
    use crate::state::{client_addr, FromState, State};

    #[derive(Clone)]
    struct TestHandler {
        response: String,
    }

    impl Handler for TestHandler {
        fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
            let path = Uri::borrow_from(&state).path().to_owned();
            match path.as_str() {
                "/" => {
                    let response = create_response(
                        &state,
                        StatusCode::OK,
                        mime::TEXT_PLAIN,
                        self.response.clone(),
                    );
                    (state, response).into_handler_future()
                }
                "/timestamp" => {
                    let nanos = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_nanos();
                    let response = create_response(
                        &state,
                        StatusCode::OK,
                        mime::TEXT_PLAIN,
                        format!("time: {}", nanos),
                    );
                    (state, response).into_handler_future()
                }
                "/myaddr" => {
                    let body = format!("{}", client_addr(&state).unwrap());
                    let response = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, body);
                    (state, response).into_handler_future()
                }
                "/user-agent" => {
                    let agent = hyper::HeaderMap::borrow_from(&state)
                        .get(USER_AGENT)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("none")
                        .to_owned();
                    let response =
                        create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, agent);
                    (state, response).into_handler_future()
                }
                "/never" => future::pending().boxed(),
                _ => unreachable!(),
            }
        }
    }

    impl NewHandler for TestHandler {
        type Instance = Self;

        fn new_handler(&self) -> anyhow::Result<Self> {
            Ok(self.clone())
        }
    }

    #[test]
    fn serves_requests() {
        let ticks = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let new_service = TestHandler {
            response: format!("time: {}", ticks),
        };

        let test_server = TestServer::new(new_service).unwrap();
        let response = test_server
            .client()
            .get("http://localhost/")
            .perform()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let buf = response.read_utf8_body().unwrap();
        assert_eq!(buf, format!("time: {}", ticks));
    }

    #[test]
    fn times_out() {
        let new_service = TestHandler {
            response: String::new(),
        };

        let test_server = TestServer::with_timeout(new_service, 1).unwrap();
        let res = test_server
            .client()
            .get("http://localhost/never")
            .perform();

        match res {
            Err(e) => assert_eq!(e.to_string(), "timed out"),
            Ok(_) => panic!("expected timeout"),
        }
    }

    #[test]
    fn sets_client_addr() {
        let new_service = TestHandler {
            response: String::new(),
        };

        let test_server = TestServer::new(new_service).unwrap();
        let response = test_server
            .client()
            .get("http://localhost/myaddr")
            .perform()
            .unwrap();

        assert_eq!(response.read_utf8_body().unwrap(), "127.0.0.1:10000");
    }

    #[test]
    fn passes_request_headers() {
        let new_service = TestHandler {
            response: String::new(),
        };

        let test_server = TestServer::new(new_service).unwrap();
        let response = test_server
            .client()
            .get("http://localhost/user-agent")
            .with_header(USER_AGENT, HeaderValue::from_static("tests/1.0"))
            .perform()
            .unwrap();

        assert_eq!(response.read_utf8_body().unwrap(), "tests/1.0");
    }

    #[test]
    fn dispatches_concurrently() {
        let new_service = TestHandler {
            response: String::new(),
        };

        let test_server = TestServer::new(new_service).unwrap();
        let client = test_server.client();
        let requests = (0..8).map(|_| {
            test_server.dispatch(client.get("http://localhost/timestamp").into_request())
        });

        let responses = test_server.run_future(future::join_all(requests));
        for response in responses {
            assert_eq!(response.unwrap().status(), StatusCode::OK);
        }
    }
}
