//! Defines the `AppService` type which is used to wrap an application and interface with hyper.

use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll};

use hyper::service::Service;
use hyper::{Body, Request, Response};

use crate::handler::NewHandler;
use crate::state::State;

mod trap;

/// Wraps a `NewHandler` which will be used to serve requests. Used in `bind_server` to bind
/// incoming connections to `ConnectedService` values.
pub(crate) struct AppService<T>
where
    T: NewHandler + 'static,
{
    handler: Arc<T>,
}

impl<T> AppService<T>
where
    T: NewHandler + 'static,
{
    pub(crate) fn new(handler: T) -> AppService<T> {
        AppService {
            handler: Arc::new(handler),
        }
    }

    pub(crate) fn connect(&self, client_addr: SocketAddr) -> ConnectedService<T> {
        ConnectedService {
            handler: self.handler.clone(),
            client_addr,
        }
    }
}

/// An `AppService` which has been connected to a client. The major difference is that a
/// `client_addr` has been assigned (as this isn't available from hyper).
pub(crate) struct ConnectedService<T>
where
    T: NewHandler + 'static,
{
    handler: Arc<T>,
    client_addr: SocketAddr,
}

impl<T> Service<Request<Body>> for ConnectedService<T>
where
    T: NewHandler,
{
    type Response = Response<Body>;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = State::from_request(req, self.client_addr);
        trap::call_handler(self.handler.clone(), AssertUnwindSafe(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::{Method, StatusCode};

    use crate::handler::FileHandler;
    use crate::helpers::http::response::create_empty_response;
    use crate::router::builder::*;

    fn handler(state: State) -> (State, Response<Body>) {
        let res = create_empty_response(&state, StatusCode::ACCEPTED);
        (state, res)
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn new_handler_closure() {
        let service = AppService::new(|| Ok(handler));

        let response = service
            .connect("127.0.0.1:10000".parse().unwrap())
            .call(request("http://localhost/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn router() {
        let files = FileHandler::new("resources/test/public").unwrap();
        let router = build_router(files, |route| {
            route.get("/").to(handler);
            route.get("/index").to_static("index.html");
        });

        let service = AppService::new(router);
        let mut connected = service.connect("127.0.0.1:10000".parse().unwrap());

        let response = connected.call(request("http://localhost/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = connected
            .call(request("http://localhost/index"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
