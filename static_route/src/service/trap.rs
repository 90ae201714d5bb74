//! Defines functionality for processing a request and trapping errors and panics in response
//! generation.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::FutureExt;
use hyper::{Body, Response, StatusCode};
use log::{error, info};

use crate::handler::{Handler, HandlerError, HandlerResult, IntoResponse, NewHandler};
use crate::state::{request_id, State};

type ServiceFuture = Pin<Box<dyn Future<Output = anyhow::Result<Response<Body>>> + Send>>;

/// Instantiates a `Handler` from the given `NewHandler`, and invokes it with the request. If a
/// panic occurs from `NewHandler::new_handler` or `Handler::handle`, it is trapped and will result
/// in a `500 Internal Server Error` response.
pub(super) fn call_handler<T>(t: Arc<T>, state: AssertUnwindSafe<State>) -> ServiceFuture
where
    T: NewHandler + 'static,
{
    let started = Instant::now();

    let res = catch_unwind(move || {
        let AssertUnwindSafe(state) = state;

        // The handler is consumed by `handle`, so each request gets a fresh one.
        match t.new_handler() {
            Ok(handler) => handler.handle(state),
            Err(e) => futures_util::future::err((state, HandlerError::from(e))).boxed(),
        }
    });

    match res {
        Ok(f) => AssertUnwindSafe(f)
            .catch_unwind()
            .map(move |result| Ok(finalize(started, result)))
            .boxed(),
        Err(panic) => {
            log_panic(&*panic);
            futures_util::future::ok(panic_response()).boxed()
        }
    }
}

fn finalize(
    started: Instant,
    result: Result<HandlerResult, Box<dyn Any + Send>>,
) -> Response<Body> {
    match result {
        Ok(Ok((state, response))) => {
            info!(
                "[RESPONSE][{}][{:?}][{}][{}µs]",
                request_id(&state),
                response.version(),
                response.status(),
                started.elapsed().as_micros()
            );
            response
        }
        Ok(Err((state, err))) => finalize_error_response(started, state, err),
        Err(panic) => {
            log_panic(&*panic);
            panic_response()
        }
    }
}

fn finalize_error_response(started: Instant, state: State, err: HandlerError) -> Response<Body> {
    error!(
        "[ERROR][{}][Error: {}][{}µs]",
        request_id(&state),
        err.cause(),
        started.elapsed().as_micros()
    );

    err.into_response(&state)
}

fn log_panic(panic: &(dyn Any + Send)) {
    let message = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("a panic occurred while invoking the handler");

    error!("[PANIC][{}]", message);
}

fn panic_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
