//! static_route &ndash; route table entries that serve one file from the public asset directory.
//!
//! A [`StaticRoute`](handler::static_route::StaticRoute) is registered in the router like any
//! other handler, so it gets a route name, a named route helper and a line in the route listing.
//! Every request it receives is answered by the shared [`FileHandler`](handler::FileHandler),
//! which takes care of content types, conditional requests, byte ranges, precompressed variants
//! and the `Cache-Control` policy configured for the public directory.
//!
//! ```rust,no_run
//! use static_route::handler::{FileHandler, FileOptions};
//! use static_route::router::builder::*;
//!
//! let files = FileHandler::new(
//!     FileOptions::new("public")
//!         .with_cache_control("public, max-age=3600")
//!         .with_gzip(true)
//!         .build(),
//! )
//! .unwrap();
//!
//! let router = build_router(files, |route| {
//!     route.get_or_head("/login").name("login").to_static("index.html");
//!     route.get_or_head("/register").name("register").to_static("index.html");
//! });
//!
//! println!("{}", router.route_table());
//! static_route::start("127.0.0.1:7878", router).unwrap();
//! ```
#![doc(html_root_url = "https://docs.rs/static_route/0.1.0")] // Update when changed in Cargo.toml
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(elided_lifetimes_in_paths, unsafe_code)]
#![doc(test(no_crate_inject, attr(deny(warnings))))]

pub mod config;
pub mod handler;
pub mod helpers;
pub mod router;
mod service;
pub mod state;

/// Test utilities for static_route applications.
#[cfg(any(test, feature = "testing"))]
pub mod test;

/// Re-export anyhow
pub use anyhow;
/// Re-export hyper
pub use hyper;
/// Re-export mime
pub use mime;

use std::io;
use std::net::ToSocketAddrs;
use std::sync::Arc;

use hyper::server::conn::Http;
use log::{debug, error, info};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::{self, Runtime};

use crate::handler::NewHandler;
use crate::service::AppService;

/// The error that can occur when starting the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartError {
    /// I/O error.
    #[error("I/O Error: {0}")]
    IoError(#[from] io::Error),

    /// The listener address did not resolve to any socket address.
    #[error("unable to resolve listener address")]
    Unresolved,
}

/// Starts an application on plain HTTP, using one worker thread per CPU.
pub fn start<NH, A>(addr: A, new_handler: NH) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    start_with_num_threads(addr, new_handler, num_cpus::get())
}

/// Starts an application with a designated number of threads.
pub fn start_with_num_threads<NH, A>(
    addr: A,
    new_handler: NH,
    threads: usize,
) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    let runtime = new_runtime(threads)?;
    runtime.block_on(init_server(addr, new_handler))
}

/// Returns a `Future` which binds the listener and serves the application on it.
///
/// This is used by `start`, but exposed for callers that manage their own runtime or need to
/// race the server against a shutdown signal.
pub async fn init_server<NH, A>(addr: A, new_handler: NH) -> Result<(), StartError>
where
    NH: NewHandler + 'static,
    A: ToSocketAddrs + 'static + Send,
{
    let listener = tcp_listener(addr).await?;
    let addr = listener.local_addr()?;

    info! {
        target: "static_route::start",
        " listening on http://{}", addr
    }

    bind_server(listener, new_handler).await
}

/// Serves every connection accepted by `listener` with the given `NewHandler`.
///
/// Accept errors are logged and the loop carries on, so the returned future never resolves.
pub async fn bind_server<NH>(listener: TcpListener, new_handler: NH) -> !
where
    NH: NewHandler + 'static,
{
    let protocol = Arc::new(Http::new());
    let app_service = AppService::new(new_handler);

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(ok) => ok,
            Err(err) => {
                error!("Socket Error: {}", err);
                continue;
            }
        };

        let service = app_service.connect(addr);
        let accepted_protocol = protocol.clone();

        tokio::spawn(async move {
            if let Err(err) = accepted_protocol.serve_connection(socket, service).await {
                debug!("[{}] connection error: {}", addr, err);
            }
        });
    }
}

fn new_runtime(threads: usize) -> io::Result<Runtime> {
    runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name("static-route-worker")
        .enable_all()
        .build()
}

async fn tcp_listener<A>(addr: A) -> Result<TcpListener, StartError>
where
    A: ToSocketAddrs + 'static,
{
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or(StartError::Unresolved)?;

    Ok(TcpListener::bind(addr).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use hyper::{Body, Response};

    fn handler(_: State) -> (State, Response<Body>) {
        unimplemented!()
    }

    #[test]
    fn test_error_on_invalid_port() {
        let res = start("0.0.0.0:99999", || Ok(handler));
        assert!(res.is_err());
    }
}
