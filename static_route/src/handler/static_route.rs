//! Defines `StaticRoute`, a handler which answers every request with one fixed file.
//!
//! Routing a path to a `StaticRoute` keeps it a regular route: it can be named, the router can
//! build its path, and it shows up in `Router::route_table` as `static('<path>')`. The response
//! itself is produced by the shared `ServeFile` collaborator, so caching headers, conditional
//! requests and compressed variants behave exactly as for any other public file.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::pin::Pin;
use std::sync::Arc;

use log::trace;

use crate::handler::assets::ServeFile;
use crate::handler::{Handler, HandlerFuture, NewHandler};
use crate::state::{request_id, State};

/// Serves the file at `path`, relative to the public directory, whatever the request path was.
///
/// The file is not looked up until a request arrives; a missing file produces the collaborator's
/// `404 Not Found` on every request rather than an error at startup.
///
/// ```rust
/// use static_route::handler::{static_file, FileHandler};
///
/// let files = FileHandler::new("resources/test/public").unwrap();
/// let route = static_file("index.html", files);
///
/// assert_eq!(route.path(), "index.html");
/// assert_eq!(route.to_string(), "static('index.html')");
/// ```
#[derive(Clone)]
pub struct StaticRoute {
    path: String,
    files: Arc<dyn ServeFile>,
}

impl StaticRoute {
    /// Creates a `StaticRoute` for `path`, answered by `files`.
    pub fn new<P>(path: P, files: Arc<dyn ServeFile>) -> StaticRoute
    where
        P: Into<String>,
    {
        StaticRoute {
            path: path.into(),
            files,
        }
    }

    /// The file served by this route, relative to the public directory.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Creates a `StaticRoute` for `path`, to be used as the target of a route.
///
/// Inside `build_router`, `DrawRoutes::static_file` and `DefineSingleRoute::to_static` do the
/// same with the router's own `FileHandler`.
pub fn static_file<P, F>(path: P, files: F) -> StaticRoute
where
    P: Into<String>,
    F: ServeFile + 'static,
{
    StaticRoute::new(path, Arc::new(files))
}

impl Display for StaticRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "static('{}')", self.path)
    }
}

impl fmt::Debug for StaticRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRoute")
            .field("path", &self.path)
            .finish()
    }
}

impl NewHandler for StaticRoute {
    type Instance = Self;

    fn new_handler(&self) -> anyhow::Result<Self::Instance> {
        Ok(self.clone())
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(self.to_string())
    }
}

impl Handler for StaticRoute {
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        trace!("[{}] {} handling request", request_id(&state), self);
        self.files.serve(&self.path, state)
    }
}
