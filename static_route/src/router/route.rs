//! Defines the single routes held by a `Router`.

use std::borrow::Cow;
use std::panic::RefUnwindSafe;
use std::pin::Pin;

use futures_util::future::{self, FutureExt};
use hyper::Method;
use log::error;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::handler::{Handler, HandlerError, HandlerFuture, NewHandler};
use crate::router::{RouteError, RouteParams};
use crate::state::{request_id, State};

// Characters which may not appear verbatim in a generated path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Static(String),
    Param(String),
}

/// Splits a route pattern into its segments. Empty segments are dropped, so `/login/` and
/// `login` are the same pattern.
///
/// # Panics
///
/// When a parameter segment has no name, e.g. `/users/:`.
pub(crate) fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some("") => panic!("unnamed parameter segment in route pattern `{}`", pattern),
            Some(name) => Segment::Param(name.to_owned()),
            None => Segment::Static(segment.to_owned()),
        })
        .collect()
}

/// Splits a request path into percent-decoded segments.
pub(crate) fn request_segments(path: &str) -> Vec<Cow<'_, str>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
        .collect()
}

/// Type erased dispatch to a `NewHandler`.
pub(crate) trait Dispatcher: RefUnwindSafe + Send + Sync {
    fn dispatch(&self, state: State) -> Pin<Box<HandlerFuture>>;

    fn describe(&self) -> Cow<'static, str>;
}

pub(crate) struct DispatcherImpl<H>
where
    H: NewHandler,
{
    new_handler: H,
}

impl<H> DispatcherImpl<H>
where
    H: NewHandler,
{
    pub(crate) fn new(new_handler: H) -> Self {
        DispatcherImpl { new_handler }
    }
}

impl<H> Dispatcher for DispatcherImpl<H>
where
    H: NewHandler,
{
    fn dispatch(&self, state: State) -> Pin<Box<HandlerFuture>> {
        match self.new_handler.new_handler() {
            Ok(handler) => handler.handle(state),
            Err(e) => {
                error!("[{}] could not create handler: {}", request_id(&state), e);
                future::err((state, HandlerError::from(e))).boxed()
            }
        }
    }

    fn describe(&self) -> Cow<'static, str> {
        self.new_handler.describe()
    }
}

/// A pattern, the methods it accepts and the handler it dispatches to.
pub(crate) struct Route {
    pub(crate) name: Option<String>,
    pub(crate) methods: Vec<Method>,
    pub(crate) pattern: String,
    pub(crate) segments: Vec<Segment>,
    pub(crate) dispatcher: Box<dyn Dispatcher>,
}

impl Route {
    /// Matches the request path against this route's pattern, extracting any parameters.
    pub(crate) fn extract(&self, request: &[Cow<'_, str>]) -> Option<RouteParams> {
        if request.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::default();
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Static(expected) if expected == value => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => params.push(name, value),
            }
        }
        Some(params)
    }

    pub(crate) fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Builds the request path for this route from the given parameter values.
    pub(crate) fn path_for(&self, params: &[(&str, &str)]) -> Result<String, RouteError> {
        if self.segments.is_empty() {
            return Ok("/".to_owned());
        }

        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(value) => path.push_str(value),
                Segment::Param(name) => {
                    let value = params
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| RouteError::MissingParam {
                            route: self.name.clone().unwrap_or_default(),
                            param: name.clone(),
                        })?;
                    path.extend(utf8_percent_encode(value, PATH_SEGMENT));
                }
            }
        }
        Ok(path)
    }
}
