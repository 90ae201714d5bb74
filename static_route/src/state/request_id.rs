//! The id that prefixes every log line written for a request.

use hyper::header::HeaderMap;
use log::trace;
use uuid::Uuid;

use crate::state::{FromState, State, StateData};

const X_REQUEST_ID: &str = "x-request-id";

pub(super) struct RequestId(String);

impl StateData for RequestId {}

/// Stores the id for the request in `state`, unless it already has one, and returns it.
///
/// A printable `X-Request-ID` header sent by the client (or a proxy in front of the server) is
/// used verbatim, so log lines can be correlated across services. Otherwise a v4 UUID is
/// generated.
pub(crate) fn set_request_id(state: &mut State) -> &str {
    if !state.has::<RequestId>() {
        let id = match forwarded_id(HeaderMap::borrow_from(state)) {
            Some(id) => {
                trace!("[{}] request id taken from X-Request-ID", id);
                id
            }
            None => {
                let id = Uuid::new_v4().hyphenated().to_string();
                trace!("[{}] request id generated", id);
                id
            }
        };
        state.put(RequestId(id));
    }

    request_id(state)
}

fn forwarded_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// The id of the current request.
///
/// # Panics
///
/// If `state` wasn't built by `State::from_request`. Handlers always receive a `State` with an id.
pub fn request_id(state: &State) -> &str {
    match state.try_borrow::<RequestId>() {
        Some(RequestId(id)) => id.as_str(),
        None => panic!("RequestId must be populated before application code is invoked"),
    }
}
