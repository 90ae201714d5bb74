//! The peer address of the connection a request arrived on.

use std::net::SocketAddr;

use crate::state::{State, StateData};

struct ClientAddr(SocketAddr);

impl StateData for ClientAddr {}

pub(crate) fn put_client_addr(state: &mut State, addr: SocketAddr) {
    state.put(ClientAddr(addr))
}

/// The address of the client that sent the request, when the connection reported one.
///
/// `TestServer` requests come from `127.0.0.1:10000`.
pub fn client_addr(state: &State) -> Option<SocketAddr> {
    state.try_borrow::<ClientAddr>().map(|ClientAddr(addr)| *addr)
}
