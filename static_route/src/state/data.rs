use std::any::Any;

use hyper::{Body, HeaderMap, Method, Uri, Version};

/// A marker trait for types that can be stored in `State`.
///
/// ```rust
/// use static_route::state::{FromState, State, StateData};
///
/// struct MyStateData {
///     x: u32,
/// }
///
/// impl StateData for MyStateData {}
///
/// # State::with_new(|state| {
/// state.put(MyStateData { x: 1 });
/// assert_eq!(MyStateData::borrow_from(state).x, 1);
/// # });
/// ```
pub trait StateData: Any + Send {}

impl StateData for Body {}
impl StateData for Method {}
impl StateData for Uri {}
impl StateData for Version {}
impl StateData for HeaderMap {}
