use crate::state::{State, StateData};

/// Borrows a request value by its type, e.g. `Uri::borrow_from(&state)`.
///
/// ```rust
/// use static_route::hyper::Method;
/// use static_route::state::{FromState, State};
///
/// fn is_head(state: &State) -> bool {
///     Method::try_borrow_from(state) == Some(&Method::HEAD)
/// }
/// #
/// # State::with_new(|state| {
/// #     assert!(!is_head(state));
/// #     state.put(Method::HEAD);
/// #     assert!(is_head(state));
/// # });
/// ```
pub trait FromState: StateData + Sized {
    /// The value of this type, if one is stored.
    fn try_borrow_from(state: &State) -> Option<&Self>;

    /// The value of this type.
    ///
    /// # Panics
    ///
    /// If `Self` is not present in `State`. Values taken from the request (`Method`, `Uri`,
    /// `Version`, `HeaderMap` and `Body`) are always present for handlers.
    fn borrow_from(state: &State) -> &Self;
}

impl<T> FromState for T
where
    T: StateData,
{
    fn try_borrow_from(state: &State) -> Option<&Self> {
        state.try_borrow()
    }

    fn borrow_from(state: &State) -> &Self {
        state.borrow()
    }
}
