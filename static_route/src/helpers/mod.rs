//! Helpers for handlers and application code.

pub mod http;
