//! Helpers for HTTP request handling and response generation

pub mod response;
