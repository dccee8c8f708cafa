//! Core application primitives (HTTP boundary)

pub mod http;

pub use http::*;
