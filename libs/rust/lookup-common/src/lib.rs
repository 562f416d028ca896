//! Shared library for cross-cutting concerns in keyvault-lookup.
//!
//! This crate provides centralized implementations for:
//! - HTTP error types with not-found classification
//! - HTTP client configuration and building
//! - A narrow request/response transport trait with a reqwest implementation
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::{HttpError, HttpResult};
pub use http::{
    HttpConfig, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, build_http_client,
};
pub use tracing_config::{TracingConfig, init_tracing};
