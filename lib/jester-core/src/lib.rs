//! Core types and traits for the jester REST client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Error`], [`ErrorKind`] and [`Result`] - Classified errors
//! - [`wrap`], [`add_context`] and [`classify`] - Helpers over any error
//! - [`UrlTemplate`] and [`build_url`] - Named URL templates
//! - [`Request`], [`RequestBuilder`] and [`Query`] - Outbound requests
//! - [`Response`] and [`StatusFamily`] - Buffered responses
//! - [`Backoff`] - Exponential retry delays
//! - [`HttpClient`] - Transport trait implemented by `jester`

mod backoff;
mod body;
mod client;
mod error;
mod method;
mod request;
mod response;
mod url_template;

pub use backoff::Backoff;
pub use body::{from_json, to_json};
pub use client::HttpClient;
pub use error::{BoxError, Error, ErrorContext, ErrorKind, Result, add_context, classify, wrap};
pub use method::Method;
pub use request::{Query, Request, RequestBuilder};
pub use response::{Response, StatusFamily};
pub use url_template::{TemplateError, UrlParams, UrlTemplate, build_url};
