//! Transport trait.
//!
//! [`HttpClient`] performs exactly one HTTP exchange. Retries, status
//! classification and decoding live above it, in the REST client, so a
//! scripted implementation is enough to drive those layers in tests.

use std::future::Future;

use crate::{Request, Response, Result};

/// Executes a single HTTP request.
///
/// Any status code is a successful exchange: implementations only fail when
/// no response was obtained.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns a `NoType` error if no response was obtained:
    /// - Malformed URL
    /// - Connection or TLS errors
    /// - Timeouts
    /// - Body read errors
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<C: HttpClient> HttpClient for &C {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}
