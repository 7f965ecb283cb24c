//! Resilient REST client.
//!
//! [`RestClient::request`] runs one logical call as a bounded series of
//! attempts over an [`HttpClient`]:
//!
//! | Outcome of an attempt | Result |
//! |-----------------------|--------|
//! | no response (URL, connect, timeout, body read) | `NoType`, returned at once |
//! | 2xx / 3xx not followed by the transport | body decoded as JSON, returned (`NoType` if decoding fails) |
//! | 4xx | `BadRequest: "Bad Request: <body>"`, retried |
//! | 5xx | `NotFound: "Not Found: <body>"`, retried |
//! | any other status | `NotFound: "Unknown Response: <body>"`, retried |
//!
//! Between retried attempts the client sleeps for the next
//! [`Backoff`](jester_core::Backoff) delay.
//! When the attempts run out, the last classified error is returned.

use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info_span, warn};

use jester_core::{HttpClient, StatusFamily};

use crate::{
    ClientConfig, Context, Error, ErrorKind, HyperClient, Request, Response, Result, RetryPolicy,
};

/// REST client with retries, exponential backoff and classified errors.
///
/// Generic over the transport so the retry loop can run against any
/// [`HttpClient`]; [`RestClient::new`] uses [`HyperClient`].
#[derive(Debug, Clone)]
pub struct RestClient<C = HyperClient> {
    transport: C,
    name: String,
    retry: RetryPolicy,
}

impl RestClient {
    /// Client over a [`HyperClient`] built from `config` that logs every hop
    /// and follows redirects.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let transport = HyperClient::builder()
            .config(config.clone())
            .with_logging()
            .with_redirects()
            .build();
        Self::with_transport(transport, config)
    }
}

impl<C: HttpClient> RestClient<C> {
    /// Client over an arbitrary transport. Only the name and retry policy of
    /// `config` are used here.
    #[must_use]
    pub fn with_transport(transport: C, config: &ClientConfig) -> Self {
        Self {
            transport,
            name: config.name.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute `request` with retries and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// - `NoType` when no response could be obtained or decoding failed
    /// - `BadRequest` / `NotFound` when every attempt got an error status
    /// - `Canceled` when `ctx` ends before the call completes
    pub async fn request<T: DeserializeOwned>(&self, ctx: &Context, request: Request) -> Result<T> {
        let span = info_span!(
            "rest_request",
            client = %self.name,
            method = %request.method(),
            url = %request.url(),
        );
        self.attempts(ctx, &request).instrument(span).await
    }

    async fn attempts<T: DeserializeOwned>(&self, ctx: &Context, request: &Request) -> Result<T> {
        let max_attempts = self.retry.attempts();
        let mut backoff = self.retry.backoff();
        let mut attempt = 1;

        loop {
            let response = ctx.run(self.transport.execute(request.clone())).await??;

            if response.family().is_ok() {
                backoff.reset();
                debug!(attempt, status = response.status(), "decoding response");
                return response
                    .json()
                    .map_err(|err| err.wrap(format!("unable to decode {} response", self.name)));
            }

            let err = upstream_error(&response)?;
            if attempt >= max_attempts {
                warn!(attempt, error = %err, "giving up");
                return Err(err);
            }

            let delay = backoff.next_delay();
            warn!(
                attempt,
                status = response.status(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying"
            );
            ctx.run(tokio::time::sleep(delay)).await?;
            attempt += 1;
        }
    }
}

/// Classified error for a non-success response.
///
/// Fails with `NoType` when the body is not text.
fn upstream_error(response: &Response) -> Result<Error> {
    let body = response
        .text()
        .map_err(|err| err.wrap(format!("status {}", response.status())))?;

    let (kind, label) = match response.family() {
        StatusFamily::ClientError => (ErrorKind::BadRequest, "Bad Request"),
        StatusFamily::ServerError => (ErrorKind::NotFound, "Not Found"),
        _ => (ErrorKind::NotFound, "Unknown Response"),
    };
    Ok(kind.error(format!("{label}: {body}"), response.status()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response::new(status, HashMap::new(), body.to_string())
    }

    #[test]
    fn client_error_is_bad_request() {
        let err = upstream_error(&response(404, "no such name")).expect("classified");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Bad Request: no such name");
    }

    #[test]
    fn server_error_is_not_found() {
        let err = upstream_error(&response(503, "maintenance")).expect("classified");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Not Found: maintenance");
    }

    #[test]
    fn other_status_is_unknown_response() {
        for status in [101, 600, 999] {
            let err = upstream_error(&response(status, "?")).expect("classified");
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.to_string(), "Unknown Response: ?");
        }
    }

    #[test]
    fn kinds_agree_with_status_table() {
        for status in [100, 400, 451, 500, 599, 700] {
            let err = upstream_error(&response(status, "")).expect("classified");
            assert_eq!(Some(err.kind()), ErrorKind::for_status(status));
        }
    }

    #[test]
    fn unreadable_error_body_is_no_type() {
        let response = Response::new(500, HashMap::new(), vec![0xc3, 0x28]);
        let err = upstream_error(&response).expect_err("not text");
        assert_eq!(err.kind(), ErrorKind::NoType);
    }
}
