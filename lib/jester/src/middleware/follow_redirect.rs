//! Follow redirect middleware.
//!
//! Follows 301, 302, 303, 307 and 308 responses that carry a `Location`
//! header. A redirect status without `Location` is handed back unchanged.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::{Layer, Service};
use tracing::debug;
use url::Url;

use crate::{Error, ErrorKind, Method, Request, Response, Result};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Layer that follows HTTP redirects.
///
/// # Example
///
/// ```
/// use jester::HyperClient;
/// use jester::middleware::FollowRedirectLayer;
///
/// let client = HyperClient::builder()
///     .layer(FollowRedirectLayer::with_max_redirects(3))
///     .build();
/// # let _ = client;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl Default for FollowRedirectLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowRedirectLayer {
    /// Layer following at most [`DEFAULT_MAX_REDIRECTS`] redirects.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Layer following at most `max_redirects` redirects.
    #[must_use]
    pub const fn with_max_redirects(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Service that follows HTTP redirects.
#[derive(Debug, Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    max_redirects: usize,
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// 307 and 308 keep the method, the others switch to GET.
fn redirect_method(status: u16, original: Method) -> Method {
    match status {
        307 | 308 => original,
        _ => Method::Get,
    }
}

fn location(response: &Response) -> Option<&str> {
    response
        .header("location")
        .or_else(|| response.header("Location"))
}

/// Request for the next hop, or `None` when `response` is not followed.
fn next_request(request: &Request, response: &Response) -> Result<Option<Request>> {
    if !is_redirect(response.status()) {
        return Ok(None);
    }
    let Some(location) = location(response) else {
        return Ok(None);
    };

    let url = resolve_redirect_url(&request.resolve_url()?, location)?;
    let method = redirect_method(response.status(), request.method());
    let keep_body = method == request.method() && method.expects_body();

    let mut builder = Request::builder(method, url.as_str());
    for (name, value) in request.headers() {
        if keep_body || !name.eq_ignore_ascii_case("content-type") {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    if let Some(body) = request.body().filter(|_| keep_body) {
        builder = builder.body(body.clone());
    }

    Ok(Some(builder.build()))
}

/// Resolve a `Location` value against the URL that produced it.
fn resolve_redirect_url(base_url: &Url, location: &str) -> Result<Url> {
    base_url.join(location).map_err(|err| {
        Error::with_source(
            ErrorKind::NoType,
            format!("invalid redirect location {location:?}"),
            err,
        )
    })
}

impl<S> Service<Request> for FollowRedirect<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut current = request;
            let mut redirects = 0;

            loop {
                let response = inner.call(current.clone()).await?;

                let Some(next) = next_request(&current, &response)? else {
                    return Ok(response);
                };
                if redirects >= max_redirects {
                    return Err(Error::no_type(format!(
                        "stopped after {max_redirects} redirects"
                    )));
                }

                debug!(status = response.status(), to = %next.url(), "following redirect");
                current = next;
                redirects += 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tower::{ServiceExt, service_fn};

    use super::*;

    fn redirect(status: u16, to: &str) -> Response {
        let headers = HashMap::from([("location".to_string(), to.to_string())]);
        Response::new(status, headers, "")
    }

    #[test]
    fn redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            assert!(is_redirect(status));
        }
        assert!(!is_redirect(300));
        assert!(!is_redirect(304));
        assert!(!is_redirect(200));
    }

    #[test]
    fn redirect_method_rules() {
        assert_eq!(redirect_method(301, Method::Post), Method::Get);
        assert_eq!(redirect_method(303, Method::Put), Method::Get);
        assert_eq!(redirect_method(307, Method::Post), Method::Post);
        assert_eq!(redirect_method(308, Method::Patch), Method::Patch);
    }

    #[test]
    fn resolve_relative_and_absolute_locations() {
        let base = Url::parse("http://uinames.com/api/?region=fr").expect("base url");

        let url = resolve_redirect_url(&base, "https://uinames.com/api/").expect("absolute");
        assert_eq!(url.as_str(), "https://uinames.com/api/");

        let url = resolve_redirect_url(&base, "/final").expect("relative");
        assert_eq!(url.as_str(), "http://uinames.com/final");
    }

    #[test]
    fn post_redirected_by_303_drops_body() {
        let request = Request::builder(Method::Post, "http://localhost/jokes")
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body("{}")
            .build();

        let next = next_request(&request, &redirect(303, "/see-other"))
            .expect("next")
            .expect("followed");

        assert_eq!(next.method(), Method::Get);
        assert_eq!(next.url(), "http://localhost/see-other");
        assert!(next.body().is_none());
        assert_eq!(next.header("Content-Type"), None);
        assert_eq!(next.header("Accept"), Some("application/json"));
    }

    #[test]
    fn post_redirected_by_307_keeps_body() {
        let request = Request::builder(Method::Post, "http://localhost/jokes")
            .header("Content-Type", "application/json")
            .body("{}")
            .build();

        let next = next_request(&request, &redirect(307, "http://other/jokes"))
            .expect("next")
            .expect("followed");

        assert_eq!(next.method(), Method::Post);
        assert_eq!(next.body().map(|b| b.as_ref()), Some(&b"{}"[..]));
        assert_eq!(next.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn query_moves_into_redirected_url() {
        let request = Request::builder(Method::Get, "http://localhost/jokes/random/")
            .query("firstName", "Ada")
            .build();

        let next = next_request(&request, &redirect(302, "/v2"))
            .expect("next")
            .expect("followed");

        assert_eq!(next.url(), "http://localhost/v2");
        assert!(next.query().is_empty());
    }

    #[tokio::test]
    async fn redirect_without_location_is_returned() {
        let inner = service_fn(|_request: Request| async move {
            Ok::<_, Error>(Response::new(301, HashMap::new(), r#"{"name":"Ada"}"#))
        });
        let service = FollowRedirectLayer::new().layer(inner);

        let request = Request::builder(Method::Get, "http://localhost/").build();
        let response = service.oneshot(request).await.expect("response");

        assert_eq!(response.status(), 301);
    }

    #[tokio::test]
    async fn follows_chain_until_final_response() {
        let inner = service_fn(|request: Request| async move {
            let response = match request.url() {
                "http://localhost/a" => redirect(301, "/b"),
                "http://localhost/b" => redirect(302, "/c"),
                _ => Response::new(200, HashMap::new(), "done"),
            };
            Ok::<_, Error>(response)
        });
        let service = FollowRedirectLayer::new().layer(inner);

        let request = Request::builder(Method::Get, "http://localhost/a").build();
        let response = service.oneshot(request).await.expect("response");

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"done");
    }

    #[tokio::test]
    async fn redirect_loop_is_bounded() {
        let inner = service_fn(|_request: Request| async move {
            Ok::<_, Error>(redirect(302, "/again"))
        });
        let service = FollowRedirectLayer::with_max_redirects(3).layer(inner);

        let request = Request::builder(Method::Get, "http://localhost/").build();
        let err = service.oneshot(request).await.expect_err("too many");

        assert_eq!(err.kind(), ErrorKind::NoType);
        assert_eq!(err.to_string(), "stopped after 3 redirects");
    }
}
