//! Joke service adapter.

use std::future::Future;

use jester_core::{HttpClient, UrlParams, UrlTemplate};

use crate::models::{JokeRequest, JokeResponse};
use crate::{
    ClientConfig, Context, Error, ErrorKind, HyperClient, Method, Request, RestClient, Result,
};

/// Endpoint template of the joke service.
pub const JOKES_ENDPOINT: &str = "{host}/{version}";

/// Path of the random joke resource.
pub const JOKES_RANDOM: &str = "jokes/random/";

/// Anything that can tell a joke about someone.
pub trait JokeSource: Send + Sync {
    /// Fetch one joke.
    ///
    /// # Errors
    ///
    /// `BadRequest` / `NotFound` come straight from the upstream; anything
    /// else is wrapped with `"joke request failed"`.
    fn joke(
        &self,
        ctx: &Context,
        request: &JokeRequest,
    ) -> impl Future<Output = Result<JokeResponse>> + Send;
}

/// Calls `GET {base_url}/jokes/random/` on the joke service.
///
/// The query carries `firstName`, `lastName` and the first category as
/// `limitTo`.
#[derive(Debug, Clone)]
pub struct JokesService<C = HyperClient> {
    client: RestClient<C>,
    host: String,
    template: UrlTemplate,
    send_body: bool,
}

impl JokesService {
    /// Service over a hyper transport built from `config`.
    ///
    /// # Errors
    ///
    /// Returns a `NoType` error if the endpoint template is invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_client(RestClient::new(config), config)
    }
}

impl<C: HttpClient> JokesService<C> {
    /// Service over an existing REST client.
    ///
    /// # Errors
    ///
    /// Returns a `NoType` error if the endpoint template is invalid.
    pub fn with_client(client: RestClient<C>, config: &ClientConfig) -> Result<Self> {
        let template = UrlTemplate::parse(config.name.as_str(), JOKES_ENDPOINT).map_err(|err| {
            Error::with_source(ErrorKind::NoType, "not able to create API endpoint", err)
        })?;

        Ok(Self {
            client,
            host: config.base_url.trim_end_matches('/').to_string(),
            template,
            send_body: false,
        })
    }

    /// Also send the request as a JSON body. Off by default.
    #[must_use]
    pub fn with_request_body(mut self, send_body: bool) -> Self {
        self.send_body = send_body;
        self
    }

    fn build_request(&self, request: &JokeRequest) -> Result<Request> {
        let category = request.limit_to.first().ok_or_else(|| {
            Error::no_type("missing joke category")
                .with_context("limitTo", "at least one category is required")
        })?;

        let query = [
            ("firstName", request.first_name.as_str()),
            ("lastName", request.last_name.as_str()),
            ("limitTo", category.as_str()),
        ]
        .into_iter()
        .collect();
        let params = UrlParams::new(self.host.as_str(), JOKES_RANDOM).with_query(query);
        let url = self.template.render(&params).map_err(|err| {
            Error::with_source(ErrorKind::NoType, "not able to create API endpoint", err)
        })?;

        let builder = Request::builder(Method::Get, url)
            .header("Accept", "application/json")
            .query_params(params.query);

        let builder = if self.send_body {
            builder.json(request)?
        } else {
            builder
        };
        Ok(builder.build())
    }

    /// Fetch one joke about the requested person.
    ///
    /// # Errors
    ///
    /// See [`JokeSource::joke`]. An empty `limit_to` fails before any network
    /// call, with context field `limitTo`.
    pub async fn jokes(&self, ctx: &Context, request: &JokeRequest) -> Result<JokeResponse> {
        tracing::debug!(service = self.client.name(), ?request, "requesting joke");

        let outbound = self
            .build_request(request)
            .map_err(|err| err.wrap("joke request failed"))?;

        self.client
            .request(ctx, outbound)
            .await
            .map_err(|err| crate::wrap_internal(err, "joke request failed"))
    }
}

impl<C: HttpClient> JokeSource for JokesService<C> {
    fn joke(
        &self,
        ctx: &Context,
        request: &JokeRequest,
    ) -> impl Future<Output = Result<JokeResponse>> + Send {
        self.jokes(ctx, request)
    }
}
