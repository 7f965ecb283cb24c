//! Name service adapter.

use std::future::Future;

use jester_core::HttpClient;

use crate::models::NameResponse;
use crate::{ClientConfig, Context, HyperClient, Method, Request, RestClient, Result};

/// Anything that can produce a random person name.
pub trait NameSource: Send + Sync {
    /// Fetch one name.
    ///
    /// # Errors
    ///
    /// `BadRequest` / `NotFound` come straight from the upstream; anything
    /// else is wrapped with `"name request failed"`.
    fn name(&self, ctx: &Context) -> impl Future<Output = Result<NameResponse>> + Send;
}

/// Calls `GET {base_url}` on the name service.
#[derive(Debug, Clone)]
pub struct NamesService<C = HyperClient> {
    client: RestClient<C>,
    base_url: String,
}

impl NamesService {
    /// Service over a hyper transport built from `config`.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(RestClient::new(config), config)
    }
}

impl<C: HttpClient> NamesService<C> {
    /// Service over an existing REST client.
    #[must_use]
    pub fn with_client(client: RestClient<C>, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    /// Fetch one name from the service.
    ///
    /// # Errors
    ///
    /// See [`NameSource::name`].
    pub async fn names(&self, ctx: &Context) -> Result<NameResponse> {
        tracing::debug!(service = self.client.name(), "requesting name");

        let request = Request::builder(Method::Get, self.base_url.as_str())
            .header("Accept", "application/json")
            .build();

        self.client
            .request(ctx, request)
            .await
            .map_err(|err| crate::wrap_internal(err, "name request failed"))
    }
}

impl<C: HttpClient> NameSource for NamesService<C> {
    fn name(&self, ctx: &Context) -> impl Future<Output = Result<NameResponse>> + Send {
        self.names(ctx)
    }
}
