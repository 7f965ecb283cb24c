//! Name-then-joke composition.

use derive_more::{Display, Error};
use tracing::{debug, info};

use crate::jokes::JokeSource;
use crate::models::{JokeRequest, NameResponse};
use crate::names::NameSource;
use crate::{Context, ErrorKind, Result};

/// Category used when none is configured.
pub const DEFAULT_CATEGORY: &str = "nerdy";

/// Which upstream a [`GenerateError`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Upstream {
    /// The name service.
    #[display("Name")]
    Names,
    /// The joke service.
    #[display("Joke")]
    Jokes,
}

/// Failure of [`JokeGenerator::named_joke`].
#[derive(Debug, Display, Error)]
#[display("{upstream} API: {error}")]
pub struct GenerateError {
    /// Upstream that failed.
    pub upstream: Upstream,
    /// Classified error from that upstream.
    #[error(source)]
    pub error: crate::Error,
}

impl GenerateError {
    /// Kind of the underlying error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Generates a joke about a randomly named person.
#[derive(Debug, Clone)]
pub struct JokeGenerator<N, J> {
    names: N,
    jokes: J,
    categories: Vec<String>,
}

impl<N: NameSource, J: JokeSource> JokeGenerator<N, J> {
    /// Generator limited to the default category.
    #[must_use]
    pub fn new(names: N, jokes: J) -> Self {
        Self {
            names,
            jokes,
            categories: vec![DEFAULT_CATEGORY.to_string()],
        }
    }

    /// Replace the joke categories.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Joke categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Fetch a name.
    ///
    /// # Errors
    ///
    /// `BadRequest` / `NotFound` pass through; others are wrapped with
    /// `"name generate failed"`.
    pub async fn generate_name(&self, ctx: &Context) -> Result<NameResponse> {
        debug!("generating name");
        let name = self
            .names
            .name(ctx)
            .await
            .map_err(|err| crate::wrap_internal(err, "name generate failed"))?;
        info!(name = %name.name, surname = %name.surname, "name generated");
        Ok(name)
    }

    /// Fetch the text of a joke.
    ///
    /// # Errors
    ///
    /// `BadRequest` / `NotFound` pass through; others are wrapped with
    /// `"joke generate failed"`.
    pub async fn generate_joke(&self, ctx: &Context, request: &JokeRequest) -> Result<String> {
        debug!("generating joke");
        self.jokes
            .joke(ctx, request)
            .await
            .map(|response| response.value.joke)
            .map_err(|err| crate::wrap_internal(err, "joke generate failed"))
    }

    /// Look up a name, then a joke about that name.
    ///
    /// The joke service is not called when the name lookup fails.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] naming the upstream that failed.
    pub async fn named_joke(&self, ctx: &Context) -> std::result::Result<String, GenerateError> {
        let name = self
            .generate_name(ctx)
            .await
            .map_err(|error| GenerateError {
                upstream: Upstream::Names,
                error,
            })?;

        let request = JokeRequest::for_name(&name, &self.categories);
        self.generate_joke(ctx, &request)
            .await
            .map_err(|error| GenerateError {
                upstream: Upstream::Jokes,
                error,
            })
    }
}
