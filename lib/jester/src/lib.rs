//! Resilient REST client with classified errors.
//!
//! The building blocks, leaf first:
//! - [`HyperClient`] - one HTTP attempt over hyper-util, with Tower middleware
//! - [`RestClient`] - retries, exponential backoff, status classification and
//!   JSON decoding over any [`HttpClient`]
//! - [`Context`] - cancellation and deadline for a call
//! - [`NamesService`] / [`JokesService`] - adapters for the two upstreams
//! - [`JokeGenerator`] - a joke about a freshly generated name
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use jester::{ClientConfig, Context, JokeGenerator, JokesService, NamesService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let names = NamesService::new(
//!     &ClientConfig::builder()
//!         .name("names")
//!         .base_url("http://uinames.com/api/")
//!         .build(),
//! );
//! let jokes = JokesService::new(
//!     &ClientConfig::builder()
//!         .name("jokes")
//!         .base_url("http://api.icndb.com")
//!         .build(),
//! )?;
//!
//! let generator = JokeGenerator::new(names, jokes);
//! let joke = generator
//!     .named_joke(&Context::with_timeout(Duration::from_secs(30)))
//!     .await?;
//! println!("{joke}");
//! # Ok(())
//! # }
//! ```

mod config;
mod connector;
mod context;
pub mod generator;
pub mod jokes;
pub mod middleware;
pub mod models;
pub mod names;
mod rest;
mod transport;

pub use config::{ClientConfig, ClientConfigBuilder, RetryPolicy};
pub use context::Context;
pub use generator::{GenerateError, JokeGenerator, Upstream};
pub use jokes::{JokeSource, JokesService};
pub use names::{NameSource, NamesService};
pub use rest::RestClient;
pub use transport::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};

pub use jester_core::{
    Error, ErrorKind, HttpClient, Method, Request, RequestBuilder, Response, Result,
};

/// Keep upstream kinds as they are; wrap everything else with `message`.
pub(crate) fn wrap_internal(err: Error, message: &str) -> Error {
    if err.is_upstream() {
        err
    } else {
        err.wrap(message)
    }
}
