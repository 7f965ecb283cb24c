//! HTTP endpoint serving jokes about generated names.
//!
//! `GET /` looks up a name, asks for a joke about it and answers in plain
//! text. Upstream failures become fixed messages:
//!
//! | Outcome | Body | Status |
//! |---------|------|--------|
//! | joke | `<joke>\n` | 200 |
//! | `BadRequest` | `<Upstream> API - Bad Request Error\n` | 200 |
//! | `NotFound` | `<Upstream> API - Not Found Error\n` | 200 |
//! | `Canceled` | `<Upstream> API - Request Canceled\n` | 503 |
//! | `NoType` | `<Upstream> API - Internal Error\n` | 500 |
//!
//! where `<Upstream>` is `Name` or `Joke`.

pub mod config;
mod error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use jester::{
    Context, ErrorKind, GenerateError, JokeGenerator, JokeSource, JokesService, NameSource,
    NamesService,
};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use config::Config;
pub use error::{Error, Result};

/// Shared state of the router.
#[derive(Debug)]
pub struct AppState<N, J> {
    generator: Arc<JokeGenerator<N, J>>,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl<N, J> Clone for AppState<N, J> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            request_timeout: self.request_timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<N: NameSource, J: JokeSource> AppState<N, J> {
    /// State serving `generator`, each request bounded by `request_timeout`.
    #[must_use]
    pub fn new(generator: JokeGenerator<N, J>, request_timeout: Duration) -> Self {
        Self {
            generator: Arc::new(generator),
            request_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel in-flight upstream calls when `shutdown` is canceled.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl AppState<NamesService, JokesService> {
    /// State backed by the upstreams described in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if a client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let names = NamesService::new(&config.clients.name_service.client_config(&config.retry));
        let jokes = JokesService::new(&config.clients.joke_service.client_config(&config.retry))?;

        let mut generator = JokeGenerator::new(names, jokes);
        if let Some(categories) = config.joke_categories() {
            generator = generator.with_categories(categories.to_vec());
        }

        Ok(Self::new(generator, config.request_timeout()))
    }
}

/// Router with the `GET /` joke endpoint.
#[must_use]
pub fn app<N, J>(state: AppState<N, J>) -> Router
where
    N: NameSource + 'static,
    J: JokeSource + 'static,
{
    Router::new()
        .route("/", get(joke::<N, J>))
        .with_state(state)
}

async fn joke<N: NameSource, J: JokeSource>(
    State(state): State<AppState<N, J>>,
) -> (StatusCode, String) {
    let ctx = Context::with_token(state.shutdown.child_token())
        .with_deadline(Instant::now() + state.request_timeout);
    render(state.generator.named_joke(&ctx).await)
}

/// Status and body for the outcome of one joke request.
#[must_use]
pub fn render(outcome: std::result::Result<String, GenerateError>) -> (StatusCode, String) {
    let err = match outcome {
        Ok(joke) => return (StatusCode::OK, format!("{joke}\n")),
        Err(err) => err,
    };

    let upstream = err.upstream;
    match err.kind() {
        ErrorKind::BadRequest => {
            warn!(%upstream, error = %err.error, "upstream rejected request");
            (StatusCode::OK, format!("{upstream} API - Bad Request Error\n"))
        }
        ErrorKind::NotFound => {
            warn!(%upstream, error = %err.error, "upstream unavailable");
            (StatusCode::OK, format!("{upstream} API - Not Found Error\n"))
        }
        ErrorKind::Canceled => {
            warn!(%upstream, error = %err.error, "request canceled");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{upstream} API - Request Canceled\n"),
            )
        }
        ErrorKind::NoType => {
            error!(%upstream, error = %err.error, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{upstream} API - Internal Error\n"),
            )
        }
    }
}

/// Serve `config` until `shutdown` resolves.
///
/// Upstream calls still running at that point end with `Canceled`.
///
/// # Errors
///
/// Returns an error if the clients cannot be built, the address cannot be
/// bound or serving fails.
pub async fn run<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let state = AppState::from_config(&config)?.with_shutdown(token.clone());
    let listener = TcpListener::bind(config.server.addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            token.cancel();
        })
        .await?;

    info!("server stopped");
    Ok(())
}
