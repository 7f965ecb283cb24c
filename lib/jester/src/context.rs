//! Cancellation scope for outbound calls.
//!
//! A [`Context`] combines a [`CancellationToken`] with an optional deadline.
//! Every suspension point of the REST client (an attempt, a backoff sleep)
//! runs through [`Context::run`], so canceling the token or passing the
//! deadline ends the call with a `Canceled` error.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation token plus optional deadline, cheap to clone.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use jester::Context;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// let answer = ctx.run(async { 42 }).await.expect("not canceled");
/// assert_eq!(answer, 42);
///
/// ctx.cancel();
/// let err = ctx.run(async { 42 }).await.expect_err("canceled");
/// assert!(err.is_canceled());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context that is never canceled on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Context canceled by `token`.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Keep the earlier of the current deadline and `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Context canceled with this one, or on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The `Canceled` error this context currently reports, if any.
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            Some(Error::canceled("context canceled"))
        } else if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            Some(Error::canceled("context deadline exceeded"))
        } else {
            None
        }
    }

    /// Returns `true` once canceled or past the deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve when the context is canceled or its deadline passes.
    pub async fn done(&self) -> Error {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            () = self.token.cancelled() => Error::canceled("context canceled"),
            () = expired => Error::canceled("context deadline exceeded"),
        }
    }

    /// Drive `future` unless the context ends first.
    ///
    /// # Errors
    ///
    /// Returns a `Canceled` error if the context is, or becomes, canceled or
    /// expired. `future` is dropped in that case.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output> {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            err = self.done() => Err(err),
            output = future => Ok(output),
        }
    }
}
