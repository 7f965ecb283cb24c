//! Tower middleware for the hyper transport.
//!
//! Layers wrap a single attempt. Retries happen above the transport, in
//! [`RestClient`](crate::RestClient), so every retry passes through the layers
//! again.
//!
//! ```
//! use jester::HyperClient;
//! use jester::middleware::LoggingLayer;
//!
//! let client = HyperClient::builder()
//!     .layer(LoggingLayer::new())
//!     .build();
//! # let _ = client;
//! ```

mod follow_redirect;
mod logging;

pub use follow_redirect::{DEFAULT_MAX_REDIRECTS, FollowRedirect, FollowRedirectLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, ServiceBuilder};
