//! Classified error type for jester.
//!
//! Every failure that leaves the REST client is an [`Error`] tagged with an
//! [`ErrorKind`]. The kind is decided once, where the failure is observed, and
//! survives any number of [`wrap`] calls.

use std::error::Error as StdError;
use std::fmt;

use derive_more::Display;

/// Boxed error accepted by [`wrap`] and [`add_context`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Error Kind
// ============================================================================

/// Classification of an [`Error`].
///
/// `BadRequest` and `NotFound` come from the upstream status-code family
/// (4xx and 5xx/unknown respectively). `NoType` covers transport, parsing and
/// internal failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Application-level failure (transport, parsing, internal).
    #[default]
    #[display("NoType")]
    NoType,
    /// Upstream answered with a 4xx status.
    #[display("BadRequest")]
    BadRequest,
    /// Upstream answered with a 5xx or unrecognized status.
    #[display("NotFound")]
    NotFound,
    /// The caller's context was canceled or its deadline passed.
    #[display("Canceled")]
    Canceled,
}

impl ErrorKind {
    /// Kind for a response status, or `None` when the status is a success
    /// (2xx) or a redirect (3xx).
    #[must_use]
    pub const fn for_status(status: u16) -> Option<Self> {
        match status {
            200..=399 => None,
            400..=499 => Some(Self::BadRequest),
            _ => Some(Self::NotFound),
        }
    }

    /// Returns `true` for kinds produced from an upstream response.
    ///
    /// These are the kinds the REST client retries and the kinds adapters pass
    /// through unchanged.
    #[must_use]
    pub const fn is_upstream(self) -> bool {
        matches!(self, Self::BadRequest | Self::NotFound)
    }

    /// Create an error of this kind.
    #[must_use]
    pub fn error(self, message: impl Into<String>, status: u16) -> Error {
        Error::new(self, message, status)
    }
}

/// Contextual metadata attached with [`add_context`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{field}: {message}")]
pub struct ErrorContext {
    /// Name of the offending field.
    pub field: String,
    /// Human readable explanation.
    pub message: String,
}

// ============================================================================
// Cause chain
// ============================================================================

#[derive(Debug)]
enum Cause {
    Message(String),
    Wrapped { message: String, inner: Box<Cause> },
    Foreign(BoxError),
}

impl Cause {
    fn root(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Message(_) => None,
            Self::Wrapped { inner, .. } => inner.root(),
            Self::Foreign(err) => Some(err.as_ref()),
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Wrapped { message, inner } => write!(f, "{message}: {inner}"),
            Self::Foreign(err) => write!(f, "{err}"),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Classified error returned by every jester operation.
///
/// Displays as its cause chain, outermost message first
/// (`"name request failed: unable to parse URL: ..."`).
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    status: Option<u16>,
    cause: Cause,
    context: Option<ErrorContext>,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with a kind, a message and the HTTP status that
    /// produced it.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            status: Some(status),
            cause: Cause::Message(message.into()),
            context: None,
        }
    }

    /// Create a `NoType` error without a status code.
    #[must_use]
    pub fn no_type(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NoType,
            status: None,
            cause: Cause::Message(message.into()),
            context: None,
        }
    }

    /// Create a `Canceled` error.
    #[must_use]
    pub fn canceled(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Canceled,
            status: None,
            cause: Cause::Message(message.into()),
            context: None,
        }
    }

    /// Create an error of `kind` caused by a foreign error.
    ///
    /// The foreign error is reachable through [`StdError::source`].
    #[must_use]
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            kind,
            status: None,
            cause: Cause::Wrapped {
                message: message.into(),
                inner: Box::new(Cause::Foreign(source.into())),
            },
            context: None,
        }
    }

    /// Error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status that produced the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Attached context, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&ErrorContext> {
        self.context.as_ref()
    }

    /// Returns `true` if the error was produced from an upstream response.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        self.kind.is_upstream()
    }

    /// Returns `true` if the caller canceled the operation.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self.kind, ErrorKind::Canceled)
    }

    /// Prefix the cause chain with `message`, keeping kind, status and context.
    #[must_use]
    pub fn wrap(self, message: impl Into<String>) -> Self {
        Self {
            cause: Cause::Wrapped {
                message: message.into(),
                inner: Box::new(self.cause),
            },
            ..self
        }
    }

    /// Attach context, replacing any previous one. The kind is unchanged.
    #[must_use]
    pub fn with_context(self, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: Some(ErrorContext {
                field: field.into(),
                message: message.into(),
            }),
            ..self
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cause.fmt(f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.root()
    }
}

// ============================================================================
// Free functions over arbitrary errors
// ============================================================================

fn classified(err: BoxError) -> std::result::Result<Error, BoxError> {
    err.downcast::<Error>().map(|err| *err)
}

/// Wrap any error with a message.
///
/// A classified [`Error`] keeps its kind, status and context. Anything else
/// becomes a `NoType` error.
#[must_use]
pub fn wrap(err: impl Into<BoxError>, message: impl Into<String>) -> Error {
    match classified(err.into()) {
        Ok(err) => err.wrap(message),
        Err(other) => Error::with_source(ErrorKind::NoType, message, other),
    }
}

/// Attach context to any error without changing its kind.
///
/// Errors that are not classified become `NoType`.
#[must_use]
pub fn add_context(
    err: impl Into<BoxError>,
    field: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    let err = classified(err.into()).unwrap_or_else(|other| Error {
        kind: ErrorKind::NoType,
        status: None,
        cause: Cause::Foreign(other),
        context: None,
    });
    err.with_context(field, message)
}

/// Kind of any error; `NoType` when it is not a classified [`Error`].
#[must_use]
pub fn classify(err: &(dyn StdError + 'static)) -> ErrorKind {
    err.downcast_ref::<Error>().map_or(ErrorKind::NoType, Error::kind)
}
