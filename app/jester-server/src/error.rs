//! Server error type.

use std::path::PathBuf;

use derive_more::{Display, Error, From};

/// Errors that stop the server from starting or serving.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The config file could not be read.
    #[display("unable to read config file {}: {source}", path.display())]
    #[from(skip)]
    ReadConfig {
        /// Path that was read.
        #[error(not(source))]
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[display("unable to parse config: {_0}")]
    #[from]
    ParseConfig(toml::de::Error),

    /// The config parsed but holds unusable values.
    #[display("invalid config: {_0}")]
    #[from(skip)]
    InvalidConfig(#[error(not(source))] String),

    /// An upstream client could not be built.
    #[display("unable to build client: {_0}")]
    #[from]
    Client(jester::Error),

    /// Binding or serving failed.
    #[display("server error: {_0}")]
    #[from]
    Io(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;
