//! JSON body helpers.

use bytes::Bytes;

use crate::{Error, ErrorKind, Result};

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns a `NoType` error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use jester_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct JokeRequest { first_name: String }
///
/// let bytes = to_json(&JokeRequest { first_name: "Ada".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"firstName":"Ada"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| Error::with_source(ErrorKind::NoType, "unable to encode JSON body", err))
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// On failure the returned `NoType` error carries the JSON path of the
/// offending field as its context (`field` is the path, `message` the serde
/// message).
///
/// # Errors
///
/// Returns a `NoType` error if JSON deserialization fails.
///
/// # Example
///
/// ```
/// use jester_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Name { name: String }
///
/// let name: Name = from_json(br#"{"name":"Ada"}"#).expect("deserialize");
/// assert_eq!(name, Name { name: "Ada".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let message = err.inner().to_string();
        Error::with_source(
            ErrorKind::NoType,
            format!("unable to decode JSON at '{path}'"),
            err.into_inner(),
        )
        .with_context(path, message)
    })
}
