//! Outbound request description.
//!
//! A [`Request`] holds the URL as a plain string; it is parsed and merged with
//! the [`Query`] only when an attempt is made (see [`Request::resolve_url`]).
//!
//! # Example
//!
//! ```
//! use jester_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com/jokes")
//!     .query("firstName", "Ada")
//!     .query("limitTo", "nerdy")
//!     .build();
//!
//! let url = request.resolve_url().expect("valid URL");
//! assert_eq!(url.as_str(), "https://api.example.com/jokes?firstName=Ada&limitTo=nerdy");
//! ```

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use crate::{Error, Method, Result};

// ============================================================================
// Query
// ============================================================================

/// Multi-valued query parameters.
///
/// Keys iterate in sorted order; the values of one key keep their insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, Vec<String>>);

impl Query {
    /// Empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values of `key`.
    pub fn set<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Values of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// First value of `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(<[String]>::first)
            .map(String::as_str)
    }

    /// Returns `true` if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every `(key, value)` pair, keys sorted, values in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.add(key, value);
        }
        query
    }
}

// ============================================================================
// Request
// ============================================================================

/// An outbound request: method, URL, query, headers and an optional buffered
/// body.
///
/// The body is held as [`Bytes`], so every retry re-sends the same bytes.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    query: Query,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Unparsed URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters merged into the URL on every attempt.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Parse the URL and append the query parameters to whatever query it
    /// already carries.
    ///
    /// # Errors
    ///
    /// Returns a `NoType` error if the URL is malformed.
    pub fn resolve_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.url).map_err(|err| {
            Error::with_source(
                crate::ErrorKind::NoType,
                format!("unable to parse URL {:?}", self.url),
                err,
            )
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.pairs());
        }
        Ok(url)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    query: Query,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Query::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add(name, value);
        self
    }

    /// Replaces the whole query.
    #[must_use]
    pub fn query_params(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a `NoType` error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}
