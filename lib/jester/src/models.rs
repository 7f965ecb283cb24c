//! Payloads exchanged with the name and joke services.

use serde::{Deserialize, Serialize};

/// A generated person name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResponse {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Gender, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Region, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Joke service envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeResponse {
    /// Result status reported by the service (`"success"`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The joke itself.
    pub value: JokeValue,
}

/// A single joke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeValue {
    /// Service-side identifier.
    #[serde(default)]
    pub id: i64,
    /// Joke text.
    pub joke: String,
    /// Categories the joke belongs to.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Parameters of a joke lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JokeRequest {
    /// Replaces the hero's first name.
    pub first_name: String,
    /// Replaces the hero's last name.
    pub last_name: String,
    /// Categories to draw from; only the first one is sent.
    pub limit_to: Vec<String>,
}

impl JokeRequest {
    /// Joke about `name`, limited to `categories`.
    #[must_use]
    pub fn for_name(name: &NameResponse, categories: &[String]) -> Self {
        Self {
            first_name: name.name.clone(),
            last_name: name.surname.clone(),
            limit_to: categories.to_vec(),
        }
    }
}
