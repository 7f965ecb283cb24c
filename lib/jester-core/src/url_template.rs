//! Endpoint templates.
//!
//! A template such as `{host}/{version}` is rendered against [`UrlParams`] to
//! produce the request URL. Query parameters travel alongside in
//! [`UrlParams::query`] and are appended later by the REST client.
//!
//! # Example
//!
//! ```
//! use jester_core::{UrlParams, build_url};
//!
//! let params = UrlParams::new("http://api.icndb.com", "jokes/random/");
//! let url = build_url("jokes", "{host}/{version}", &params).expect("render");
//! assert_eq!(url, "http://api.icndb.com/jokes/random/");
//! ```

use derive_more::{Display, Error};

use crate::Query;

/// Values substituted into a [`UrlTemplate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    /// Substituted for `{host}`.
    pub host: String,
    /// Substituted for `{version}`; a version or a path segment.
    pub version: String,
    /// Query parameters for the request built from this URL.
    pub query: Query,
}

impl UrlParams {
    /// Params with an empty query.
    #[must_use]
    pub fn new(host: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            version: version.into(),
            query: Query::new(),
        }
    }

    /// Replace the query.
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "host" => Some(&self.host),
            "version" => Some(&self.version),
            _ => None,
        }
    }
}

/// Failure to parse or render a template.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TemplateError {
    /// A `{` without a matching `}`.
    #[display("template {template:?}: unclosed '{{' at byte {position}")]
    Unclosed {
        /// Template name.
        template: String,
        /// Byte offset of the opening brace.
        position: usize,
    },

    /// A `}` that does not close a placeholder.
    #[display("template {template:?}: unexpected '}}' at byte {position}")]
    UnexpectedClose {
        /// Template name.
        template: String,
        /// Byte offset of the brace.
        position: usize,
    },

    /// `{}` with nothing inside.
    #[display("template {template:?}: empty placeholder at byte {position}")]
    EmptyPlaceholder {
        /// Template name.
        template: String,
        /// Byte offset of the opening brace.
        position: usize,
    },

    /// A placeholder that has no value in [`UrlParams`].
    #[display("template {template:?}: unknown placeholder {{{name}}}")]
    UnknownPlaceholder {
        /// Template name.
        template: String,
        /// Placeholder name.
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed endpoint template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse `source`. `name` only appears in error messages.
    ///
    /// `{{` and `}}` stand for literal braces.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if chars.next_if(|&(_, next)| next == '{').is_some() => literal.push('{'),
                '}' if chars.next_if(|&(_, next)| next == '}').is_some() => literal.push('}'),
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => placeholder.push(c),
                            None => {
                                return Err(TemplateError::Unclosed {
                                    template: name,
                                    position,
                                });
                            }
                        }
                    }
                    let placeholder = placeholder.trim();
                    if placeholder.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder {
                            template: name,
                            position,
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder.to_string()));
                }
                '}' => {
                    return Err(TemplateError::UnexpectedClose {
                        template: name,
                        position,
                    });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { name, segments })
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute `params` into the template.
    pub fn render(&self, params: &UrlParams) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        params
                            .lookup(name)
                            .ok_or_else(|| TemplateError::UnknownPlaceholder {
                                template: self.name.clone(),
                                name: name.clone(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render a template in one step.
pub fn build_url(name: &str, template: &str, params: &UrlParams) -> Result<String, TemplateError> {
    UrlTemplate::parse(name, template)?.render(params)
}
