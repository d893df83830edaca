//! Request rewrites applied by a matched route.
//!
//! Mutators run in declaration order against the same request; each one
//! observes the effects of the ones before it. Malformed rules are rejected
//! when the route is compiled, so applying a mutator cannot fail.

use axum::http::{HeaderName, HeaderValue, Request};

use crate::config::{HeaderModifyConfig, PathModifyConfig};
use crate::http::request::set_path;
use crate::routing::CompileError;

/// Prefix/suffix stripping for a path-like value.
#[derive(Debug, Clone, Default)]
pub struct PathMutator {
    strip_prefixes: Vec<String>,
    strip_suffixes: Vec<String>,
}

impl PathMutator {
    pub fn new(config: &PathModifyConfig) -> Self {
        let non_empty = |values: &[String]| {
            values
                .iter()
                .filter(|v| !v.is_empty())
                .cloned()
                .collect::<Vec<_>>()
        };
        Self {
            strip_prefixes: non_empty(&config.strip_prefix),
            strip_suffixes: non_empty(&config.strip_suffix),
        }
    }

    /// Strip each configured prefix in turn, then each suffix.
    ///
    /// Every attempt sees the value left by the previous one.
    pub fn rewrite(&self, value: &str) -> String {
        let mut current = value.to_string();
        for prefix in &self.strip_prefixes {
            if let Some(rest) = current.strip_prefix(prefix.as_str()) {
                tracing::debug!(prefix = %prefix, path = %current, "Stripping prefix");
                current = rest.to_string();
            }
        }
        for suffix in &self.strip_suffixes {
            if let Some(rest) = current.strip_suffix(suffix.as_str()) {
                tracing::debug!(suffix = %suffix, path = %current, "Stripping suffix");
                current = rest.to_string();
            }
        }
        current
    }
}

/// The single operation a header mutator performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOperation {
    /// Replace all occurrences.
    Set(HeaderValue),
    /// Delete all occurrences.
    Remove,
    /// Append one more occurrence.
    Add(HeaderValue),
}

/// Rewrites one header.
#[derive(Debug, Clone)]
pub struct HeaderMutator {
    name: HeaderName,
    operation: Option<HeaderOperation>,
}

impl HeaderMutator {
    /// Compile a header rule. `set` wins over `remove`, which wins over `add`.
    pub fn new(config: &HeaderModifyConfig) -> Result<Self, CompileError> {
        let name = HeaderName::from_bytes(config.field.as_bytes())
            .map_err(|_| CompileError::InvalidHeaderName(config.field.clone()))?;
        let value = |raw: &str| {
            HeaderValue::from_str(raw).map_err(|_| CompileError::InvalidHeaderValue {
                field: config.field.clone(),
                value: raw.to_string(),
            })
        };

        let operation = if !config.set.is_empty() {
            Some(HeaderOperation::Set(value(&config.set)?))
        } else if config.remove {
            Some(HeaderOperation::Remove)
        } else if !config.add.is_empty() {
            Some(HeaderOperation::Add(value(&config.add)?))
        } else {
            None
        };

        Ok(Self { name, operation })
    }

    pub fn operation(&self) -> Option<&HeaderOperation> {
        self.operation.as_ref()
    }
}

/// A transform scoped to one request field.
#[derive(Debug, Clone)]
pub enum FieldMutator {
    Header(HeaderMutator),
    Path(PathMutator),
}

impl FieldMutator {
    pub fn header(config: &HeaderModifyConfig) -> Result<Self, CompileError> {
        Ok(FieldMutator::Header(HeaderMutator::new(config)?))
    }

    pub fn path(config: &PathModifyConfig) -> Self {
        FieldMutator::Path(PathMutator::new(config))
    }

    pub fn apply<B>(&self, req: &mut Request<B>) {
        match self {
            FieldMutator::Header(mutator) => {
                let headers = req.headers_mut();
                match &mutator.operation {
                    Some(HeaderOperation::Set(value)) => {
                        tracing::debug!(header = %mutator.name, ?value, "Setting header");
                        headers.insert(mutator.name.clone(), value.clone());
                    }
                    Some(HeaderOperation::Remove) => {
                        tracing::debug!(header = %mutator.name, "Removing header");
                        headers.remove(&mutator.name);
                    }
                    Some(HeaderOperation::Add(value)) => {
                        tracing::debug!(header = %mutator.name, ?value, "Adding header");
                        headers.append(mutator.name.clone(), value.clone());
                    }
                    None => {}
                }
            }
            FieldMutator::Path(mutator) => {
                let path = req.uri().path();
                let rewritten = mutator.rewrite(path);
                if rewritten != path {
                    set_path(req, &rewritten);
                }
            }
        }
    }
}
