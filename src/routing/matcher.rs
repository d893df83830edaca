//! Route matching logic.
//!
//! # Responsibilities
//! - Match every occurrence of a named header (name is case-insensitive)
//! - Match the request path
//!
//! # Design Decisions
//! - A header matcher needs at least one occurrence to match, even when its
//!   predicate has no literals; a path matcher always has a value to test
//! - Header values that are not valid UTF-8 are compared lossily

use axum::http::{HeaderName, Request};

use crate::config::{HeaderMatchConfig, StringMatchConfig};
use crate::routing::{CompileError, StringPredicate};

/// A predicate scoped to one request field.
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    /// Matches if any occurrence of the header satisfies the predicate.
    Header {
        name: HeaderName,
        predicate: StringPredicate,
    },
    /// Matches the URL path.
    Path(StringPredicate),
}

impl FieldMatcher {
    pub fn header(config: &HeaderMatchConfig) -> Result<Self, CompileError> {
        let name = HeaderName::from_bytes(config.field.as_bytes())
            .map_err(|_| CompileError::InvalidHeaderName(config.field.clone()))?;
        let predicate = StringPredicate::compile(&config.value)?;
        if predicate.is_vacuous() {
            tracing::debug!(header = %name, "Header condition only requires presence");
        }
        Ok(FieldMatcher::Header { name, predicate })
    }

    pub fn path(config: &StringMatchConfig) -> Result<Self, CompileError> {
        Ok(FieldMatcher::Path(StringPredicate::compile(config)?))
    }

    /// Returns true if the request satisfies this condition.
    pub fn matches<B>(&self, req: &Request<B>) -> bool {
        match self {
            FieldMatcher::Header { name, predicate } => {
                let matched = req
                    .headers()
                    .get_all(name)
                    .iter()
                    .any(|value| predicate.matches(&String::from_utf8_lossy(value.as_bytes())));
                tracing::debug!(header = %name, matched, "Checked header");
                matched
            }
            FieldMatcher::Path(predicate) => {
                let matched = predicate.matches(req.uri().path());
                tracing::debug!(path = req.uri().path(), matched, "Checked path");
                matched
            }
        }
    }
}
