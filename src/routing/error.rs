//! Errors raised while compiling route rules.
//!
//! Matching and mutation never fail at request time; everything fallible
//! happens here, before a frontend starts listening.

/// Failure to turn declarative route rules into executable ones.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value '{value}' for header '{field}'")]
    InvalidHeaderValue { field: String, value: String },

    #[error("Backend '{0}' not found")]
    BackendNotFound(String),
}
