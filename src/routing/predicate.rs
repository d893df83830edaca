//! Compiled string predicates.
//!
//! A predicate holds up to four literal sets (equality, prefix, suffix,
//! regex). Each non-empty set is ORed internally; the predicate is the AND
//! of all non-empty sets. With every set empty the predicate matches
//! anything.

use regex::Regex;

use crate::config::StringMatchConfig;
use crate::routing::CompileError;

/// Matcher over a single string value.
#[derive(Debug, Clone, Default)]
pub struct StringPredicate {
    equals: Vec<String>,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl StringPredicate {
    /// Compile the literals of a `path` or `header` rule.
    ///
    /// Fails only on an invalid regular expression.
    pub fn compile(config: &StringMatchConfig) -> Result<Self, CompileError> {
        let patterns = config
            .patterns()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CompileError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            equals: config.equals().map(str::to_string).collect(),
            prefixes: config.prefixes().map(str::to_string).collect(),
            suffixes: config.suffixes().map(str::to_string).collect(),
            patterns,
        })
    }

    /// True when no literal of any kind is configured.
    pub fn is_vacuous(&self) -> bool {
        self.equals.is_empty()
            && self.prefixes.is_empty()
            && self.suffixes.is_empty()
            && self.patterns.is_empty()
    }

    pub fn matches(&self, value: &str) -> bool {
        any_of("eq", &self.equals, value, |t| t.as_str() == value)
            && any_of("prefix", &self.prefixes, value, |t| value.starts_with(t.as_str()))
            && any_of("suffix", &self.suffixes, value, |t| value.ends_with(t.as_str()))
            && any_of("regex", &self.patterns, value, |re| re.is_match(value))
    }
}

/// OR over one literal set. An empty set does not constrain the value.
fn any_of<T, F>(kind: &str, literals: &[T], value: &str, check: F) -> bool
where
    T: std::fmt::Debug,
    F: Fn(&T) -> bool,
{
    if literals.is_empty() {
        return true;
    }
    let matched = literals.iter().any(check);
    tracing::trace!(kind, ?literals, value, matched, "Evaluated literal set");
    matched
}
