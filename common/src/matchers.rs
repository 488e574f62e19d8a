//! Label matchers and the shard annotation.
//!
//! A matcher is a predicate over a single label's value. Regexp matchers are
//! fully anchored, so `job=~"api|web"` matches exactly `api` or `web` and
//! nothing else.

use regex::Regex;
use thiserror::Error;

use crate::labels::METRIC_NAME_LABEL;

/// Virtual label name carrying a shard annotation.
///
/// A shard annotation partitions series by fingerprint modulo the shard
/// count. It is consumed by the schema component when planning index queries
/// and never reaches the index as a real matcher.
pub const SHARD_LABEL: &str = "__shard__";

/// Errors from matcher construction and shard annotation parsing.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
    #[error("invalid shard label value {0:?}, expected \"<shard>_of_<count>\"")]
    InvalidShard(String),
}

/// The kind of predicate a matcher applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Label value equals the matcher value.
    Eq,
    /// Label value differs from the matcher value.
    Neq,
    /// Label value matches the regexp.
    Re,
    /// Label value does not match the regexp.
    Nre,
}

/// A predicate over one label's value.
#[derive(Debug, Clone)]
pub struct Matcher {
    match_type: MatchType,
    name: String,
    value: String,
    re: Option<Regex>,
}

impl Matcher {
    /// Creates a matcher, compiling the regexp for `Re`/`Nre` types.
    ///
    /// Regexps are anchored at both ends, matching Prometheus selector
    /// semantics.
    pub fn new(
        match_type: MatchType,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, MatcherError> {
        let name = name.into();
        let value = value.into();
        let re = match match_type {
            MatchType::Re | MatchType::Nre => {
                let anchored = format!("^(?:{})$", value);
                Some(
                    Regex::new(&anchored).map_err(|source| MatcherError::InvalidRegex {
                        pattern: value.clone(),
                        source: Box::new(source),
                    })?,
                )
            }
            MatchType::Eq | MatchType::Neq => None,
        };
        Ok(Self {
            match_type,
            name,
            value,
            re,
        })
    }

    /// Creates an equality matcher.
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            match_type: MatchType::Eq,
            name: name.into(),
            value: value.into(),
            re: None,
        }
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Evaluates this matcher against a label value.
    pub fn matches(&self, value: &str) -> bool {
        match self.match_type {
            MatchType::Eq => value == self.value,
            MatchType::Neq => value != self.value,
            MatchType::Re => self.re.as_ref().is_some_and(|re| re.is_match(value)),
            MatchType::Nre => !self.re.as_ref().is_some_and(|re| re.is_match(value)),
        }
    }
}

/// A query shard, partitioning series by `fingerprint % of == shard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAnnotation {
    pub shard: u32,
    pub of: u32,
}

impl ShardAnnotation {
    /// Parses a shard annotation from its label value form, e.g. `3_of_16`.
    pub fn parse(value: &str) -> Result<Self, MatcherError> {
        let invalid = || MatcherError::InvalidShard(value.to_string());
        let (shard, of) = value.split_once("_of_").ok_or_else(invalid)?;
        let shard: u32 = shard.parse().map_err(|_| invalid())?;
        let of: u32 = of.parse().map_err(|_| invalid())?;
        if of == 0 || shard >= of {
            return Err(invalid());
        }
        Ok(Self { shard, of })
    }

    /// Formats this annotation back into its label value form.
    pub fn label_value(&self) -> String {
        format!("{}_of_{}", self.shard, self.of)
    }

    /// Returns true if a series fingerprint belongs to this shard.
    pub fn matches_fingerprint(&self, fingerprint: u64) -> bool {
        fingerprint % u64::from(self.of) == u64::from(self.shard)
    }
}

/// Extracts a shard annotation from a matcher set.
///
/// Returns the annotation (if any) and the matchers with the shard matcher
/// removed.
pub fn shard_from_matchers(
    matchers: &[Matcher],
) -> Result<(Option<ShardAnnotation>, Vec<Matcher>), MatcherError> {
    let mut shard = None;
    let mut rest = Vec::with_capacity(matchers.len());
    for matcher in matchers {
        if matcher.name() == SHARD_LABEL {
            shard = Some(ShardAnnotation::parse(matcher.value())?);
        } else {
            rest.push(matcher.clone());
        }
    }
    Ok((shard, rest))
}

/// Extracts the metric name from a matcher set.
///
/// The metric name must be supplied as an equality matcher on the
/// metric-name label. Returns the metric name and the remaining matchers, or
/// `None` if no such matcher is present.
pub fn extract_metric_name(matchers: &[Matcher]) -> Option<(String, Vec<Matcher>)> {
    let position = matchers
        .iter()
        .position(|m| m.name() == METRIC_NAME_LABEL && m.match_type() == MatchType::Eq)?;
    let metric_name = matchers[position].value().to_string();
    let rest = matchers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != position)
        .map(|(_, m)| m.clone())
        .collect();
    Some((metric_name, rest))
}

/// Splits matchers into pure post-filters and index matchers.
///
/// Matchers with an empty value cannot be answered by the index (it holds no
/// rows for empty values) and are applied as residual filters after chunks
/// are materialized.
pub fn split_filters_and_matchers(matchers: &[Matcher]) -> (Vec<Matcher>, Vec<Matcher>) {
    let (filters, index_matchers) = matchers
        .iter()
        .cloned()
        .partition(|matcher| matcher.value().is_empty());
    (filters, index_matchers)
}
