//! Fact lookup and instance prefix resolution.
//!
//! The instance prefix is the value of a named fact (usually `hostname`).
//! Where facts come from is up to the caller: anything implementing
//! [`FactLookup`] will do, including a plain closure.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};

/// A source of named facts.
pub trait FactLookup {
    /// Look up a fact by name. `None` means the fact does not exist.
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<F> FactLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Facts held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticFacts {
    facts: HashMap<String, String>,
}

impl StaticFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.facts.insert(name.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for StaticFacts
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            facts: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FactLookup for StaticFacts {
    fn lookup(&self, name: &str) -> Option<String> {
        self.facts.get(name).cloned()
    }
}

/// Facts read from `FACTER_<name>` environment variables.
///
/// Variables that are unset or not valid UTF-8 are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFacts;

impl EnvFacts {
    pub const VAR_PREFIX: &'static str = "FACTER_";

    pub fn new() -> Self {
        Self
    }
}

impl FactLookup for EnvFacts {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}{}", Self::VAR_PREFIX, name)).ok()
    }
}

/// Tries each source in order and returns the first fact found.
#[derive(Default)]
pub struct ChainedFacts {
    sources: Vec<Box<dyn FactLookup + Send + Sync>>,
}

impl ChainedFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl FactLookup + Send + Sync + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl FactLookup for ChainedFacts {
    fn lookup(&self, name: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.lookup(name))
    }
}

/// Resolve the instance prefix named by `fact`.
///
/// An absent or empty fact is an [`Error::PrefixNotFound`].
pub fn resolve_prefix(facts: &dyn FactLookup, fact: &str) -> Result<String> {
    match facts.lookup(fact) {
        Some(value) if !value.is_empty() => {
            debug!(fact, prefix = %value, "resolved instance prefix");
            Ok(value)
        }
        _ => Err(Error::PrefixNotFound {
            fact: fact.to_string(),
        }),
    }
}
