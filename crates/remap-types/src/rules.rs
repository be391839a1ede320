use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{Record, Value};

/// Reserved rule field listing alternate source keys.
pub const ALIASES_FIELD: &str = "_aliases";
/// Reserved key-value rule field selecting a cast.
pub const CAST_TO_FIELD: &str = "_castTo";
/// Reserved composite rule field holding a compute hook.
pub const COMPUTE_FIELD: &str = "_compute";

/// Shared view of the rule entries, regardless of mode.
pub trait AliasRule {
    /// Alternate source keys resolving to this rule's canonical key.
    fn aliases(&self) -> &[String];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastTo {
    Boolean,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cast '{0}', expected 'boolean' or 'number'")]
pub struct UnknownCast(pub String);

impl FromStr for CastTo {
    type Err = UnknownCast;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(CastTo::Boolean),
            "number" => Ok(CastTo::Number),
            other => Err(UnknownCast(other.to_string())),
        }
    }
}

/// Rename-and-remap rule: alternate key names, an optional cast, and per canonical
/// value the list of source values that stand for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValueRule {
    pub aliases: Vec<String>,
    pub cast_to: Option<CastTo>,
    pub values: IndexMap<String, Vec<String>>,
}

impl KeyValueRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn cast_to(mut self, cast: CastTo) -> Self {
        self.cast_to = Some(cast);
        self
    }

    /// Registers `aliases` as source spellings of the canonical value `canonical`.
    pub fn value(
        mut self,
        canonical: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.values
            .entry(canonical.into())
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
        self
    }
}

impl AliasRule for KeyValueRule {
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Boxed hook signature: triggering source value plus the record built so far.
pub type ComputeFn = dyn Fn(&Value, &Record) -> Result<Record, ComputeError> + Send + Sync;

/// Derives extra destination fields once all static fields are in place.
#[derive(Clone)]
pub struct Compute(Arc<ComputeFn>);

impl Compute {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Value, &Record) -> Result<Record, ComputeError> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn infallible<F>(hook: F) -> Self
    where
        F: Fn(&Value, &Record) -> Record + Send + Sync + 'static,
    {
        Self::new(move |value, current| Ok(hook(value, current)))
    }

    pub fn call(&self, value: &Value, current: &Record) -> Result<Record, ComputeError> {
        (self.0)(value, current)
    }
}

impl fmt::Debug for Compute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Compute(..)")
    }
}

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("{0}")]
    Message(String),
    #[error("compute for '{key}' failed: {source}")]
    Rule {
        key: String,
        source: Box<ComputeError>,
    },
}

impl ComputeError {
    pub fn msg(message: impl fmt::Display) -> Self {
        ComputeError::Message(message.to_string())
    }

    /// Attaches the canonical key whose hook failed.
    pub fn for_key(self, key: impl Into<String>) -> Self {
        ComputeError::Rule {
            key: key.into(),
            source: Box::new(self),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            ComputeError::Message(_) => None,
            ComputeError::Rule { key, .. } => Some(key),
        }
    }
}

/// Flag-expansion rule: when the source flag is `true`, every static field is
/// emitted; a compute hook, if any, runs after all static expansion.
#[derive(Debug, Clone, Default)]
pub struct CompositeRule {
    pub aliases: Vec<String>,
    pub compute: Option<Compute>,
    pub fields: Record,
}

impl CompositeRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn compute(mut self, compute: Compute) -> Self {
        self.compute = Some(compute);
        self
    }
}

impl AliasRule for CompositeRule {
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Declarative alias map keyed by canonical destination key, in declaration order.
#[derive(Debug, Clone)]
pub struct AliasMap<R> {
    rules: IndexMap<String, R>,
}

pub type KeyValueMap = AliasMap<KeyValueRule>;
pub type CompositeMap = AliasMap<CompositeRule>;

impl<R> Default for AliasMap<R> {
    fn default() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }
}

impl<R> AliasMap<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the rule for `key`; a replaced rule keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, rule: R) -> Option<R> {
        self.rules.insert(key.into(), rule)
    }

    pub fn with(mut self, key: impl Into<String>, rule: R) -> Self {
        self.insert(key, rule);
        self
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.rules.get(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, R> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl CompositeMap {
    /// Attaches a compute hook to an existing rule. Returns `false` when `key` has no rule.
    pub fn set_compute(&mut self, key: &str, compute: Compute) -> bool {
        match self.rules.get_mut(key) {
            Some(rule) => {
                rule.compute = Some(compute);
                true
            }
            None => false,
        }
    }
}

impl<K: Into<String>, R> FromIterator<(K, R)> for AliasMap<R> {
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(key, rule)| (key.into(), rule)).collect(),
        }
    }
}

impl<'a, R> IntoIterator for &'a AliasMap<R> {
    type Item = (&'a String, &'a R);
    type IntoIter = indexmap::map::Iter<'a, String, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
