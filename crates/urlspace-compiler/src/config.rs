//! Rule configuration
//!
//! A `RuleConfig` is read from JSON without ever failing on shape: arrays
//! become pattern lists, objects become nested rule maps and any other
//! value is a single pattern. Values that are not strings carry no pattern
//! and later compile to rules that never match.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum RuleConfig {
    /// Ordered patterns for one part.
    List(Vec<Option<String>>),
    /// A lone pattern, treated as a one-element list.
    Pattern(Option<String>),
    /// Named sub-configurations in declaration order.
    Map(Vec<(String, RuleConfig)>),
}

impl RuleConfig {
    /// Configuration without constraints.
    pub fn empty() -> Self {
        Self::Map(Vec::new())
    }

    /// Build a pattern list.
    pub fn list<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(patterns.into_iter().map(|p| Some(p.into())).collect())
    }

    /// Build a nested map, keeping the given order.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, RuleConfig)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up an entry of a `Map` configuration.
    pub fn get(&self, key: &str) -> Option<&RuleConfig> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// True for a map with no entries or a list with no patterns.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(patterns) => patterns.is_empty(),
            Self::Pattern(_) => false,
            Self::Map(entries) => entries.is_empty(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for RuleConfig {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items.into_iter().map(pattern_of).collect()),
            Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, RuleConfig::from(v))).collect())
            }
            other => Self::Pattern(pattern_of(other)),
        }
    }
}

fn pattern_of(value: Value) -> Option<String> {
    match value {
        Value::String(pattern) => Some(pattern),
        _ => None,
    }
}
