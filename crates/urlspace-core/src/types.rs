//! Core type definitions for UrlSpace
//!
//! The compiled matcher tree and the decomposed URL parts it is
//! evaluated against.

use std::collections::HashMap;
use std::fmt;

use crate::glob::CompiledRule;

// =============================================================================
// Matcher Tree
// =============================================================================

/// Compiled form of a rule configuration.
///
/// Mirrors the configuration's shape one to one. The variant is chosen once
/// at compile time and the evaluator dispatches on it.
#[derive(Debug, Clone)]
pub enum MatcherNode {
    /// Ordered rules for a single part. Order decides precedence.
    RuleList(Vec<CompiledRule>),
    /// Named sub-rules for a structured part, in declaration order.
    RuleMap(Vec<(String, MatcherNode)>),
}

impl MatcherNode {
    /// A node with no constraints. Allows everything.
    pub fn empty() -> Self {
        Self::RuleMap(Vec::new())
    }

    /// Look up a direct child of a `RuleMap` node.
    pub fn child(&self, name: &str) -> Option<&MatcherNode> {
        match self {
            Self::RuleMap(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, node)| node),
            Self::RuleList(_) => None,
        }
    }

    /// Rules of a `RuleList` node.
    pub fn rules(&self) -> Option<&[CompiledRule]> {
        match self {
            Self::RuleList(rules) => Some(rules),
            Self::RuleMap(_) => None,
        }
    }

    /// Total number of compiled rules in this subtree.
    pub fn rule_count(&self) -> usize {
        match self {
            Self::RuleList(rules) => rules.len(),
            Self::RuleMap(entries) => entries.iter().map(|(_, node)| node.rule_count()).sum(),
        }
    }
}

impl Default for MatcherNode {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// URL Parts
// =============================================================================

/// Value of one decomposed URL part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    /// A query parameter supplied more than once, in order of appearance.
    Repeated(Vec<String>),
    /// A structured part such as the query mapping.
    Nested(Parts),
}

/// Named parts of a URL. A missing name means the part is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parts {
    values: HashMap<String, PartValue>,
}

impl Parts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PartValue) {
        self.values.insert(name.into(), value);
    }

    /// Insert a text part, skipping `None`.
    pub fn insert_text(&mut self, name: &str, value: Option<String>) {
        if let Some(value) = value {
            self.values.insert(name.to_string(), PartValue::Text(value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&PartValue> {
        self.values.get(name)
    }

    /// Text value of a part, if present and not structured.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(PartValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn nested(&self, name: &str) -> Option<&Parts> {
        match self.values.get(name) {
            Some(PartValue::Nested(parts)) => Some(parts),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PartValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

// =============================================================================
// Part Path
// =============================================================================

/// Location of a part inside the matcher tree, e.g. `query.somevar`.
#[derive(Debug, Clone, Copy)]
pub struct PartPath<'a>(pub &'a [&'a str]);

impl PartPath<'_> {
    /// Innermost part name.
    pub fn name(&self) -> &str {
        self.0.last().copied().unwrap_or("")
    }
}

impl fmt::Display for PartPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
