//! Core Matching Engine
//!
//! Walks the decomposed URL parts and the compiled matcher tree in
//! lockstep. A level complies only if every configured part at that level
//! complies; evaluation stops at the first part that does not.
//!
//! Within one part the last matching rule wins. When no rule matches, the
//! part complies only if all of its rules are negated.

use crate::glob::CompiledRule;
use crate::observer::{NoopObserver, Observer};
use crate::types::{MatcherNode, PartPath, PartValue, Parts};
use crate::url::HREF;

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates parts against a matcher tree, reporting to an observer.
#[derive(Clone, Copy)]
pub struct Evaluator<'o> {
    observer: &'o dyn Observer,
}

impl<'o> Evaluator<'o> {
    pub fn new(observer: &'o dyn Observer) -> Self {
        Self { observer }
    }

    /// Does `parts` comply with `node`?
    ///
    /// A bare rule list at the root has no part to address and is tested
    /// against the full `href`.
    pub fn evaluate(&self, parts: &Parts, node: &MatcherNode) -> bool {
        match node {
            MatcherNode::RuleMap(entries) => {
                let mut path = Vec::new();
                self.evaluate_entries(Some(parts), entries, &mut path)
            }
            MatcherNode::RuleList(rules) => self.test_value(PartPath(&[HREF]), parts.get(HREF), rules),
        }
    }

    fn evaluate_entries<'n>(
        &self,
        parts: Option<&Parts>,
        entries: &'n [(String, MatcherNode)],
        path: &mut Vec<&'n str>,
    ) -> bool {
        let mut complies = true;

        for (name, node) in entries {
            path.push(name);
            let value = parts.and_then(|p| p.get(name));

            complies = match node {
                MatcherNode::RuleMap(children) => {
                    // Missing or flat part: every child is absent
                    let nested = match value {
                        Some(PartValue::Nested(nested)) => Some(nested),
                        _ => None,
                    };
                    self.evaluate_entries(nested, children, path)
                }
                MatcherNode::RuleList(rules) => self.test_value(PartPath(path.as_slice()), value, rules),
            };

            path.pop();
            if !complies {
                break;
            }
        }

        complies
    }

    fn test_value(&self, path: PartPath<'_>, value: Option<&PartValue>, rules: &[CompiledRule]) -> bool {
        match value {
            Some(PartValue::Text(text)) => self.test_part(path, Some(text.as_str()), rules),
            Some(PartValue::Repeated(values)) => {
                values.iter().all(|v| self.test_part(path, Some(v.as_str()), rules))
            }
            Some(PartValue::Nested(_)) | None => self.test_part(path, None, rules),
        }
    }

    /// Test one part value against an ordered rule list.
    pub fn test_part(&self, path: PartPath<'_>, value: Option<&str>, rules: &[CompiledRule]) -> bool {
        let default = default_compliance(rules);

        let value = match value {
            Some(value) => value,
            None => {
                self.observer.part_tested(path, None, default);
                return default;
            }
        };

        let mut complies = default;
        for rule in rules {
            if rule.is_match(value) {
                complies = !rule.negate();
                self.observer.rule_hit(path, rule, complies);
            }
        }

        self.observer.part_tested(path, Some(value), complies);
        complies
    }
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self::new(&NoopObserver)
    }
}

/// A purely exclusionary rule list allows by default.
#[inline]
pub fn default_compliance(rules: &[CompiledRule]) -> bool {
    rules.iter().all(CompiledRule::negate)
}

/// Evaluate without an observer.
pub fn evaluate(parts: &Parts, node: &MatcherNode) -> bool {
    Evaluator::default().evaluate(parts, node)
}

/// Test a single part without an observer.
pub fn test_part(name: &str, value: Option<&str>, rules: &[CompiledRule]) -> bool {
    Evaluator::default().test_part(PartPath(&[name]), value, rules)
}
