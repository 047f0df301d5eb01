//! Rule Compiler
//!
//! Turns a `RuleConfig` into a `MatcherNode` of the same shape, compiling
//! every pattern once.

use urlspace_core::glob::CompiledRule;
use urlspace_core::types::MatcherNode;
use urlspace_core::url::is_known_part;

use crate::config::RuleConfig;

/// Summary of a compiled configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Rule lists in the tree.
    pub parts: usize,
    pub rules: usize,
    pub negated: usize,
    /// Rules that can never match.
    pub dead: usize,
    /// Top-level keys no URL ever has.
    pub unknown_parts: Vec<String>,
}

/// Compile a configuration into a matcher tree of the same shape.
pub fn compile(config: &RuleConfig) -> MatcherNode {
    match config {
        RuleConfig::List(patterns) => MatcherNode::RuleList(
            patterns
                .iter()
                .map(|p| CompiledRule::compile(p.as_deref()))
                .collect(),
        ),
        RuleConfig::Pattern(pattern) => {
            MatcherNode::RuleList(vec![CompiledRule::compile(pattern.as_deref())])
        }
        RuleConfig::Map(entries) => MatcherNode::RuleMap(
            entries
                .iter()
                .map(|(name, sub)| (name.clone(), compile(sub)))
                .collect(),
        ),
    }
}

/// Compile and collect statistics about the result.
pub fn compile_with_stats(config: &RuleConfig) -> (MatcherNode, CompileStats) {
    let node = compile(config);
    let mut stats = CompileStats::default();

    if let MatcherNode::RuleMap(entries) = &node {
        stats.unknown_parts = entries
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !is_known_part(name))
            .cloned()
            .collect();
    }
    for part in &stats.unknown_parts {
        log::warn!("Rules for '{}' never see a value: URLs have no such part", part);
    }
    collect_stats(&node, &mut stats);

    (node, stats)
}

fn collect_stats(node: &MatcherNode, stats: &mut CompileStats) {
    match node {
        MatcherNode::RuleList(rules) => {
            stats.parts += 1;
            stats.rules += rules.len();
            stats.negated += rules.iter().filter(|r| r.negate()).count();
            stats.dead += rules.iter().filter(|r| r.is_dead()).count();
        }
        MatcherNode::RuleMap(entries) => {
            for (_, child) in entries {
                collect_stats(child, stats);
            }
        }
    }
}
