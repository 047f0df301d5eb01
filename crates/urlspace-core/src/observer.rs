//! Evaluation observers
//!
//! Observers see every rule hit and every part verdict. They never change
//! the outcome.

use crate::glob::CompiledRule;
use crate::types::PartPath;

/// Hook for diagnostics during evaluation.
pub trait Observer {
    /// A rule matched the part value; `complies` is the part's new state.
    fn rule_hit(&self, _path: PartPath<'_>, _rule: &CompiledRule, _complies: bool) {}

    /// A part finished evaluating. `value` is `None` when the part is absent.
    fn part_tested(&self, _path: PartPath<'_>, _value: Option<&str>, _complies: bool) {}
}

/// Ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Emits `trace` records through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn rule_hit(&self, path: PartPath<'_>, rule: &CompiledRule, complies: bool) {
        log::trace!("{}: hit {:?}, complies={}", path, rule.source(), complies);
    }

    fn part_tested(&self, path: PartPath<'_>, value: Option<&str>, complies: bool) {
        match value {
            Some(value) => log::trace!("{} = {:?}, complies={}", path, value, complies),
            None => log::trace!("{} not present, complies={}", path, complies),
        }
    }
}
