//! Glob rule compilation
//!
//! Wraps `globset` with the pattern conventions used by rule lists:
//!
//! - leading `!` markers toggle negation and are stripped before compiling
//! - a leading `#` marks a comment, which never matches
//! - absent, empty and invalid patterns compile to a dead rule
//!
//! `*` stays inside one `/`-delimited segment, `**` crosses segments and
//! brace alternation may contain an empty branch (`{,www.}example.com`).

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

const NEGATION_MARKER: char = '!';
const COMMENT_MARKER: char = '#';

/// A single compiled pattern from a rule list.
///
/// The matcher reports whether the un-negated pattern matches. Applying
/// `negate` to a hit is left to the part matcher.
#[derive(Clone)]
pub struct CompiledRule {
    source: String,
    pattern: String,
    matcher: Option<GlobMatcher>,
    negate: bool,
}

impl CompiledRule {
    /// Compile a pattern. Never fails; unusable input yields a dead rule.
    pub fn compile(source: Option<&str>) -> Self {
        let source = source.unwrap_or("");

        if source.starts_with(COMMENT_MARKER) {
            return Self::dead(source, source, false);
        }

        let (pattern, negate) = strip_negation(source);
        if pattern.is_empty() {
            return Self::dead(source, pattern, negate);
        }

        let built = GlobBuilder::new(pattern)
            .literal_separator(true)
            .empty_alternates(true)
            .backslash_escape(true)
            .build();

        match built {
            Ok(glob) => Self {
                source: source.to_string(),
                pattern: pattern.to_string(),
                matcher: Some(glob.compile_matcher()),
                negate,
            },
            Err(err) => {
                log::warn!("Unusable pattern {:?}, it will never match: {}", source, err);
                Self::dead(source, pattern, negate)
            }
        }
    }

    fn dead(source: &str, pattern: &str, negate: bool) -> Self {
        Self {
            source: source.to_string(),
            pattern: pattern.to_string(),
            matcher: None,
            negate,
        }
    }

    /// Does the un-negated pattern match `value`?
    #[inline]
    pub fn is_match(&self, value: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.is_match(value),
            None => false,
        }
    }

    /// True when a hit on this rule denies rather than allows.
    #[inline]
    pub fn negate(&self) -> bool {
        self.negate
    }

    /// True for rules that can never match.
    pub fn is_dead(&self) -> bool {
        self.matcher.is_none()
    }

    /// The pattern as written in the configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The pattern with negation markers removed.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("source", &self.source)
            .field("negate", &self.negate)
            .field("dead", &self.is_dead())
            .finish()
    }
}

/// Strip leading negation markers. An odd count negates.
fn strip_negation(source: &str) -> (&str, bool) {
    let pattern = source.trim_start_matches(NEGATION_MARKER);
    let markers = source.len() - pattern.len();
    (pattern, markers % 2 == 1)
}
