//! The public URL predicate

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use urlspace_compiler::{compile_with_stats, RuleConfig};
use urlspace_core::{decompose, CompiledRule, Evaluator, LogObserver, MatcherNode, Observer, PartPath};

use crate::error::ConfigError;

/// A compiled URL policy.
///
/// Cloning is cheap; clones share the compiled rules.
#[derive(Clone)]
pub struct UrlSpace {
    rules: Arc<MatcherNode>,
    observer: Arc<dyn Observer + Send + Sync>,
}

/// Outcome of [`UrlSpace::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    /// Dotted path of the first part that did not comply, e.g. `query.somevar`.
    pub denied_by: Option<String>,
}

impl UrlSpace {
    /// Compile `config` into a policy. Never fails; unusable patterns
    /// become rules that never match.
    pub fn new(config: &RuleConfig) -> Self {
        let (rules, stats) = compile_with_stats(config);

        log::debug!(
            "Compiled {} rules for {} parts ({} negated, {} unusable)",
            stats.rules,
            stats.parts,
            stats.negated,
            stats.dead
        );

        Self {
            rules: Arc::new(rules),
            observer: Arc::new(LogObserver),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RuleConfig = serde_json::from_str(json)?;
        Ok(Self::new(&config))
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: RuleConfig = serde_json::from_reader(reader)?;
        Ok(Self::new(&config))
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Replace the evaluation observer. Defaults to [`LogObserver`].
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: Observer + Send + Sync + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    /// The compiled matcher tree.
    pub fn rules(&self) -> &MatcherNode {
        &self.rules
    }

    /// Is `href` permitted by this policy?
    pub fn is_allowed(&self, href: &str) -> bool {
        let parts = decompose(href);
        let allowed = Evaluator::new(self.observer.as_ref()).evaluate(&parts, &self.rules);
        log::trace!("{} {}", if allowed { "Allowed" } else { "Denied" }, href);
        allowed
    }

    /// Like [`is_allowed`](Self::is_allowed), also naming the part that
    /// denied the URL.
    ///
    /// Evaluation stops at the first non-compliant part, so only that part
    /// is reported even if later parts would fail as well.
    pub fn check(&self, href: &str) -> Verdict {
        let recorder = DenialRecorder {
            inner: self.observer.as_ref(),
            denied_by: RefCell::new(None),
        };
        let parts = decompose(href);
        let allowed = Evaluator::new(&recorder).evaluate(&parts, &self.rules);

        Verdict {
            allowed,
            denied_by: recorder.denied_by.into_inner().filter(|_| !allowed),
        }
    }

    /// Turn the policy into a plain predicate.
    pub fn into_predicate(self) -> impl Fn(&str) -> bool + Send + Sync + 'static {
        move |href| self.is_allowed(href)
    }
}

impl Default for UrlSpace {
    fn default() -> Self {
        Self::new(&RuleConfig::empty())
    }
}

impl From<RuleConfig> for UrlSpace {
    fn from(config: RuleConfig) -> Self {
        Self::new(&config)
    }
}

impl FromStr for UrlSpace {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

impl fmt::Debug for UrlSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSpace").field("rules", &self.rules).finish_non_exhaustive()
    }
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Forwards to the configured observer and remembers the first denial.
struct DenialRecorder<'a> {
    inner: &'a dyn Observer,
    denied_by: RefCell<Option<String>>,
}

impl Observer for DenialRecorder<'_> {
    fn rule_hit(&self, path: PartPath<'_>, rule: &CompiledRule, complies: bool) {
        self.inner.rule_hit(path, rule, complies);
    }

    fn part_tested(&self, path: PartPath<'_>, value: Option<&str>, complies: bool) {
        self.inner.part_tested(path, value, complies);
        if !complies {
            let mut denied_by = self.denied_by.borrow_mut();
            if denied_by.is_none() {
                *denied_by = Some(path.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn space(rules: serde_json::Value) -> UrlSpace {
        UrlSpace::new(&RuleConfig::from(rules))
    }

    fn test_all(space: &UrlSpace, urls: &[(&str, bool)]) {
        for (url, expected) in urls {
            assert_eq!(space.is_allowed(url), *expected, "{}", url);
        }
    }

    #[test]
    fn allows_urls_by_default() {
        test_all(
            &UrlSpace::default(),
            &[
                ("http://localhost/", true),
                ("http://127.0.01/", true),
                ("https://www.example.com/", true),
                ("not a url at all", true),
            ],
        );
        test_all(&space(json!({})), &[("http://localhost/", true)]);
    }

    #[test]
    fn rejects_urls_that_miss_a_single_part() {
        let space = space(json!({ "hostname": ["localhost"] }));
        test_all(
            &space,
            &[
                ("http://localhost/", true),
                ("http://127.0.0.1/", false),
                ("http://127.0.01/", false),
                ("https://www.example.com/", false),
            ],
        );
    }

    #[test]
    fn rejects_urls_that_miss_any_part() {
        let space = space(json!({
            "hostname": ["localhost"],
            "pathname": ["/path/**"]
        }));
        test_all(
            &space,
            &[
                ("http://localhost/", false),
                ("http://127.0.0.1/", false),
                ("http://localhost/path/", true),
                ("http://127.0.0.1/path/", false),
            ],
        );
    }

    #[test]
    fn allows_alternative_patterns_in_one_part() {
        let space = space(json!({ "hostname": ["localhost", "{,www.}example.com"] }));
        test_all(
            &space,
            &[
                ("http://localhost/", true),
                ("http://127.0.0.1/", false),
                ("https://www.example.com/", true),
                ("http://example.com/", true),
            ],
        );
    }

    #[test]
    fn allows_exceptions_to_rules() {
        let space = space(json!({
            "path": ["/path/**", "!/path/secret/**", "!**/*.jpeg"]
        }));
        test_all(
            &space,
            &[
                ("http://localhost/", false),
                ("http://localhost/path/", true),
                ("http://localhost/path/secret/", false),
                ("http://localhost/path/secret/deeper/", false),
                ("http://localhost/path/deeper/", true),
                ("http://localhost/path/deeper/image.jpeg", false),
            ],
        );
    }

    #[test]
    fn rule_order_changes_the_outcome() {
        let space = space(json!({ "path": ["!/path/secret/**", "/path/**"] }));
        assert!(space.is_allowed("http://localhost/path/secret/"));
    }

    #[test]
    fn allows_non_matching_urls_with_only_negative_rules() {
        let space = space(json!({ "path": ["!/path/1/**", "!/path/2/**"] }));
        test_all(
            &space,
            &[
                ("http://localhost/", true),
                ("http://localhost/path/", true),
                ("http://localhost/path/1/", false),
                ("http://localhost/path/1/deeper/", false),
                ("http://localhost/path/3/", true),
            ],
        );
    }

    #[test]
    fn applies_rules_to_query_parameters() {
        let space = space(json!({ "query": { "somevar": ["!**"] } }));
        test_all(
            &space,
            &[
                ("http://localhost/", true),
                ("http://localhost/?somevar=yes", false),
                ("http://localhost/?something=else&somevar=yes&somemore=true", false),
                ("http://localhost/?somevar", false),
                ("http://localhost/#?somevar=yes", true),
                ("http://localhost/somevar=yes/?", true),
            ],
        );
    }

    #[test]
    fn requires_every_repeated_parameter_to_comply() {
        let space = space(json!({ "query": { "page": ["[0-9]", "!0"] } }));
        test_all(
            &space,
            &[
                ("http://h/?page=1&page=2", true),
                ("http://h/?page=1&page=0", false),
                ("http://h/", false),
            ],
        );
    }

    #[test]
    fn handles_urls_with_many_query_parameters() {
        let space = space(json!({ "query": { "somevar": ["!**"] } }));
        let params: Vec<String> = (0..40_000).map(|i| format!("k{i}=v")).collect();
        let href = format!("http://h/?{}", params.join("&"));
        assert!(space.is_allowed(&href));
        assert!(!space.is_allowed(&format!("{href}&somevar=yes")));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let space = space(json!({ "path": ["/path/**", "!/path/secret/**"] }));
        for _ in 0..5 {
            assert!(space.is_allowed("http://localhost/path/a"));
            assert!(!space.is_allowed("http://localhost/path/secret/a"));
        }
    }

    #[test]
    fn handles_relative_and_malformed_urls() {
        let space = space(json!({ "pathname": ["/docs/**"] }));
        test_all(
            &space,
            &[
                ("/docs/intro", true),
                ("/blog/", false),
                ("http://host:99999/docs/x", true),
                ("", false),
            ],
        );
    }

    #[test]
    fn matches_scheme_and_port() {
        let space = space(json!({ "scheme": ["http{,s}"], "port": ["!22"] }));
        test_all(
            &space,
            &[
                ("https://example.com/", true),
                ("ftp://example.com/", false),
                ("http://example.com:8080/", true),
                ("http://example.com:22/", false),
            ],
        );
    }

    #[test]
    fn check_names_the_denying_part() {
        let space = space(json!({
            "hostname": ["localhost"],
            "query": { "session": ["!**"] }
        }));

        assert_eq!(
            space.check("http://localhost/?a=1"),
            Verdict { allowed: true, denied_by: None }
        );
        assert_eq!(
            space.check("http://localhost/?session=1").denied_by.as_deref(),
            Some("query.session")
        );
        // Stops at the first failing part
        assert_eq!(
            space.check("http://example.com/?session=1").denied_by.as_deref(),
            Some("hostname")
        );
    }

    #[test]
    fn reports_to_injected_observer() {
        #[derive(Default)]
        struct Collect(Mutex<Vec<String>>);

        impl Observer for Collect {
            fn part_tested(&self, path: PartPath<'_>, _value: Option<&str>, complies: bool) {
                if let Ok(mut seen) = self.0.lock() {
                    seen.push(format!("{}={}", path, complies));
                }
            }
        }

        let collect = Arc::new(Collect::default());
        let space = space(json!({ "hostname": ["localhost"], "path": ["/a/**"] }))
            .with_observer(SharedObserver(Arc::clone(&collect)));

        assert!(!space.is_allowed("http://localhost/b"));
        let seen = collect.0.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec!["hostname=true".to_string(), "path=false".to_string()]);

        struct SharedObserver(Arc<Collect>);
        impl Observer for SharedObserver {
            fn part_tested(&self, path: PartPath<'_>, value: Option<&str>, complies: bool) {
                self.0.part_tested(path, value, complies);
            }
        }
    }

    #[test]
    fn loads_json_configuration() {
        let space: UrlSpace = r#"{"hostname": ["localhost"]}"#.parse().expect("valid config");
        assert!(space.is_allowed("http://localhost/"));
        assert!(!space.is_allowed("http://example.com/"));

        let space = UrlSpace::from_json_reader(r#"{"path": ["!/x/**"]}"#.as_bytes())
            .expect("valid config");
        assert!(!space.is_allowed("http://h/x/1"));

        let err = UrlSpace::from_json_str("{hostname").expect_err("broken json");
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn loads_configuration_file() {
        let path = std::env::temp_dir().join(format!("urlspace-{}.json", std::process::id()));
        fs::write(&path, r#"{"query": {"somevar": ["!**"]}}"#).expect("write temp config");
        let loaded = UrlSpace::from_path(&path);
        let _ = fs::remove_file(&path);

        let space = loaded.expect("valid config file");
        assert!(!space.is_allowed("http://h/?somevar=1"));

        let err = UrlSpace::from_path("/nonexistent/urlspace.json").expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn shares_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UrlSpace>();

        let space = space(json!({ "hostname": ["*.example.com"] }));
        std::thread::scope(|scope| {
            for i in 0..4 {
                let space = space.clone();
                scope.spawn(move || {
                    let href = format!("http://node{}.example.com/", i);
                    assert!(space.is_allowed(&href));
                    assert!(!space.is_allowed("http://example.org/"));
                });
            }
        });
    }

    #[test]
    fn predicate_matches_is_allowed() {
        let allowed = space(json!({ "hostname": ["localhost"] })).into_predicate();
        assert!(allowed("http://localhost/"));
        assert!(!allowed("http://example.com/"));
    }
}
