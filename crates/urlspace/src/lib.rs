//! UrlSpace
//!
//! Decides whether a URL is permitted under a nested allow/deny policy of
//! glob patterns applied to individual URL parts.
//!
//! ```
//! use urlspace::UrlSpace;
//!
//! let space = UrlSpace::from_json_str(r#"{
//!     "hostname": ["{,www.}example.com"],
//!     "path": ["/docs/**", "!/docs/private/**"],
//!     "query": { "session": ["!**"] }
//! }"#).unwrap();
//!
//! assert!(space.is_allowed("https://www.example.com/docs/intro"));
//! assert!(!space.is_allowed("https://example.com/docs/private/keys"));
//! assert!(!space.is_allowed("https://example.com/docs/?session=abc"));
//! ```
//!
//! Within one part the last matching pattern wins; a part whose patterns
//! are all negated (`!`) allows anything they do not match. A URL is
//! allowed when every configured part allows it.

mod error;
mod space;

pub use error::ConfigError;
pub use space::{UrlSpace, Verdict};

pub use urlspace_compiler::{compile, compile_with_stats, CompileStats, RuleConfig};
pub use urlspace_core::{
    decompose, CompiledRule, LogObserver, MatcherNode, NoopObserver, Observer, PartPath, PartValue,
    Parts,
};
