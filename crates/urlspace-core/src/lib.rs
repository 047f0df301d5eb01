//! UrlSpace Core Library
//!
//! This crate provides the matching engine behind UrlSpace URL policies.
//!
//! # Architecture
//!
//! A rule configuration is compiled (by `urlspace-compiler`) into an
//! immutable [`MatcherNode`] tree. Each URL is decomposed into named
//! [`Parts`] and evaluated against the tree; the tree is only read during
//! evaluation and can be shared freely between threads.
//!
//! # Modules
//!
//! - `glob`: pattern compilation with negation markers
//! - `url`: URL decomposition into named parts
//! - `matcher`: evaluator and part matcher
//! - `observer`: diagnostic hooks for evaluation
//! - `types`: shared type definitions

pub mod glob;
pub mod matcher;
pub mod observer;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use glob::CompiledRule;
pub use matcher::{default_compliance, evaluate, test_part, Evaluator};
pub use observer::{LogObserver, NoopObserver, Observer};
pub use types::{MatcherNode, PartPath, PartValue, Parts};
pub use crate::url::decompose;
