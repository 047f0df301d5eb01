//! UrlSpace Rule Compiler
//!
//! This crate turns nested allow/deny rule configurations into the matcher
//! trees evaluated by `urlspace-core`.

pub mod compiler;
pub mod config;

pub use compiler::{compile, compile_with_stats, CompileStats};
pub use config::RuleConfig;
