//! Sandboxed code-judging engine.
//!
//! Judges untrusted source code by compiling it (when the language
//! requires it) and executing it against test cases inside isolated,
//! resource-limited boxes managed by the external `isolate` primitive.
//! Callers hand an [`ExecutionRequest`](gavel_common::types::ExecutionRequest)
//! to [`JudgeEngine::judge`] and get back a
//! [`SubmissionResult`](gavel_common::types::SubmissionResult) with
//! per-test-case reports and an aggregate score.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod isolate;
pub mod languages;
pub mod meta;
pub mod pool;

pub use config::JudgeConfig;
pub use engine::JudgeEngine;
pub use error::EngineError;
pub use languages::{LanguagePipeline, LanguageRegistry, PreRunStep};
pub use meta::ExecutionMeta;
pub use pool::{BoxLease, BoxPool};

#[cfg(test)]
mod engine_tests;
