//! Declarative, rule-driven validation of JSON payloads.
//!
//! This crate provides:
//! - Rule documents (JSON/YAML) deserialized into a typed Basic / Array /
//!   Composite rule tree with a load-time format check
//! - A small expression language for rule conditions and rule expressions
//! - Filesystem and in-memory rule sources, with hot-reload via `notify`
//! - The recursive validation engine with AND / OR / conditional groups
//!   and per-element array validation
//! - Message merging and the validation outcome returned to callers
//! - A reference-based validator facade

pub mod combiner;
pub mod engine;
pub mod expression;
pub mod loader;
pub mod outcome;
pub mod schema;
pub mod validator;

pub use combiner::{JoinOp, MessageCombiner};
pub use engine::{EngineError, EngineOptions, ValidationEngine};
pub use expression::{EvalError, EvaluatorExt, ExprEvaluator, ExpressionEvaluator};
pub use loader::{check_references, InMemoryRules, LoadError, RuleLoader, RuleSource};
pub use outcome::{MessageMap, MessageValue, ValidationOutcome};
pub use schema::{FormatError, GroupType, RuleConfiguration, RuleKind};
pub use validator::{ValidateError, Validator};
