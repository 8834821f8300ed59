//! Expression language used by rule conditions and rule expressions.
//!
//! The engine only depends on the [`ExpressionEvaluator`] trait, so any
//! embeddable evaluator can be plugged in. [`ExprEvaluator`] is the built-in
//! implementation: a small, side-effect free language over JSON contexts.
//!
//! ### Grammar (informal)
//! - **Literals**: `18`, `2.5`, `'text'`, `"text"`, `true`, `false`, `null`
//! - **Context**: bare identifiers read properties of the context; `#this`
//!   and `#root` are the context itself
//! - **Access**: `a.b`, null-safe `a?.b`, indexing `a[0]`, `a['key']`
//! - **Methods**: `length()`, `size()`, `isEmpty()`, `trim()`,
//!   `toUpperCase()`, `toLowerCase()`, `startsWith(s)`, `endsWith(s)`,
//!   `contains(x)`
//! - **Operators**: `!`/`not`, unary `-`, `* / %`, `+ -`,
//!   `< <= > >= matches`, `== !=`, `&&`/`and`, `||`/`or`, `c ? a : b`

mod ast;
mod interpreter;
mod lexer;
mod parser;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use ast::Expr;
use interpreter::RegexCache;

/// Expression failed to parse or evaluate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("type error: {0}")]
    Type(String),

    #[error("evaluation error: {0}")]
    Runtime(String),
}

/// Evaluates expression strings against a context value.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, EvalError>;

    /// Evaluate and require a boolean result.
    fn evaluate_bool(&self, expression: &str, context: &Value) -> Result<bool, EvalError> {
        match self.evaluate(expression, context)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::Type(format!(
                "expected boolean result, got {}",
                type_name(&other)
            ))),
        }
    }
}

/// Typed evaluation on top of any [`ExpressionEvaluator`].
pub trait EvaluatorExt: ExpressionEvaluator {
    fn evaluate_typed<T: DeserializeOwned>(
        &self,
        expression: &str,
        context: &Value,
    ) -> Result<T, EvalError> {
        let value = self.evaluate(expression, context)?;
        let found = type_name(&value);
        serde_json::from_value(value).map_err(|e| {
            EvalError::Type(format!("cannot convert {found} result: {e}"))
        })
    }
}

impl<E: ExpressionEvaluator + ?Sized> EvaluatorExt for E {}

/// Built-in evaluator with per-expression parse and regex caches.
///
/// Rule trees reuse the same handful of expressions across every element of
/// every array, so each string is parsed once and each `matches` pattern is
/// compiled once.
#[derive(Debug, Default)]
pub struct ExprEvaluator {
    cache: RwLock<HashMap<String, Arc<Expr>>>,
    regexes: RegexCache,
}

impl ExprEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse without evaluating (syntax check).
    pub fn check(&self, expression: &str) -> Result<(), EvalError> {
        self.compile(expression).map(|_| ())
    }

    fn compile(&self, expression: &str) -> Result<Arc<Expr>, EvalError> {
        if let Some(expr) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(expression)
        {
            return Ok(Arc::clone(expr));
        }

        let expr = Arc::new(parser::parse(expression)?);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(expression.to_string(), Arc::clone(&expr));
        Ok(expr)
    }

    /// Number of distinct expressions parsed so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ExpressionEvaluator for ExprEvaluator {
    fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, EvalError> {
        let expr = self.compile(expression)?;
        interpreter::eval(&expr, context, &self.regexes)
    }
}

/// JSON type name for diagnostics.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
