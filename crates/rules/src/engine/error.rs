//! Errors raised by the validation engine.
//!
//! These are defects (broken configuration, failing expressions), never
//! business-level validation failures; those are reported as an invalid
//! [`ValidationOutcome`](crate::outcome::ValidationOutcome).

use crate::expression::EvalError;
use crate::loader::LoadError;
use crate::schema::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("condition of '{target_name}' failed to evaluate `{expression}`: {source}")]
    Condition {
        target_name: String,
        expression: String,
        #[source]
        source: EvalError,
    },

    #[error("rule expression of '{target}' failed to evaluate `{expression}`: {source}")]
    Expression {
        target: String,
        expression: String,
        #[source]
        source: EvalError,
    },

    #[error("failed to load array element config for '{target}': {source}")]
    Load {
        target: String,
        #[source]
        source: LoadError,
    },

    #[error("cannot resolve array target '{target}': {reason}")]
    TargetResolution { target: String, reason: String },

    #[error("rule tree deeper than {max_depth} levels at '{target}'")]
    DepthExceeded { target: String, max_depth: usize },
}

impl EngineError {
    /// Errors caused by the shape of the input rather than a broken
    /// validator; reported back to the caller instead of treated as defects.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EngineError::Load { .. } | EngineError::TargetResolution { .. }
        )
    }

    /// Target of the node the error is attributed to.
    pub fn target(&self) -> &str {
        match self {
            EngineError::Format(err) => &err.target,
            EngineError::Condition { target_name, .. } => target_name,
            EngineError::Expression { target, .. }
            | EngineError::Load { target, .. }
            | EngineError::TargetResolution { target, .. }
            | EngineError::DepthExceeded { target, .. } => target,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
