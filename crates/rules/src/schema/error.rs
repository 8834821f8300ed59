//! Format error raised when a rule node is not exactly one variant.

/// A rule node failed the shape check.
///
/// Raised at load time, before any evaluation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule configuration format at '{target}': {reason}")]
pub struct FormatError {
    /// Target of the offending node (empty when the node has none).
    pub target: String,
    pub reason: String,
}

impl FormatError {
    pub(crate) fn new(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            reason: reason.into(),
        }
    }
}
