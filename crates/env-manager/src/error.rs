//! Error types for env-manager

use thiserror::Error;

/// Errors that can occur while translating environment documents
#[derive(Error, Debug)]
pub enum EnvManagerError {
    /// The translator for this recipe type does not support the operation.
    ///
    /// Callers are expected to consult the matching capability query
    /// (`can_rename_machine`, `can_delete_machine`, ...) before invoking it.
    #[error("{recipe_type} environment manager: cannot {operation}")]
    UnsupportedOperation {
        operation: &'static str,
        recipe_type: String,
    },

    /// No translator is registered for the recipe type
    #[error("unsupported recipe type: {0}")]
    UnsupportedRecipeType(String),

    /// The raw document could not be decoded or encoded
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvManagerError {
    pub(crate) fn unsupported(operation: &'static str, recipe_type: impl Into<String>) -> Self {
        EnvManagerError::UnsupportedOperation {
            operation,
            recipe_type: recipe_type.into(),
        }
    }

    /// Whether this error signals a capability-gated operation
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, EnvManagerError::UnsupportedOperation { .. })
    }
}
