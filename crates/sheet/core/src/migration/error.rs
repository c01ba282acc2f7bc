//! Migration errors.
//!
//! Errors are per legacy field. A failed field never stops the remaining
//! fields of the same character from migrating.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("legacy field `{field}` has an unexpected shape (expected {expected})")]
    FieldShape {
        field: String,
        expected: &'static str,
    },

    #[error("legacy option {index} in `{field}` could not be read: {reason}")]
    OptionShape {
        field: String,
        index: usize,
        reason: String,
    },
}

impl MigrationError {
    pub(crate) fn shape(field: &str, expected: &'static str) -> Self {
        Self::FieldShape {
            field: field.to_string(),
            expected,
        }
    }

    /// Legacy key the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::FieldShape { field, .. } | Self::OptionShape { field, .. } => field,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
