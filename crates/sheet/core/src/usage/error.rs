//! Errors raised by usage-map operations.
//!
//! Only caller mistakes are errors. Data-shape problems (wrong feature type,
//! missing record, full options list) degrade to a no-op instead.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("feature id must not be empty")]
    EmptyFeatureId,
}

pub type Result<T> = std::result::Result<T, UsageError>;
