//! Public types for embedding the runtime.
mod errors;
mod loader;

pub use errors::{LoadError, Result, RuntimeError};
pub use loader::FeatureLoader;
