//! [`FeatureLoader`](crate::FeatureLoader) implementations.
mod catalog;

pub use catalog::CatalogFeatureLoader;
