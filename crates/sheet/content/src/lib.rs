//! Data-driven content for the character sheet.
//!
//! This crate reads the files the rest of the workspace runs on:
//! - Class catalogs with their feature definitions (RON, or JSON)
//! - Runtime configuration (TOML)
//! - Character documents, legacy or current (JSON)
//!
//! All loaders deserialize straight into sheet-core types.

pub mod loaders;

pub use loaders::{CharacterLoader, ClassCatalog, ClassCatalogLoader, ConfigLoader, ContentFactory};
