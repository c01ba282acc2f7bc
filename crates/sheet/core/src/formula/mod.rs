//! Formula system for deriving resource limits.
//!
//! Formulas let a feature definition scale its cap with the character:
//! - Flat constants
//! - Proficiency bonus (`"prof"`)
//! - Ability modifiers (`"cha"`, `"wisdom"`)
//! - Level-indexed progressions (die sizes, point pools)
//! - Level breakpoint tables
//!
//! Formulas are data, not code. They deserialize from the plain shapes a
//! content file uses, so a definition can write any of:
//!
//! ```text
//! uses: 3
//! uses: "prof"
//! uses: "cha"
//! die:  ["d6", "d6", "d6", "d6", "d8", "d8", "d8", "d8", "d8", "d10"]
//! uses: {"3": 2, "10": 3, "17": 4}
//! ```
//!
//! Anything else still deserializes (into [`Formula::Other`]) and evaluates to
//! zero, so one broken definition never prevents a character from loading.

pub mod evaluate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use evaluate::evaluate;

/// Formula for calculating a non-negative resource limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Formula {
    /// Fixed constant value.
    Constant(i64),

    /// Named token: `"prof"`, an ability code or name, a numeric string, or a
    /// die size such as `"d8"`.
    Token(String),

    /// Level-indexed list; level 1 reads the first element and levels past the
    /// end read the last one.
    Progression(Vec<Formula>),

    /// Ascending `{min_level: value}` thresholds.
    ///
    /// Keys stay strings so tables from JSON, RON and TOML all load the same
    /// way; keys that are not levels are skipped during evaluation.
    Breakpoints(BTreeMap<String, i64>),

    /// Unrecognized shape, kept verbatim. Always evaluates to zero.
    Other(serde_json::Value),
}

impl Formula {
    pub fn constant(value: i64) -> Self {
        Self::Constant(value)
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn progression(values: impl IntoIterator<Item = Formula>) -> Self {
        Self::Progression(values.into_iter().collect())
    }

    /// Build a breakpoint table from `(min_level, value)` pairs.
    pub fn breakpoints(pairs: impl IntoIterator<Item = (u32, i64)>) -> Self {
        Self::Breakpoints(
            pairs
                .into_iter()
                .map(|(level, value)| (level.to_string(), value))
                .collect(),
        )
    }
}

impl From<i64> for Formula {
    fn from(value: i64) -> Self {
        Self::Constant(value)
    }
}

impl From<&str> for Formula {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}
