//! Ability scores - the six attributes every formula ultimately reads.
//!
//! Scores are stored as-is; modifiers are always derived and never stored.
//!
//! Modifier = floor((score - 10) / 2), floored at 0 for resource formulas.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The six ability scores.
///
/// Parsed case-insensitively from either the three-letter code (`"wis"`) or
/// the full name (`"wisdom"`), which is how formulas reference them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Ability {
    #[strum(to_string = "str", serialize = "strength")]
    Str,
    #[strum(to_string = "dex", serialize = "dexterity")]
    Dex,
    #[strum(to_string = "con", serialize = "constitution")]
    Con,
    #[strum(to_string = "int", serialize = "intelligence")]
    Int,
    #[strum(to_string = "wis", serialize = "wisdom")]
    Wis,
    #[strum(to_string = "cha", serialize = "charisma")]
    Cha,
}

/// Raw ability scores of a character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl AbilityScores {
    /// Create new scores with specified values
    pub const fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            str,
            dex,
            con,
            int,
            wis,
            cha,
        }
    }

    /// Raw score for an ability.
    pub const fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    /// Signed modifier: floor((score - 10) / 2).
    pub const fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) - 10).div_euclid(2)
    }

    /// Replace a single score, returning the updated set.
    pub const fn with_score(mut self, ability: Ability, score: i32) -> Self {
        match ability {
            Ability::Str => self.str = score,
            Ability::Dex => self.dex = score,
            Ability::Con => self.con = score,
            Ability::Int => self.int = score,
            Ability::Wis => self.wis = score,
            Ability::Cha => self.cha = score,
        }
        self
    }
}

impl Default for AbilityScores {
    /// Default scores: all 10 (modifier +0)
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}
