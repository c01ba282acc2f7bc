//! Character snapshot - the read-only input to every formula.
//!
//! A snapshot holds only what formulas read: ability scores, the total level
//! and the per-class levels of a multiclass character. Proficiency bonus is
//! derived, never stored.

use serde::{Deserialize, Serialize};

use super::abilities::{Ability, AbilityScores};

/// Levels taken in a single class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub class_name: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
}

impl ClassLevel {
    pub fn new(class_name: impl Into<String>, level: u32) -> Self {
        Self {
            class_name: class_name.into(),
            level,
            subclass: None,
        }
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }
}

/// Read-only view of the attributes formulas depend on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub abilities: AbilityScores,
    /// Total character level. Zero means "derive from class levels".
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub classes: Vec<ClassLevel>,
}

impl CharacterSnapshot {
    pub fn new(abilities: AbilityScores, level: u32) -> Self {
        Self {
            abilities,
            level,
            classes: Vec::new(),
        }
    }

    /// Single-class snapshot with the total level equal to the class level.
    pub fn single_class(abilities: AbilityScores, class: ClassLevel) -> Self {
        Self {
            abilities,
            level: class.level,
            classes: vec![class],
        }
    }

    pub fn with_class(mut self, class: ClassLevel) -> Self {
        self.classes.push(class);
        self
    }

    /// Total level, falling back to the sum of class levels when unset.
    pub fn total_level(&self) -> u32 {
        if self.level > 0 {
            self.level
        } else {
            self.classes.iter().map(|c| c.level).sum()
        }
    }

    /// Level in the named class (case-insensitive), if the character has any.
    pub fn class_level(&self, class_name: &str) -> Option<u32> {
        self.class(class_name).map(|c| c.level)
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassLevel> {
        self.classes
            .iter()
            .find(|c| c.class_name.eq_ignore_ascii_case(class_name))
    }

    /// Level a formula should read.
    ///
    /// With a class name this is the level in that class (0 when the character
    /// has none); without one it is the total level.
    pub fn relevant_level(&self, class_name: Option<&str>) -> u32 {
        match class_name {
            Some(name) => self.class_level(name).unwrap_or(0),
            None => self.total_level(),
        }
    }

    /// Class with the most levels; the earliest entry wins ties.
    pub fn primary_class(&self) -> Option<&ClassLevel> {
        self.classes
            .iter()
            .reduce(|best, c| if c.level > best.level { c } else { best })
    }

    /// Proficiency bonus at the total level.
    pub fn proficiency_bonus(&self) -> u32 {
        proficiency_bonus_for(self.total_level())
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }
}

/// Proficiency bonus for a level: +2 at 1-4, +3 at 5-8, ... +6 at 17-20.
///
/// Level 0 is treated as level 1.
pub const fn proficiency_bonus_for(level: u32) -> u32 {
    let level = if level == 0 { 1 } else { level };
    2 + (level - 1) / 4
}
