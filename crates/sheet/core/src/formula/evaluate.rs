//! Formula evaluation logic.
//!
//! Evaluation never fails: unknown tokens, composite expressions
//! (`"cha+1"`), malformed tables and unrecognized shapes all yield 0. Every
//! result, whatever the formula kind, is floored at 0.

use std::str::FromStr;

use crate::character::{Ability, CharacterSnapshot, proficiency_bonus_for};
use crate::formula::Formula;

// ============================================================================
// Formula Evaluation
// ============================================================================

/// Evaluate a formula against a character snapshot.
///
/// `class_name` selects the class level used by level-dependent formulas on
/// multiclass characters; without it the total level is used.
///
/// ## Supported Formulas
/// - `Constant`: the value itself
/// - `Token("prof")`: proficiency bonus at the relevant level
/// - `Token(<ability>)`: ability modifier
/// - `Token("3")` / `Token("d8")`: numeric literal / die size
/// - `Progression`: element at `min(level - 1, len - 1)`
/// - `Breakpoints`: value of the greatest threshold not above the level
pub fn evaluate(formula: &Formula, character: &CharacterSnapshot, class_name: Option<&str>) -> u32 {
    let level = character.relevant_level(class_name);
    u32::try_from(evaluate_at(formula, character, level).max(0)).unwrap_or(u32::MAX)
}

fn evaluate_at(formula: &Formula, character: &CharacterSnapshot, level: u32) -> i64 {
    match formula {
        Formula::Constant(value) => *value,

        Formula::Token(token) => evaluate_token(token, character, level),

        Formula::Progression(values) => {
            if values.is_empty() {
                return 0;
            }
            let index = (level.saturating_sub(1) as usize).min(values.len() - 1);
            evaluate_at(&values[index], character, level)
        }

        Formula::Breakpoints(table) => table
            .iter()
            .filter_map(|(threshold, value)| {
                threshold
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .map(|threshold| (threshold, *value))
            })
            .filter(|(threshold, _)| *threshold <= level)
            .max_by_key(|(threshold, _)| *threshold)
            .map(|(_, value)| value)
            .unwrap_or(0),

        Formula::Other(_) => 0,
    }
}

fn evaluate_token(token: &str, character: &CharacterSnapshot, level: u32) -> i64 {
    let token = token.trim();

    if token.eq_ignore_ascii_case("prof") {
        return i64::from(proficiency_bonus_for(level));
    }

    if let Ok(ability) = Ability::from_str(token) {
        return i64::from(character.modifier(ability).max(0));
    }

    if let Ok(value) = token.parse::<i64>() {
        return value;
    }

    die_size(token).unwrap_or(0)
}

/// Parse `"d8"` / `"D10"` into the number of faces.
fn die_size(token: &str) -> Option<i64> {
    let faces = token
        .strip_prefix('d')
        .or_else(|| token.strip_prefix('D'))?;
    faces.parse::<i64>().ok().filter(|faces| *faces > 0)
}
