//! Pure operations over the unified usage map.
//!
//! Each operation borrows its input and returns a whole replacement map.
//! Callers install the result with [`Character::with_usage`] and must not
//! merge two maps produced independently from the same character.
//!
//! Ordering inside every mutation is fixed: merge the patch, recompute the
//! cap from the record's config, clamp the current value, stamp
//! `last_updated`.
//!
//! [`Character::with_usage`]: crate::character::Character::with_usage

use chrono::{DateTime, Utc};

use super::error::{Result, UsageError};
use super::record::{CustomState, SelectedOption, UsagePatch, UsageRecord, UsageState};
use super::UsageMap;
use crate::character::{Character, CharacterSnapshot};
use crate::feature::{FeatureDefinition, FeatureType};

/// Reference to a selected option, by id or by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionRef {
    Id(String),
    Index(usize),
}

impl From<&str> for OptionRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for OptionRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<usize> for OptionRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

fn ensure_feature_id(feature_id: &str) -> Result<()> {
    if feature_id.trim().is_empty() {
        return Err(UsageError::EmptyFeatureId);
    }
    Ok(())
}

/// Existing record, or a new one seeded from `definition` when absent.
fn entry_or_seed<'a>(
    usage: &'a mut UsageMap,
    character: &CharacterSnapshot,
    feature_id: &str,
    definition: Option<&FeatureDefinition>,
    now: DateTime<Utc>,
) -> Option<&'a mut UsageRecord> {
    if !usage.contains_key(feature_id) {
        let definition = definition?;
        usage.insert(
            feature_id.to_string(),
            UsageRecord::from_definition(definition, character, now),
        );
    }
    usage.get_mut(feature_id)
}

/// Look up a record.
pub fn get<'a>(usage: &'a UsageMap, feature_id: &str) -> Option<&'a UsageRecord> {
    usage.get(feature_id)
}

/// Seed a record for `feature_id` from its definition.
///
/// Returns the map unchanged when the id is already present.
pub fn add_single_feature(
    character: &Character,
    feature_id: &str,
    definition: &FeatureDefinition,
) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let mut usage = character.feature_usage.clone();
    if usage.contains_key(feature_id) {
        return Ok(usage);
    }

    let record = UsageRecord::from_definition(definition, &character.snapshot, Utc::now());
    usage.insert(feature_id.to_string(), record);
    Ok(usage)
}

/// Shallow-merge `patch` into a record, then clamp against the recomputed cap.
///
/// An absent record is created from `definition` first; with no definition
/// the map is returned unchanged.
pub fn update_feature_usage(
    character: &Character,
    feature_id: &str,
    patch: &UsagePatch,
    definition: Option<&FeatureDefinition>,
) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let now = Utc::now();
    let mut usage = character.feature_usage.clone();
    let Some(record) = entry_or_seed(&mut usage, &character.snapshot, feature_id, definition, now)
    else {
        return Ok(usage);
    };

    patch.merge_into(record);
    record.clamp_to(&character.snapshot);
    record.last_updated = now;
    Ok(usage)
}

/// Shallow-merge `patch` into a special-UX record's custom state.
///
/// The shape of the state belongs to the feature's own UI and is not
/// validated. Records of any other type are left alone.
pub fn update_feature_custom_state(
    character: &Character,
    feature_id: &str,
    patch: CustomState,
    definition: Option<&FeatureDefinition>,
) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let now = Utc::now();
    let definition = definition.filter(|d| d.feature_type() == FeatureType::SpecialUx);
    let mut usage = character.feature_usage.clone();
    let Some(record) = entry_or_seed(&mut usage, &character.snapshot, feature_id, definition, now)
    else {
        return Ok(usage);
    };

    if let UsageState::SpecialUx { custom_state } = &mut record.state {
        custom_state.extend(patch);
        record.last_updated = now;
    }
    Ok(usage)
}

/// Append an option to an options-list record.
///
/// The record is first clamped to the cap recomputed for `character`, so a
/// list left over a lowered cap is trimmed even when the add is refused. A
/// full list, a duplicate id or a missing/non-list record add nothing.
pub fn add_feature_option(
    usage: &UsageMap,
    character: &CharacterSnapshot,
    feature_id: &str,
    option: SelectedOption,
) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let mut usage = usage.clone();
    let Some(record) = options_record(&mut usage, feature_id) else {
        return Ok(usage);
    };
    let before = record.state.clone();
    record.clamp_to(character);

    if let UsageState::OptionsList {
        selected_options,
        max_selections,
    } = &mut record.state
    {
        let full = selected_options.len() >= *max_selections as usize;
        let duplicate = selected_options.iter().any(|o| o.id == option.id);
        if !(full || duplicate) {
            selected_options.push(option);
        }
    }

    if record.state != before {
        record.last_updated = Utc::now();
    }
    Ok(usage)
}

/// Remove a selected option by id or index, then clamp to the recomputed cap.
///
/// Unknown references remove nothing; `last_updated` moves only when the
/// record changed.
pub fn remove_feature_option(
    usage: &UsageMap,
    character: &CharacterSnapshot,
    feature_id: &str,
    option: impl Into<OptionRef>,
) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let mut usage = usage.clone();
    let Some(record) = options_record(&mut usage, feature_id) else {
        return Ok(usage);
    };
    let before = record.state.clone();

    if let UsageState::OptionsList {
        selected_options, ..
    } = &mut record.state
    {
        match option.into() {
            OptionRef::Id(id) => selected_options.retain(|o| o.id != id),
            OptionRef::Index(index) => {
                if index < selected_options.len() {
                    selected_options.remove(index);
                }
            }
        }
    }

    record.clamp_to(character);
    if record.state != before {
        record.last_updated = Utc::now();
    }
    Ok(usage)
}

fn options_record<'a>(
    usage: &'a mut UsageMap,
    feature_id: &str,
) -> Option<&'a mut UsageRecord> {
    usage
        .get_mut(feature_id)
        .filter(|record| matches!(record.state, UsageState::OptionsList { .. }))
}

/// Recompute every cap and clamp every current value.
///
/// Run after a level-up or ability change.
pub fn refresh_caps(character: &Character) -> UsageMap {
    let mut usage = character.feature_usage.clone();
    for record in usage.values_mut() {
        record.clamp_to(&character.snapshot);
    }
    usage
}

/// Restore a consumable feature to zero consumption.
///
/// Slots also stamp `last_reset`. Other feature types are left alone.
pub fn reset_feature(character: &Character, feature_id: &str) -> Result<UsageMap> {
    ensure_feature_id(feature_id)?;

    let now = Utc::now();
    let mut usage = character.feature_usage.clone();
    let Some(record) = usage.get_mut(feature_id) else {
        return Ok(usage);
    };

    match &mut record.state {
        UsageState::Slots {
            current_uses,
            last_reset,
            ..
        } => {
            *current_uses = 0;
            *last_reset = Some(now);
        }
        UsageState::PointsPool { current_points, .. } => *current_points = 0,
        _ => return Ok(usage),
    }
    record.clamp_to(&character.snapshot);
    record.last_updated = now;
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AbilityScores, ClassLevel};
    use crate::feature::{FeatureKind, ResetKind};
    use crate::formula::Formula;
    use serde_json::json;

    fn cleric(level: u32) -> Character {
        Character::new(
            "char-1",
            CharacterSnapshot::single_class(
                AbilityScores::new(10, 10, 14, 10, 16, 12),
                ClassLevel::new("Cleric", level),
            ),
        )
    }

    fn channel_divinity() -> FeatureDefinition {
        FeatureDefinition::new(
            "channel_divinity",
            "Channel Divinity",
            "Cleric",
            FeatureKind::Slots {
                uses: Formula::breakpoints([(2, 1), (6, 2), (18, 3)]),
                reset: ResetKind::ShortRest,
            },
        )
    }

    fn invocations() -> FeatureDefinition {
        FeatureDefinition::new(
            "invocations",
            "Eldritch Invocations",
            "Cleric",
            FeatureKind::OptionsList {
                selections: Formula::breakpoints([(2, 2), (5, 3)]),
                options: vec![],
            },
        )
    }

    fn wild_shape() -> FeatureDefinition {
        FeatureDefinition::new(
            "wild_shape",
            "Wild Shape",
            "Cleric",
            FeatureKind::SpecialUx {
                initial_state: json!({"form": null}).as_object().cloned().unwrap(),
            },
        )
    }

    #[test]
    fn add_single_feature_seeds_from_formula() {
        let character = cleric(6);
        let usage =
            add_single_feature(&character, "channel_divinity", &channel_divinity()).unwrap();
        let record = get(&usage, "channel_divinity").unwrap();

        assert_eq!(record.feature_type(), FeatureType::Slots);
        assert_eq!(record.current_uses(), Some(0));
        assert_eq!(record.state.max(), Some(2));
        assert_eq!(record.feature_name, "Channel Divinity");
    }

    #[test]
    fn add_single_feature_is_idempotent() {
        let character = cleric(6);
        let once = add_single_feature(&character, "channel_divinity", &channel_divinity()).unwrap();
        let twice = add_single_feature(
            &character.clone().with_usage(once.clone()),
            "channel_divinity",
            &channel_divinity(),
        )
        .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_feature_id_fails_fast() {
        let character = cleric(1);
        assert_eq!(
            add_single_feature(&character, " ", &channel_divinity()),
            Err(UsageError::EmptyFeatureId)
        );
        assert_eq!(
            update_feature_usage(&character, "", &UsagePatch::uses(1), None),
            Err(UsageError::EmptyFeatureId)
        );
    }

    #[test]
    fn update_clamps_into_recomputed_cap() {
        let character = cleric(6);
        let usage = update_feature_usage(
            &character,
            "channel_divinity",
            &UsagePatch::uses(9),
            Some(&channel_divinity()),
        )
        .unwrap();
        assert_eq!(get(&usage, "channel_divinity").unwrap().current_uses(), Some(2));

        let usage = update_feature_usage(
            &character.clone().with_usage(usage),
            "channel_divinity",
            &UsagePatch::uses(-3),
            None,
        )
        .unwrap();
        assert_eq!(get(&usage, "channel_divinity").unwrap().current_uses(), Some(0));
    }

    #[test]
    fn update_without_record_or_definition_is_noop() {
        let character = cleric(6);
        let usage =
            update_feature_usage(&character, "channel_divinity", &UsagePatch::uses(1), None)
                .unwrap();
        assert!(usage.is_empty());
    }

    #[test]
    fn level_down_shrinks_stale_cap() {
        let high = cleric(6);
        let usage = update_feature_usage(
            &high,
            "channel_divinity",
            &UsagePatch::uses(2),
            Some(&channel_divinity()),
        )
        .unwrap();

        let mut low = high.with_usage(usage);
        low.snapshot.classes[0].level = 2;
        low.snapshot.level = 2;

        let usage = update_feature_usage(
            &low,
            "channel_divinity",
            &UsagePatch::default().with_notes("respec"),
            None,
        )
        .unwrap();
        let record = get(&usage, "channel_divinity").unwrap();
        assert_eq!(record.state.max(), Some(1));
        assert_eq!(record.current_uses(), Some(1));
        assert_eq!(record.notes, "respec");
    }

    #[test]
    fn patch_fields_for_other_types_are_ignored() {
        let character = cleric(6);
        let patch = UsagePatch {
            current_points: Some(4),
            is_available: Some(false),
            ..UsagePatch::uses(1)
        };
        let usage =
            update_feature_usage(&character, "channel_divinity", &patch, Some(&channel_divinity()))
                .unwrap();
        let record = get(&usage, "channel_divinity").unwrap();
        assert_eq!(record.feature_type(), FeatureType::Slots);
        assert_eq!(record.current_uses(), Some(1));
    }

    #[test]
    fn custom_state_merges_shallowly() {
        let character = cleric(2);
        let patch = json!({"form": "wolf", "hp": 11}).as_object().cloned().unwrap();
        let usage =
            update_feature_custom_state(&character, "wild_shape", patch, Some(&wild_shape()))
                .unwrap();

        let character = character.with_usage(usage);
        let patch = json!({"hp": 4}).as_object().cloned().unwrap();
        let usage = update_feature_custom_state(&character, "wild_shape", patch, None).unwrap();

        let state = get(&usage, "wild_shape").unwrap().custom_state().unwrap();
        assert_eq!(state.get("form"), Some(&json!("wolf")));
        assert_eq!(state.get("hp"), Some(&json!(4)));
    }

    #[test]
    fn custom_state_ignores_non_special_records() {
        let character = cleric(6);
        let usage =
            add_single_feature(&character, "channel_divinity", &channel_divinity()).unwrap();
        let character = character.with_usage(usage.clone());
        let patch = json!({"x": 1}).as_object().cloned().unwrap();

        let after =
            update_feature_custom_state(&character, "channel_divinity", patch, None).unwrap();
        assert_eq!(after, usage);
    }

    fn add_option(usage: &UsageMap, character: &CharacterSnapshot, id: &str) -> UsageMap {
        add_feature_option(usage, character, "invocations", SelectedOption::new(id, id)).unwrap()
    }

    #[test]
    fn options_refuse_past_cap_and_duplicates() {
        let character = cleric(2);
        let usage = add_single_feature(&character, "invocations", &invocations()).unwrap();

        let add = |usage: &UsageMap, id: &str, title: &str| {
            let option = SelectedOption::new(id, title);
            add_feature_option(usage, &character.snapshot, "invocations", option).unwrap()
        };
        let usage = add(&usage, "a", "Agonizing Blast");
        let usage = add(&usage, "a", "Agonizing Blast");
        let usage = add(&usage, "b", "Devil's Sight");
        let full = add_feature_option(
            &usage,
            &character.snapshot,
            "invocations",
            SelectedOption::new("c", "Mask of Many Faces"),
        )
        .unwrap();

        assert_eq!(full, usage);
        assert_eq!(get(&full, "invocations").unwrap().selected_options().unwrap().len(), 2);
    }

    #[test]
    fn options_cap_follows_level() {
        let character = cleric(2);
        let mut usage = add_single_feature(&character, "invocations", &invocations()).unwrap();
        for id in ["a", "b"] {
            usage = add_option(&usage, &character.snapshot, id);
        }

        let mut leveled = character.snapshot.clone();
        leveled.classes[0].level = 5;
        leveled.level = 5;
        let usage = add_option(&usage, &leveled, "c");

        let record = get(&usage, "invocations").unwrap();
        assert_eq!(record.selected_options().unwrap().len(), 3);
        assert_eq!(record.state.max(), Some(3));
    }

    #[test]
    fn option_edits_after_level_down_apply_the_lower_cap() {
        let character = cleric(5);
        let mut usage = add_single_feature(&character, "invocations", &invocations()).unwrap();
        for id in ["a", "b", "c"] {
            usage = add_option(&usage, &character.snapshot, id);
        }

        let mut lowered = character.snapshot.clone();
        lowered.classes[0].level = 2;
        lowered.level = 2;

        let refused = add_option(&usage, &lowered, "d");
        let record = get(&refused, "invocations").unwrap();
        assert_eq!(record.state.max(), Some(2));
        assert_eq!(record.selected_options().unwrap().len(), 2);
        assert!(record.selected_options().unwrap().iter().all(|o| o.id != "d"));

        let removed = remove_feature_option(&usage, &lowered, "invocations", "zzz").unwrap();
        let record = get(&removed, "invocations").unwrap();
        assert_eq!(record.state.max(), Some(2));
        assert_eq!(record.selected_options().unwrap().len(), 2);
    }

    #[test]
    fn remove_option_by_id_and_index() {
        let character = cleric(5);
        let mut usage = add_single_feature(&character, "invocations", &invocations()).unwrap();
        for id in ["a", "b", "c"] {
            usage = add_option(&usage, &character.snapshot, id);
        }

        let snapshot = &character.snapshot;
        let usage = remove_feature_option(&usage, snapshot, "invocations", "b").unwrap();
        let usage = remove_feature_option(&usage, snapshot, "invocations", 0usize).unwrap();
        let unchanged = remove_feature_option(&usage, snapshot, "invocations", 7usize).unwrap();

        assert_eq!(unchanged, usage);
        let ids: Vec<_> = get(&usage, "invocations")
            .unwrap()
            .selected_options()
            .unwrap()
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, ["c"]);
    }

    #[test]
    fn refresh_and_reset() {
        let character = cleric(6);
        let usage = update_feature_usage(
            &character,
            "channel_divinity",
            &UsagePatch::uses(2),
            Some(&channel_divinity()),
        )
        .unwrap();

        let mut character = character.with_usage(usage);
        character.snapshot.classes[0].level = 2;
        character.snapshot.level = 2;
        let refreshed = refresh_caps(&character);
        assert_eq!(get(&refreshed, "channel_divinity").unwrap().current_uses(), Some(1));

        let character = character.with_usage(refreshed);
        let reset = reset_feature(&character, "channel_divinity").unwrap();
        let record = get(&reset, "channel_divinity").unwrap();
        assert_eq!(record.current_uses(), Some(0));
        assert!(matches!(record.state, UsageState::Slots { last_reset: Some(_), .. }));
    }

    #[test]
    fn record_serializes_with_feature_type_tag() {
        let character = cleric(6);
        let usage =
            add_single_feature(&character, "channel_divinity", &channel_divinity()).unwrap();
        let value = serde_json::to_value(&usage).unwrap();

        assert_eq!(value["channel_divinity"]["feature_type"], "slots");
        assert_eq!(value["channel_divinity"]["max_uses"], 2);

        let back: UsageMap = serde_json::from_value(value).unwrap();
        assert_eq!(back, usage);
    }
}
