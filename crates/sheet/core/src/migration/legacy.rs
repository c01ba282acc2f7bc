//! Recognized pre-unification feature fields and how each maps to a record.
//!
//! Older character documents stored feature state in dedicated top-level
//! fields. Each [`LegacyField`] names those keys, the unified feature id they
//! become and the shape of the target record.
//!
//! | Legacy key(s)                                      | Feature id             | Type                  |
//! |----------------------------------------------------|------------------------|-----------------------|
//! | `channel_divinity_used` + `channel_divinity_uses`  | `channel_divinity`     | slots                 |
//! | `bardic_inspiration_uses`                          | `bardic_inspiration`   | slots                 |
//! | `ki_points_used`                                   | `ki_points`            | points_pool           |
//! | `sorcery_points_used`                              | `sorcery_points`       | points_pool           |
//! | `eldritch_invocations`                             | `eldritch_invocations` | options_list          |
//! | `wild_shape_state`                                 | `wild_shape`           | special_ux            |
//! | `heroic_inspiration`                               | `heroic_inspiration`   | availability_toggle   |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::{MigrationError, Result};
use crate::character::Character;
use crate::feature::FeatureType;
use crate::formula::Formula;
use crate::usage::{FeatureConfig, LegacyConfig, SelectedOption, UsageRecord, UsageState};

/// Cap formula for a legacy feature, in const-friendly form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyCap {
    Uncapped,
    Token(&'static str),
    Breakpoints(&'static [(u32, i64)]),
    Progression(&'static [i64]),
}

impl LegacyCap {
    pub fn to_formula(self) -> Option<Formula> {
        match self {
            Self::Uncapped => None,
            Self::Token(token) => Some(Formula::token(token)),
            Self::Breakpoints(pairs) => Some(Formula::breakpoints(pairs.iter().copied())),
            Self::Progression(values) => Some(Formula::progression(
                values.iter().copied().map(Formula::Constant),
            )),
        }
    }
}

/// How the legacy keys are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegacyShape {
    /// A "used" boolean paired with a use counter.
    UsedCounterPair {
        used: &'static str,
        uses: &'static str,
    },
    /// A bare use counter.
    UseCounter(&'static str),
    /// Points spent from a pool.
    PointsSpent(&'static str),
    /// A list of chosen options (strings or option objects).
    OptionList(&'static str),
    /// A single free-form object.
    Object(&'static str),
    /// A single availability flag.
    Flag(&'static str),
}

/// A recognized legacy field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyField {
    pub feature_id: &'static str,
    pub feature_name: &'static str,
    pub class_name: &'static str,
    pub shape: LegacyShape,
    pub cap: LegacyCap,
}

const LEVEL_POOL: &[i64] = &[
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20,
];

/// Every legacy field the migration engine knows how to fold in.
pub const LEGACY_FIELDS: &[LegacyField] = &[
    LegacyField {
        feature_id: "channel_divinity",
        feature_name: "Channel Divinity",
        class_name: "Cleric",
        shape: LegacyShape::UsedCounterPair {
            used: "channel_divinity_used",
            uses: "channel_divinity_uses",
        },
        cap: LegacyCap::Breakpoints(&[(2, 1), (6, 2), (18, 3)]),
    },
    LegacyField {
        feature_id: "bardic_inspiration",
        feature_name: "Bardic Inspiration",
        class_name: "Bard",
        shape: LegacyShape::UseCounter("bardic_inspiration_uses"),
        cap: LegacyCap::Token("cha"),
    },
    LegacyField {
        feature_id: "ki_points",
        feature_name: "Ki Points",
        class_name: "Monk",
        shape: LegacyShape::PointsSpent("ki_points_used"),
        cap: LegacyCap::Progression(LEVEL_POOL),
    },
    LegacyField {
        feature_id: "sorcery_points",
        feature_name: "Sorcery Points",
        class_name: "Sorcerer",
        shape: LegacyShape::PointsSpent("sorcery_points_used"),
        cap: LegacyCap::Progression(LEVEL_POOL),
    },
    LegacyField {
        feature_id: "eldritch_invocations",
        feature_name: "Eldritch Invocations",
        class_name: "Warlock",
        shape: LegacyShape::OptionList("eldritch_invocations"),
        cap: LegacyCap::Breakpoints(&[(2, 2), (5, 3), (7, 4), (9, 5), (12, 6), (15, 7), (18, 8)]),
    },
    LegacyField {
        feature_id: "wild_shape",
        feature_name: "Wild Shape",
        class_name: "Druid",
        shape: LegacyShape::Object("wild_shape_state"),
        cap: LegacyCap::Uncapped,
    },
    LegacyField {
        feature_id: "heroic_inspiration",
        feature_name: "Heroic Inspiration",
        class_name: "",
        shape: LegacyShape::Flag("heroic_inspiration"),
        cap: LegacyCap::Uncapped,
    },
];

impl LegacyField {
    /// Legacy keys this field reads.
    pub fn keys(&self) -> Vec<&'static str> {
        match self.shape {
            LegacyShape::UsedCounterPair { used, uses } => vec![used, uses],
            LegacyShape::UseCounter(key)
            | LegacyShape::PointsSpent(key)
            | LegacyShape::OptionList(key)
            | LegacyShape::Object(key)
            | LegacyShape::Flag(key) => vec![key],
        }
    }

    pub const fn feature_type(&self) -> FeatureType {
        match self.shape {
            LegacyShape::UsedCounterPair { .. } | LegacyShape::UseCounter(_) => FeatureType::Slots,
            LegacyShape::PointsSpent(_) => FeatureType::PointsPool,
            LegacyShape::OptionList(_) => FeatureType::OptionsList,
            LegacyShape::Object(_) => FeatureType::SpecialUx,
            LegacyShape::Flag(_) => FeatureType::AvailabilityToggle,
        }
    }

    /// Non-null raw values of this field's keys.
    pub fn raw_values(&self, character: &Character) -> BTreeMap<String, Value> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                character
                    .legacy
                    .get(key)
                    .filter(|value| !value.is_null())
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    /// Whether the character carries any value for this field.
    pub fn is_present(&self, character: &Character) -> bool {
        self.keys()
            .into_iter()
            .any(|key| character.legacy.get(key).is_some_and(|v| !v.is_null()))
    }

    /// Whether the field is present but not yet mirrored in the usage map.
    pub fn needs_migration(&self, character: &Character) -> bool {
        self.is_present(character) && !character.feature_usage.contains_key(self.feature_id)
    }

    /// Build the unified record for this field.
    ///
    /// Every raw value is kept in the record's legacy config, so the original
    /// data survives even where the typed state had to be clamped.
    pub fn to_record(&self, character: &Character, now: DateTime<Utc>) -> Result<UsageRecord> {
        let values = self.raw_values(character);
        let state = self.map_state(&values)?;

        let class_name = (!self.class_name.is_empty()
            && character.snapshot.class(self.class_name).is_some())
        .then(|| self.class_name.to_string());

        let mut record = UsageRecord {
            feature_name: self.feature_name.to_string(),
            state,
            config: FeatureConfig::Legacy(LegacyConfig {
                feature_type: self.feature_type(),
                values,
                formula: self.cap.to_formula(),
                class_name,
            }),
            notes: String::new(),
            is_feat_feature: false,
            last_updated: now,
        };
        record.clamp_to(&character.snapshot);
        Ok(record)
    }

    /// Uncapped typed state; the caller clamps it against the formula.
    fn map_state(&self, values: &BTreeMap<String, Value>) -> Result<UsageState> {
        match self.shape {
            LegacyShape::UsedCounterPair { used, uses } => {
                let was_used = read_bool(values, used)?;
                let count = read_counter(values, uses)?;
                let current_uses = count.unwrap_or(u32::from(was_used.unwrap_or(false)));
                Ok(UsageState::Slots {
                    current_uses,
                    max_uses: u32::MAX,
                    last_reset: None,
                })
            }
            LegacyShape::UseCounter(key) => Ok(UsageState::Slots {
                current_uses: read_counter(values, key)?.unwrap_or(0),
                max_uses: u32::MAX,
                last_reset: None,
            }),
            LegacyShape::PointsSpent(key) => Ok(UsageState::PointsPool {
                current_points: read_counter(values, key)?.unwrap_or(0),
                max_points: u32::MAX,
            }),
            LegacyShape::OptionList(key) => {
                let selected_options = match values.get(key) {
                    None => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| read_option(key, index, item))
                        .collect::<Result<_>>()?,
                    Some(_) => return Err(MigrationError::shape(key, "an array of options")),
                };
                Ok(UsageState::OptionsList {
                    selected_options,
                    max_selections: u32::MAX,
                })
            }
            LegacyShape::Object(key) => match values.get(key) {
                Some(Value::Object(map)) => Ok(UsageState::SpecialUx {
                    custom_state: map.clone(),
                }),
                None => Ok(UsageState::SpecialUx {
                    custom_state: Default::default(),
                }),
                Some(_) => Err(MigrationError::shape(key, "an object")),
            },
            LegacyShape::Flag(key) => Ok(UsageState::AvailabilityToggle {
                is_available: read_bool(values, key)?.unwrap_or(false),
            }),
        }
    }
}

fn read_bool(values: &BTreeMap<String, Value>, key: &str) -> Result<Option<bool>> {
    match values.get(key) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(MigrationError::shape(key, "a boolean")),
    }
}

/// Integer counter; negative values saturate at 0.
fn read_counter(values: &BTreeMap<String, Value>, key: &str) -> Result<Option<u32>> {
    match values.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(|n| Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX)))
            .ok_or_else(|| MigrationError::shape(key, "an integer")),
    }
}

/// Legacy options were either bare ids or `{id, title|name, description, flags}`.
fn read_option(key: &str, index: usize, item: &Value) -> Result<SelectedOption> {
    let option_error = |reason: &str| MigrationError::OptionShape {
        field: key.to_string(),
        index,
        reason: reason.to_string(),
    };

    match item {
        Value::String(id) => Ok(SelectedOption::new(id.clone(), id.clone())),
        Value::Object(map) => {
            let id = map
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| option_error("missing string `id`"))?;
            let title = map
                .get("title")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .unwrap_or(id);
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();

            let mut option = SelectedOption::new(id, title).with_description(description);
            if let Some(flags) = map.get("flags") {
                let flags = flags
                    .as_object()
                    .ok_or_else(|| option_error("`flags` is not an object"))?;
                for (flag, value) in flags {
                    let value = value
                        .as_bool()
                        .ok_or_else(|| option_error("flag values must be booleans"))?;
                    option = option.with_flag(flag.clone(), value);
                }
            }
            Ok(option)
        }
        _ => Err(option_error("expected a string or an object")),
    }
}
